use sea_orm::entity::prelude::*;

/// One row per jailed member. Absence of a row means the member is free.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "jails")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,
    pub preserved_roles: Json,
    pub reason: String,
    pub expires_at: DateTimeWithTimeZone,
    pub issued_by: i64,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
