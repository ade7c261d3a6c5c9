use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum JailAction {
    #[sea_orm(string_value = "jailed")]
    Jailed,
    #[sea_orm(string_value = "unjailed")]
    Unjailed,
}

impl std::fmt::Display for JailAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JailAction::Jailed => write!(f, "Jailed"),
            JailAction::Unjailed => write!(f, "Unjailed"),
        }
    }
}

/// Append-only audit trail. `actor_id` is NULL when the expiry runner acted.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "jail_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i64,
    pub action: JailAction,
    pub reason: String,
    pub actor_id: Option<i64>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
