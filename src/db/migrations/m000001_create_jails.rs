use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Jails::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Jails::UserId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Jails::PreservedRoles).json().not_null())
                    .col(ColumnDef::new(Jails::Reason).string_len(100).not_null())
                    .col(
                        ColumnDef::new(Jails::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Jails::IssuedBy).big_integer().not_null())
                    .col(
                        ColumnDef::new(Jails::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // The expiry runner only ever asks for rows past their deadline
        manager
            .create_index(
                Index::create()
                    .name("idx-jails-expires-at")
                    .table(Jails::Table)
                    .col(Jails::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Jails::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Jails {
    Table,
    UserId,
    PreservedRoles,
    Reason,
    ExpiresAt,
    IssuedBy,
    CreatedAt,
}
