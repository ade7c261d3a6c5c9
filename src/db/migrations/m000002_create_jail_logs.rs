use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(JailLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(JailLogs::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(JailLogs::UserId).big_integer().not_null())
                    .col(ColumnDef::new(JailLogs::Action).string_len(16).not_null())
                    .col(ColumnDef::new(JailLogs::Reason).string().not_null())
                    .col(ColumnDef::new(JailLogs::ActorId).big_integer())
                    .col(
                        ColumnDef::new(JailLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-jail-logs-user-id")
                    .table(JailLogs::Table)
                    .col(JailLogs::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(JailLogs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum JailLogs {
    Table,
    Id,
    UserId,
    Action,
    Reason,
    ActorId,
    CreatedAt,
}
