use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(StagedEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StagedEntries::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(StagedEntries::SessionId).string().not_null())
                    .col(ColumnDef::new(StagedEntries::StagingKey).string().not_null())
                    .col(ColumnDef::new(StagedEntries::Payload).text().not_null())
                    .col(
                        ColumnDef::new(StagedEntries::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // One value per (session, namespace); upserts rely on it
        manager
            .create_index(
                Index::create()
                    .name("idx_staged_entries_session_key")
                    .table(StagedEntries::Table)
                    .col(StagedEntries::SessionId)
                    .col(StagedEntries::StagingKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_staged_entries_expires_at")
                    .table(StagedEntries::Table)
                    .col(StagedEntries::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StagedEntries::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum StagedEntries {
    Table,
    Id,
    SessionId,
    StagingKey,
    Payload,
    ExpiresAt,
}
