use super::{AiLogs, Users};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AiLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AiLogs::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AiLogs::UserId).integer().null())
                    .col(ColumnDef::new(AiLogs::Prompt).text().not_null())
                    .col(ColumnDef::new(AiLogs::Response).text().not_null())
                    .col(ColumnDef::new(AiLogs::Model).string().null())
                    .col(ColumnDef::new(AiLogs::TokensUsed).integer().null())
                    .col(ColumnDef::new(AiLogs::Cost).decimal_len(10, 6).null())
                    .col(
                        ColumnDef::new(AiLogs::Persona)
                            .string()
                            .not_null()
                            .default("general"),
                    )
                    .col(
                        ColumnDef::new(AiLogs::ContextUsed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(AiLogs::Feedback).string().null())
                    .col(
                        ColumnDef::new(AiLogs::FeedbackAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(AiLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // SQLite cannot add foreign keys after table creation
        if manager.get_database_backend() == sea_orm::DatabaseBackend::Postgres {
            manager
                .create_foreign_key(
                    ForeignKey::create()
                        .name("fk_ai_logs_user_id")
                        .from(AiLogs::Table, AiLogs::UserId)
                        .to(Users::Table, Users::Id)
                        .on_delete(ForeignKeyAction::SetNull)
                        .to_owned(),
                )
                .await?;
        }

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_ai_logs_created_at")
                    .table(AiLogs::Table)
                    .col(AiLogs::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_ai_logs_user_id_created_at")
                    .table(AiLogs::Table)
                    .col(AiLogs::UserId)
                    .col(AiLogs::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AiLogs::Table).to_owned())
            .await
    }
}
