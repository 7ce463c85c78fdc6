use super::{AiFeedback, AiLogs, Users};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AiFeedback::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AiFeedback::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AiFeedback::AiLogId).integer().not_null())
                    .col(ColumnDef::new(AiFeedback::UserId).integer().null())
                    .col(
                        ColumnDef::new(AiFeedback::Rating)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(AiFeedback::Comment).text().null())
                    .col(
                        ColumnDef::new(AiFeedback::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        if manager.get_database_backend() == sea_orm::DatabaseBackend::Postgres {
            manager
                .create_foreign_key(
                    ForeignKey::create()
                        .name("fk_ai_feedback_ai_log_id")
                        .from(AiFeedback::Table, AiFeedback::AiLogId)
                        .to(AiLogs::Table, AiLogs::Id)
                        .on_delete(ForeignKeyAction::Cascade)
                        .to_owned(),
                )
                .await?;

            manager
                .create_foreign_key(
                    ForeignKey::create()
                        .name("fk_ai_feedback_user_id")
                        .from(AiFeedback::Table, AiFeedback::UserId)
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
                    .name("idx_ai_feedback_ai_log_id")
                    .table(AiFeedback::Table)
                    .col(AiFeedback::AiLogId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AiFeedback::Table).to_owned())
            .await
    }
}
