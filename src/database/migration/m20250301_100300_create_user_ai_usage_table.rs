use super::{UserAiUsage, Users};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserAiUsage::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserAiUsage::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserAiUsage::UserId).integer().not_null())
                    .col(ColumnDef::new(UserAiUsage::Month).string_len(7).not_null())
                    .col(
                        ColumnDef::new(UserAiUsage::TokensUsed)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(UserAiUsage::EstimatedCost)
                            .decimal_len(10, 6)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(UserAiUsage::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserAiUsage::UpdatedAt)
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
                        .name("fk_user_ai_usage_user_id")
                        .from(UserAiUsage::Table, UserAiUsage::UserId)
                        .to(Users::Table, Users::Id)
                        .on_delete(ForeignKeyAction::Cascade)
                        .to_owned(),
                )
                .await?;
        }

        // The accounting upsert depends on this uniqueness
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_user_ai_usage_user_id_month")
                    .table(UserAiUsage::Table)
                    .col(UserAiUsage::UserId)
                    .col(UserAiUsage::Month)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserAiUsage::Table).to_owned())
            .await
    }
}
