use sea_orm_migration::prelude::*;

pub use sea_orm_migration::MigratorTrait;

mod m20250301_100000_create_users_table;
mod m20250301_100100_create_ai_logs_table;
mod m20250301_100200_create_ai_feedback_table;
mod m20250301_100300_create_user_ai_usage_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_100000_create_users_table::Migration),
            Box::new(m20250301_100100_create_ai_logs_table::Migration),
            Box::new(m20250301_100200_create_ai_feedback_table::Migration),
            Box::new(m20250301_100300_create_user_ai_usage_table::Migration),
        ]
    }
}

/// Common table and column identifiers
#[derive(Iden)]
pub enum Users {
    Table,
    Id,
    Email,
    DisplayName,
    CreatedAt,
}

#[derive(Iden)]
pub enum AiLogs {
    Table,
    Id,
    UserId,
    Prompt,
    Response,
    Model,
    TokensUsed,
    Cost,
    Persona,
    ContextUsed,
    Feedback,
    FeedbackAt,
    CreatedAt,
}

#[derive(Iden)]
pub enum AiFeedback {
    Table,
    Id,
    AiLogId,
    UserId,
    Rating,
    Comment,
    CreatedAt,
}

#[derive(Iden)]
pub enum UserAiUsage {
    Table,
    Id,
    UserId,
    Month,
    TokensUsed,
    EstimatedCost,
    CreatedAt,
    UpdatedAt,
}
