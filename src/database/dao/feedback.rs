use crate::database::entities::{FeedbackRecord, Rating, ai_feedback};
use crate::database::{DatabaseError, DatabaseResult};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct FeedbackStats {
    pub total: u64,
    pub helpful: u64,
    pub not_helpful: u64,
    pub helpful_percentage: f64,
}

pub struct FeedbackDao {
    db: DatabaseConnection,
}

impl FeedbackDao {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Insert a feedback row. Callers verify the referenced log exists first;
    /// SQLite deployments have no foreign key backstop.
    pub async fn create(
        &self,
        ai_log_id: i32,
        user_id: Option<i32>,
        rating: Rating,
        comment: Option<String>,
    ) -> DatabaseResult<FeedbackRecord> {
        let active_model = ai_feedback::ActiveModel {
            id: ActiveValue::NotSet,
            ai_log_id: Set(ai_log_id),
            user_id: Set(user_id),
            rating: Set(rating),
            comment: Set(comment),
            created_at: Set(Utc::now()),
        };

        active_model
            .insert(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))
    }

    pub async fn count_for_log(&self, ai_log_id: i32) -> DatabaseResult<u64> {
        ai_feedback::Entity::find()
            .filter(ai_feedback::Column::AiLogId.eq(ai_log_id))
            .count(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))
    }

    pub async fn stats(&self) -> DatabaseResult<FeedbackStats> {
        let helpful = ai_feedback::Entity::find()
            .filter(ai_feedback::Column::Rating.eq(Rating::Helpful))
            .count(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        let not_helpful = ai_feedback::Entity::find()
            .filter(ai_feedback::Column::Rating.eq(Rating::NotHelpful))
            .count(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        let total = helpful + not_helpful;
        let helpful_percentage = if total == 0 {
            0.0
        } else {
            (helpful as f64 / total as f64 * 10_000.0).round() / 100.0
        };

        Ok(FeedbackStats {
            total,
            helpful,
            not_helpful,
            helpful_percentage,
        })
    }
}
