use crate::database::entities::{InteractionLog, Rating, ai_logs};
use crate::database::{DatabaseError, DatabaseResult};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};

/// Prompts and responses are stored at most this long.
const MAX_STORED_TEXT: usize = 65_535;

#[derive(Debug, Clone)]
pub struct NewLogEntry {
    pub user_id: Option<i32>,
    pub prompt: String,
    pub response: String,
    pub model: Option<String>,
    pub tokens_used: Option<i32>,
    pub cost: Option<Decimal>,
    pub persona: String,
    pub context_used: bool,
}

pub struct LogsDao {
    db: DatabaseConnection,
}

impl LogsDao {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, entry: NewLogEntry) -> DatabaseResult<InteractionLog> {
        let active_model = ai_logs::ActiveModel {
            id: ActiveValue::NotSet,
            user_id: Set(entry.user_id),
            prompt: Set(truncate(&entry.prompt)),
            response: Set(truncate(&entry.response)),
            model: Set(entry.model),
            tokens_used: Set(entry.tokens_used),
            cost: Set(entry.cost),
            persona: Set(entry.persona),
            context_used: Set(entry.context_used),
            feedback: Set(None),
            feedback_at: Set(None),
            created_at: Set(Utc::now()),
        };

        active_model
            .insert(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))
    }

    pub async fn find_by_id(&self, id: i32) -> DatabaseResult<Option<InteractionLog>> {
        ai_logs::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))
    }

    /// Mirror the latest rating onto the log row itself.
    pub async fn attach_feedback(&self, log_id: i32, rating: Rating) -> DatabaseResult<()> {
        let log = self
            .find_by_id(log_id)
            .await?
            .ok_or(DatabaseError::NotFound)?;

        let mut active_model: ai_logs::ActiveModel = log.into();
        active_model.feedback = Set(Some(rating.as_str().to_string()));
        active_model.feedback_at = Set(Some(Utc::now()));

        active_model
            .update(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(())
    }

    pub async fn count(&self) -> DatabaseResult<u64> {
        ai_logs::Entity::find()
            .count(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))
    }

    pub async fn count_for_user(&self, user_id: i32) -> DatabaseResult<u64> {
        ai_logs::Entity::find()
            .filter(ai_logs::Column::UserId.eq(user_id))
            .count(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))
    }
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_STORED_TEXT {
        text.to_string()
    } else {
        text.chars().take(MAX_STORED_TEXT).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate("hello"), "hello");
    }

    #[test]
    fn test_truncate_long_text() {
        let long = "x".repeat(MAX_STORED_TEXT + 100);
        assert_eq!(truncate(&long).chars().count(), MAX_STORED_TEXT);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let long = "é".repeat(MAX_STORED_TEXT + 1);
        let truncated = truncate(&long);
        assert_eq!(truncated.chars().count(), MAX_STORED_TEXT);
    }
}
