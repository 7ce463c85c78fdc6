use crate::database::entities::{UsageRecord, user_ai_usage};
use crate::database::{DatabaseError, DatabaseResult};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::Serialize;

/// Quota arithmetic for one user's current month.
#[derive(Debug, Clone, Serialize)]
pub struct QuotaStatus {
    pub usage: i64,
    pub limit: i64,
    pub remaining: i64,
    pub percentage: f64,
    pub limit_exceeded: bool,
}

impl QuotaStatus {
    /// A limit of zero or less means unlimited.
    pub fn compute(used: i64, limit: i64) -> Self {
        if limit <= 0 {
            return Self {
                usage: used,
                limit,
                remaining: i64::MAX,
                percentage: 0.0,
                limit_exceeded: false,
            };
        }

        Self {
            usage: used,
            limit,
            remaining: (limit - used).max(0),
            percentage: (used as f64 / limit as f64 * 10_000.0).round() / 100.0,
            limit_exceeded: used >= limit,
        }
    }
}

/// The current "YYYY-MM" accounting key.
pub fn current_month() -> String {
    Utc::now().format("%Y-%m").to_string()
}

/// Human-readable label for a "YYYY-MM" key, e.g. "Apr 2025".
pub fn month_label(month: &str) -> String {
    let parsed = format!("{}-01", month);
    match NaiveDate::parse_from_str(&parsed, "%Y-%m-%d") {
        Ok(date) => date.format("%b %Y").to_string(),
        Err(_) => month.to_string(),
    }
}

pub struct UsageDao {
    db: DatabaseConnection,
}

impl UsageDao {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Additive upsert for one (user, month) row. The increment happens in
    /// the database so concurrent calls never lose updates.
    pub async fn record(
        &self,
        user_id: i32,
        month: &str,
        tokens: i64,
        cost: Decimal,
    ) -> DatabaseResult<()> {
        let now = Utc::now();
        let active_model = user_ai_usage::ActiveModel {
            id: ActiveValue::NotSet,
            user_id: Set(user_id),
            month: Set(month.to_string()),
            tokens_used: Set(tokens),
            estimated_cost: Set(cost),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let on_conflict = OnConflict::columns([
            user_ai_usage::Column::UserId,
            user_ai_usage::Column::Month,
        ])
        .value(
            user_ai_usage::Column::TokensUsed,
            Expr::col(user_ai_usage::Column::TokensUsed).add(tokens),
        )
        .value(
            user_ai_usage::Column::EstimatedCost,
            Expr::col(user_ai_usage::Column::EstimatedCost).add(cost),
        )
        .value(user_ai_usage::Column::UpdatedAt, Expr::value(now))
        .to_owned();

        user_ai_usage::Entity::insert(active_model)
            .on_conflict(on_conflict)
            .exec(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(())
    }

    pub async fn find_month(
        &self,
        user_id: i32,
        month: &str,
    ) -> DatabaseResult<Option<UsageRecord>> {
        user_ai_usage::Entity::find()
            .filter(user_ai_usage::Column::UserId.eq(user_id))
            .filter(user_ai_usage::Column::Month.eq(month))
            .one(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))
    }

    pub async fn tokens_used_in_month(&self, user_id: i32, month: &str) -> DatabaseResult<i64> {
        Ok(self
            .find_month(user_id, month)
            .await?
            .map(|record| record.tokens_used)
            .unwrap_or(0))
    }

    /// Up to `months_back` most recent rows, returned chronologically
    /// ascending for display.
    pub async fn history(&self, user_id: i32, months_back: u64) -> DatabaseResult<Vec<UsageRecord>> {
        let mut records = user_ai_usage::Entity::find()
            .filter(user_ai_usage::Column::UserId.eq(user_id))
            .order_by_desc(user_ai_usage::Column::Month)
            .limit(months_back)
            .all(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        records.reverse();
        Ok(records)
    }
}
