use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    #[sea_orm(string_value = "helpful")]
    Helpful,
    #[sea_orm(string_value = "not_helpful")]
    NotHelpful,
}

impl Rating {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "helpful" => Some(Rating::Helpful),
            "not_helpful" => Some(Rating::NotHelpful),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Helpful => "helpful",
            Rating::NotHelpful => "not_helpful",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ai_feedback")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub ai_log_id: i32,
    pub user_id: Option<i32>,
    pub rating: Rating,
    #[sea_orm(column_type = "Text", nullable)]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
