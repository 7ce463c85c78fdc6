use crate::database::entities::{UserRecord, users};
use crate::database::{DatabaseError, DatabaseResult};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};

pub struct UsersDao {
    db: DatabaseConnection,
}

impl UsersDao {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, email: &str, display_name: &str) -> DatabaseResult<UserRecord> {
        let active_model = users::ActiveModel {
            id: ActiveValue::NotSet,
            email: Set(email.to_string()),
            display_name: Set(display_name.to_string()),
            created_at: Set(Utc::now()),
        };

        active_model
            .insert(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))
    }

    pub async fn find_by_id(&self, id: i32) -> DatabaseResult<Option<UserRecord>> {
        users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))
    }

    pub async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<UserRecord>> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))
    }
}
