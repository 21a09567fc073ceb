use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::entities::user;
use crate::errors::ServiceError;
use crate::validation::validate_not_blank;

/// Account owning orders.
#[derive(Clone)]
pub struct UserService {
    db: Arc<DatabaseConnection>,
}

impl UserService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn create_user(&self, input: CreateUserInput) -> Result<user::Model, ServiceError> {
        input.validate()?;
        let username = input.username.trim().to_string();

        let taken = user::Entity::find()
            .filter(user::Column::Username.eq(username.as_str()))
            .count(&*self.db)
            .await?;
        if taken > 0 {
            return Err(ServiceError::Conflict(format!(
                "Username '{}' is already taken",
                username
            )));
        }

        let created = user::ActiveModel {
            username: Set(username),
            email: Set(input.email.filter(|e| !e.trim().is_empty())),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(user_id = created.id, "Created user");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, id: i32) -> Result<user::Model, ServiceError> {
        user::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", id))
    }

    #[instrument(skip(self))]
    pub async fn list_users(
        &self,
        search: Option<String>,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<user::Model>, u64), ServiceError> {
        let mut query = user::Entity::find();
        if let Some(search) = search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(user::Column::Username.contains(search));
        }

        let total = query.clone().count(&*self.db).await?;
        let users = query
            .order_by_asc(user::Column::Username)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await?;

        Ok((users, total))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateUserInput {
    #[validate(length(min = 1, max = 150), custom = "validate_not_blank")]
    #[schema(example = "frontdesk")]
    pub username: String,
    #[validate(email)]
    #[schema(example = "frontdesk@optica.example")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserView {
    pub id: i32,
    pub username: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserView {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            created_at: model.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_username_is_rejected() {
        let input = CreateUserInput {
            username: "   ".into(),
            email: None,
        };
        let errors = input.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("username"));
    }

    #[test]
    fn malformed_email_is_rejected() {
        let input = CreateUserInput {
            username: "clerk".into(),
            email: Some("not-an-email".into()),
        };
        assert!(input.validate().is_err());
    }
}
