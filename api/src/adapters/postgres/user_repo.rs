//! PostgreSQL adapter for UserRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::domain::entities::{NewUser, ProfileId, User, UserId, UserUpdate};
use crate::domain::ports::UserRepository;
use crate::entity::users;
use crate::error::DomainError;

/// PostgreSQL implementation of UserRepository
pub struct PostgresUserRepository {
    db: DatabaseConnection,
}

impl PostgresUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        let result = users::Entity::find_by_id(id.0).one(&self.db).await?;

        Ok(result.map(|m| m.into()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let result = users::Entity::find()
            .filter(users::Column::Email.eq(email.trim().to_lowercase()))
            .one(&self.db)
            .await?;

        Ok(result.map(|m| m.into()))
    }

    async fn find_by_api_key_hash(&self, hash: &str) -> Result<Option<User>, DomainError> {
        let result = users::Entity::find()
            .filter(users::Column::ApiKeyHash.eq(hash))
            .one(&self.db)
            .await?;

        Ok(result.map(|m| m.into()))
    }

    async fn list(
        &self,
        include_inactive: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<User>, DomainError> {
        let mut query = users::Entity::find();

        if !include_inactive {
            query = query.filter(users::Column::Active.eq(true));
        }

        let results = query
            .order_by_asc(users::Column::Name)
            .offset(offset as u64)
            .limit(limit as u64)
            .all(&self.db)
            .await?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn count(&self) -> Result<u64, DomainError> {
        Ok(users::Entity::find().count(&self.db).await?)
    }

    async fn create(&self, user: &NewUser) -> Result<User, DomainError> {
        let now = Utc::now().fixed_offset();

        let model = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(user.name.clone()),
            email: Set(user.email.clone()),
            profile_id: Set(user.profile_id.0),
            api_key_hash: Set(user.api_key_hash.clone()),
            active: Set(true),
            last_seen_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(model.insert(&self.db).await?.into())
    }

    async fn update(&self, id: &UserId, update: &UserUpdate) -> Result<User, DomainError> {
        let existing = users::Entity::find_by_id(id.0)
            .one(&self.db)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("User {} not found", id)))?;

        let mut model: users::ActiveModel = existing.into();

        if let Some(name) = &update.name {
            model.name = Set(name.clone());
        }
        if let Some(profile_id) = update.profile_id {
            model.profile_id = Set(profile_id.0);
        }
        if let Some(active) = update.active {
            model.active = Set(active);
        }
        model.updated_at = Set(Utc::now().fixed_offset());

        Ok(model.update(&self.db).await?.into())
    }

    async fn update_api_key_hash(&self, id: &UserId, hash: &str) -> Result<(), DomainError> {
        users::ActiveModel {
            id: Set(id.0),
            api_key_hash: Set(hash.to_string()),
            updated_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        }
        .update(&self.db)
        .await?;

        Ok(())
    }

    async fn update_last_seen(&self, id: &UserId) -> Result<(), DomainError> {
        users::ActiveModel {
            id: Set(id.0),
            last_seen_at: Set(Some(Utc::now().fixed_offset())),
            ..Default::default()
        }
        .update(&self.db)
        .await?;

        Ok(())
    }

    async fn deactivate(&self, id: &UserId) -> Result<(), DomainError> {
        users::ActiveModel {
            id: Set(id.0),
            active: Set(false),
            updated_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        }
        .update(&self.db)
        .await?;

        Ok(())
    }
}

/// Convert SeaORM model to domain entity
impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        User {
            id: UserId(model.id),
            name: model.name,
            email: model.email,
            profile_id: ProfileId(model.profile_id),
            api_key_hash: model.api_key_hash,
            active: model.active,
            last_seen_at: model.last_seen_at.map(|dt| dt.with_timezone(&Utc)),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}
