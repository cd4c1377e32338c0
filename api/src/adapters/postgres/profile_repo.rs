//! PostgreSQL adapter for ProfileRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::lower_eq;
use crate::domain::entities::{NewProfile, Profile, ProfileId, ProfileUpdate};
use crate::domain::ports::ProfileRepository;
use crate::entity::profiles;
use crate::error::DomainError;

/// PostgreSQL implementation of ProfileRepository
pub struct PostgresProfileRepository {
    db: DatabaseConnection,
}

impl PostgresProfileRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProfileRepository for PostgresProfileRepository {
    async fn find_by_id(&self, id: &ProfileId) -> Result<Option<Profile>, DomainError> {
        let result = profiles::Entity::find_by_id(id.0).one(&self.db).await?;

        Ok(result.map(|m| m.into()))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Profile>, DomainError> {
        let result = profiles::Entity::find()
            .filter(lower_eq(profiles::Column::Name, name))
            .one(&self.db)
            .await?;

        Ok(result.map(|m| m.into()))
    }

    async fn list(&self, include_inactive: bool) -> Result<Vec<Profile>, DomainError> {
        let mut query = profiles::Entity::find();

        if !include_inactive {
            query = query.filter(profiles::Column::Active.eq(true));
        }

        let results = query
            .order_by_asc(profiles::Column::Name)
            .all(&self.db)
            .await?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn create(&self, profile: &NewProfile) -> Result<Profile, DomainError> {
        let now = Utc::now().fixed_offset();

        let model = profiles::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(profile.name.clone()),
            description: Set(profile.description.clone()),
            active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(model.insert(&self.db).await?.into())
    }

    async fn update(
        &self,
        id: &ProfileId,
        update: &ProfileUpdate,
    ) -> Result<Profile, DomainError> {
        let existing = profiles::Entity::find_by_id(id.0)
            .one(&self.db)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Profile {} not found", id)))?;

        let mut model: profiles::ActiveModel = existing.into();

        if let Some(name) = &update.name {
            model.name = Set(name.clone());
        }
        if let Some(description) = &update.description {
            model.description = Set(Some(description.clone()));
        }
        if let Some(active) = update.active {
            model.active = Set(active);
        }
        model.updated_at = Set(Utc::now().fixed_offset());

        Ok(model.update(&self.db).await?.into())
    }

    async fn deactivate(&self, id: &ProfileId) -> Result<(), DomainError> {
        profiles::ActiveModel {
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
impl From<profiles::Model> for Profile {
    fn from(model: profiles::Model) -> Self {
        Profile {
            id: ProfileId(model.id),
            name: model.name,
            description: model.description,
            active: model.active,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}
