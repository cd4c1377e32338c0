//! PostgreSQL adapter for ResponsibleRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use super::lower_eq;
use crate::domain::entities::{
    NewResponsible, Responsible, ResponsibleId, ResponsibleUpdate, UserId,
};
use crate::domain::ports::ResponsibleRepository;
use crate::entity::responsibles;
use crate::error::DomainError;

/// PostgreSQL implementation of ResponsibleRepository
pub struct PostgresResponsibleRepository {
    db: DatabaseConnection,
}

impl PostgresResponsibleRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

async fn find_by_name_on<C: ConnectionTrait>(
    conn: &C,
    name: &str,
) -> Result<Option<responsibles::Model>, DomainError> {
    let result = responsibles::Entity::find()
        .filter(lower_eq(responsibles::Column::Name, name))
        .order_by_asc(responsibles::Column::CreatedAt)
        .one(conn)
        .await?;

    Ok(result)
}

async fn insert_on<C: ConnectionTrait>(
    conn: &C,
    responsible: &NewResponsible,
) -> Result<responsibles::Model, DomainError> {
    let now = Utc::now().fixed_offset();

    let model = responsibles::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(responsible.name.clone()),
        email: Set(responsible.email.clone()),
        user_id: Set(responsible.user_id.map(|id| id.0)),
        active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    };

    Ok(model.insert(conn).await?)
}

/// Resolve a responsible by name, inserting it when missing
pub(super) async fn find_or_create<C: ConnectionTrait>(
    conn: &C,
    name: &str,
) -> Result<Uuid, DomainError> {
    if let Some(existing) = find_by_name_on(conn, name).await? {
        return Ok(existing.id);
    }

    let created = insert_on(
        conn,
        &NewResponsible {
            name: name.trim().to_string(),
            email: None,
            user_id: None,
        },
    )
    .await?;
    tracing::debug!(name = %created.name, "Created responsible during import");
    Ok(created.id)
}

#[async_trait]
impl ResponsibleRepository for PostgresResponsibleRepository {
    async fn find_by_id(&self, id: &ResponsibleId) -> Result<Option<Responsible>, DomainError> {
        let result = responsibles::Entity::find_by_id(id.0).one(&self.db).await?;

        Ok(result.map(|m| m.into()))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Responsible>, DomainError> {
        Ok(find_by_name_on(&self.db, name).await?.map(|m| m.into()))
    }

    async fn list(&self, include_inactive: bool) -> Result<Vec<Responsible>, DomainError> {
        let mut query = responsibles::Entity::find();

        if !include_inactive {
            query = query.filter(responsibles::Column::Active.eq(true));
        }

        let results = query
            .order_by_asc(responsibles::Column::Name)
            .all(&self.db)
            .await?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn create(&self, responsible: &NewResponsible) -> Result<Responsible, DomainError> {
        Ok(insert_on(&self.db, responsible).await?.into())
    }

    async fn update(
        &self,
        id: &ResponsibleId,
        update: &ResponsibleUpdate,
    ) -> Result<Responsible, DomainError> {
        let existing = responsibles::Entity::find_by_id(id.0)
            .one(&self.db)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Responsible {} not found", id)))?;

        let mut model: responsibles::ActiveModel = existing.into();

        if let Some(name) = &update.name {
            model.name = Set(name.clone());
        }
        if let Some(email) = &update.email {
            model.email = Set(Some(email.clone()));
        }
        if let Some(user_id) = update.user_id {
            model.user_id = Set(Some(user_id.0));
        }
        if let Some(active) = update.active {
            model.active = Set(active);
        }
        model.updated_at = Set(Utc::now().fixed_offset());

        Ok(model.update(&self.db).await?.into())
    }

    async fn deactivate(&self, id: &ResponsibleId) -> Result<(), DomainError> {
        responsibles::ActiveModel {
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
impl From<responsibles::Model> for Responsible {
    fn from(model: responsibles::Model) -> Self {
        Responsible {
            id: ResponsibleId(model.id),
            name: model.name,
            email: model.email,
            user_id: model.user_id.map(UserId),
            active: model.active,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}
