//! PostgreSQL adapter for LookupRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use super::lower_eq;
use crate::domain::entities::{Lookup, LookupId, LookupKind, LookupUpdate, NewLookup};
use crate::domain::ports::LookupRepository;
use crate::entity::lookups;
use crate::error::DomainError;

/// PostgreSQL implementation of LookupRepository
pub struct PostgresLookupRepository {
    db: DatabaseConnection,
}

impl PostgresLookupRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

async fn find_by_name_on<C: ConnectionTrait>(
    conn: &C,
    kind: LookupKind,
    name: &str,
) -> Result<Option<lookups::Model>, DomainError> {
    let result = lookups::Entity::find()
        .filter(lookups::Column::Kind.eq(kind.to_string()))
        .filter(lower_eq(lookups::Column::Name, name))
        .one(conn)
        .await?;

    Ok(result)
}

async fn insert_on<C: ConnectionTrait>(
    conn: &C,
    lookup: &NewLookup,
) -> Result<lookups::Model, DomainError> {
    let now = Utc::now().fixed_offset();

    let model = lookups::ActiveModel {
        id: Set(Uuid::new_v4()),
        kind: Set(lookup.kind.to_string()),
        name: Set(lookup.name.clone()),
        active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    };

    Ok(model.insert(conn).await?)
}

/// Resolve a lookup by name, inserting it when missing
pub(super) async fn find_or_create<C: ConnectionTrait>(
    conn: &C,
    kind: LookupKind,
    name: &str,
) -> Result<Uuid, DomainError> {
    if let Some(existing) = find_by_name_on(conn, kind, name).await? {
        return Ok(existing.id);
    }

    let created = insert_on(
        conn,
        &NewLookup {
            kind,
            name: name.trim().to_string(),
        },
    )
    .await?;
    tracing::debug!(kind = %kind, name = %created.name, "Created lookup during import");
    Ok(created.id)
}

#[async_trait]
impl LookupRepository for PostgresLookupRepository {
    async fn find_by_id(&self, id: &LookupId) -> Result<Option<Lookup>, DomainError> {
        let result = lookups::Entity::find_by_id(id.0).one(&self.db).await?;

        Ok(result.map(|m| m.into()))
    }

    async fn find_by_name(
        &self,
        kind: LookupKind,
        name: &str,
    ) -> Result<Option<Lookup>, DomainError> {
        Ok(find_by_name_on(&self.db, kind, name).await?.map(|m| m.into()))
    }

    async fn list(
        &self,
        kind: LookupKind,
        include_inactive: bool,
    ) -> Result<Vec<Lookup>, DomainError> {
        let mut query = lookups::Entity::find().filter(lookups::Column::Kind.eq(kind.to_string()));

        if !include_inactive {
            query = query.filter(lookups::Column::Active.eq(true));
        }

        let results = query
            .order_by_asc(lookups::Column::Name)
            .all(&self.db)
            .await?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn create(&self, lookup: &NewLookup) -> Result<Lookup, DomainError> {
        Ok(insert_on(&self.db, lookup).await?.into())
    }

    async fn update(&self, id: &LookupId, update: &LookupUpdate) -> Result<Lookup, DomainError> {
        let existing = lookups::Entity::find_by_id(id.0)
            .one(&self.db)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Lookup {} not found", id)))?;

        let mut model: lookups::ActiveModel = existing.into();

        if let Some(name) = &update.name {
            model.name = Set(name.clone());
        }
        if let Some(active) = update.active {
            model.active = Set(active);
        }
        model.updated_at = Set(Utc::now().fixed_offset());

        Ok(model.update(&self.db).await?.into())
    }

    async fn deactivate(&self, id: &LookupId) -> Result<(), DomainError> {
        lookups::ActiveModel {
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
impl From<lookups::Model> for Lookup {
    fn from(model: lookups::Model) -> Self {
        Lookup {
            id: LookupId(model.id),
            kind: model.kind.parse().unwrap_or(LookupKind::Situation),
            name: model.name,
            active: model.active,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}
