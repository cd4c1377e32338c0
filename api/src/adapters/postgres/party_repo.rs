//! PostgreSQL adapter for PartyRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use super::{lower_contains, lower_eq};
use crate::domain::entities::{NewParty, Party, PartyId, PartyKind, PartyUpdate};
use crate::domain::ports::PartyRepository;
use crate::entity::parties;
use crate::error::DomainError;

/// PostgreSQL implementation of PartyRepository
pub struct PostgresPartyRepository {
    db: DatabaseConnection,
}

impl PostgresPartyRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

async fn find_by_name_on<C: ConnectionTrait>(
    conn: &C,
    kind: PartyKind,
    name: &str,
) -> Result<Option<parties::Model>, DomainError> {
    let result = parties::Entity::find()
        .filter(parties::Column::Kind.eq(kind.to_string()))
        .filter(lower_eq(parties::Column::Name, name))
        .order_by_asc(parties::Column::CreatedAt)
        .one(conn)
        .await?;

    Ok(result)
}

async fn insert_on<C: ConnectionTrait>(
    conn: &C,
    party: &NewParty,
) -> Result<parties::Model, DomainError> {
    let now = Utc::now().fixed_offset();

    let model = parties::ActiveModel {
        id: Set(Uuid::new_v4()),
        kind: Set(party.kind.to_string()),
        name: Set(party.name.clone()),
        document: Set(party.document.clone()),
        email: Set(party.email.clone()),
        phone: Set(party.phone.clone()),
        active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    };

    Ok(model.insert(conn).await?)
}

/// Resolve a party by name, inserting it when missing. Used inside the
/// import transaction.
pub(super) async fn find_or_create<C: ConnectionTrait>(
    conn: &C,
    kind: PartyKind,
    name: &str,
) -> Result<Uuid, DomainError> {
    if let Some(existing) = find_by_name_on(conn, kind, name).await? {
        return Ok(existing.id);
    }

    let created = insert_on(conn, &NewParty::named(kind, name.trim())).await?;
    tracing::debug!(kind = %kind, name = %created.name, "Created party during import");
    Ok(created.id)
}

#[async_trait]
impl PartyRepository for PostgresPartyRepository {
    async fn find_by_id(&self, id: &PartyId) -> Result<Option<Party>, DomainError> {
        let result = parties::Entity::find_by_id(id.0).one(&self.db).await?;

        Ok(result.map(|m| m.into()))
    }

    async fn find_by_name(
        &self,
        kind: PartyKind,
        name: &str,
    ) -> Result<Option<Party>, DomainError> {
        Ok(find_by_name_on(&self.db, kind, name).await?.map(|m| m.into()))
    }

    async fn list(
        &self,
        kind: PartyKind,
        search: Option<&str>,
        include_inactive: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Party>, DomainError> {
        let mut query = parties::Entity::find().filter(parties::Column::Kind.eq(kind.to_string()));

        if !include_inactive {
            query = query.filter(parties::Column::Active.eq(true));
        }
        if let Some(search) = search.filter(|s| !s.is_empty()) {
            query = query.filter(lower_contains(parties::Column::Name, search));
        }

        let results = query
            .order_by_asc(parties::Column::Name)
            .offset(offset as u64)
            .limit(limit as u64)
            .all(&self.db)
            .await?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn create(&self, party: &NewParty) -> Result<Party, DomainError> {
        Ok(insert_on(&self.db, party).await?.into())
    }

    async fn update(&self, id: &PartyId, update: &PartyUpdate) -> Result<Party, DomainError> {
        let existing = parties::Entity::find_by_id(id.0)
            .one(&self.db)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Party {} not found", id)))?;

        let mut model: parties::ActiveModel = existing.into();

        if let Some(name) = &update.name {
            model.name = Set(name.clone());
        }
        if let Some(document) = &update.document {
            model.document = Set(Some(document.clone()));
        }
        if let Some(email) = &update.email {
            model.email = Set(Some(email.clone()));
        }
        if let Some(phone) = &update.phone {
            model.phone = Set(Some(phone.clone()));
        }
        if let Some(active) = update.active {
            model.active = Set(active);
        }
        model.updated_at = Set(Utc::now().fixed_offset());

        Ok(model.update(&self.db).await?.into())
    }

    async fn deactivate(&self, id: &PartyId) -> Result<(), DomainError> {
        parties::ActiveModel {
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
impl From<parties::Model> for Party {
    fn from(model: parties::Model) -> Self {
        Party {
            id: PartyId(model.id),
            kind: model.kind.parse().unwrap_or(PartyKind::Complainant),
            name: model.name,
            document: model.document,
            email: model.email,
            phone: model.phone,
            active: model.active,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}
