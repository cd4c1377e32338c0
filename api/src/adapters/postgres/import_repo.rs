//! PostgreSQL adapter for ProcessImportRepository
//!
//! Each row runs in its own transaction: foreign-key resolution, the
//! duplicate check and the insert commit together or not at all.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use uuid::Uuid;

use super::{lookup_repo, party_repo, responsible_repo};
use crate::domain::entities::{ImportOutcome, ImportRow, LookupKind, PartyKind, ProcessId};
use crate::domain::ports::ProcessImportRepository;
use crate::entity::processes;
use crate::error::DomainError;

/// PostgreSQL implementation of ProcessImportRepository
pub struct PostgresProcessImportRepository {
    db: DatabaseConnection,
}

impl PostgresProcessImportRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

async fn party<C: ConnectionTrait>(
    conn: &C,
    kind: PartyKind,
    name: Option<&str>,
) -> Result<Option<Uuid>, DomainError> {
    match name {
        Some(name) => Ok(Some(party_repo::find_or_create(conn, kind, name).await?)),
        None => Ok(None),
    }
}

async fn lookup<C: ConnectionTrait>(
    conn: &C,
    kind: LookupKind,
    name: Option<&str>,
) -> Result<Option<Uuid>, DomainError> {
    match name {
        Some(name) => Ok(Some(lookup_repo::find_or_create(conn, kind, name).await?)),
        None => Ok(None),
    }
}

#[async_trait]
impl ProcessImportRepository for PostgresProcessImportRepository {
    async fn import_row(&self, row: &ImportRow) -> Result<ImportOutcome, DomainError> {
        let txn = self.db.begin().await?;

        let existing = processes::Entity::find()
            .filter(processes::Column::Number.eq(row.number.as_str()))
            .one(&txn)
            .await?;
        if existing.is_some() {
            txn.rollback().await?;
            return Ok(ImportOutcome::Duplicate);
        }

        let complainant_id = party(&txn, PartyKind::Complainant, row.complainant.as_deref()).await?;
        let controller_id = party(&txn, PartyKind::Controller, row.controller.as_deref()).await?;
        let responsible_id = match row.responsible.as_deref() {
            Some(name) => Some(responsible_repo::find_or_create(&txn, name).await?),
            None => None,
        };
        let entry_channel_id =
            lookup(&txn, LookupKind::EntryChannel, row.entry_channel.as_deref()).await?;
        let situation_id = lookup(&txn, LookupKind::Situation, row.situation.as_deref()).await?;
        let referral_id = lookup(&txn, LookupKind::Referral, row.referral.as_deref()).await?;

        let now = Utc::now().fixed_offset();
        let inserted = processes::ActiveModel {
            id: Set(Uuid::new_v4()),
            number: Set(row.number.clone()),
            complainant_id: Set(complainant_id),
            controller_id: Set(controller_id),
            responsible_id: Set(responsible_id),
            entry_channel_id: Set(entry_channel_id),
            situation_id: Set(situation_id),
            referral_id: Set(referral_id),
            description: Set(row.description.clone()),
            received_at: Set(row.received_at),
            closed_at: Set(row.closed_at),
            active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        Ok(ImportOutcome::Imported(ProcessId(inserted.id)))
    }
}
