//! PostgreSQL adapter for ProcessRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use super::lower_contains;
use crate::domain::entities::{
    LookupId, NewProcess, PartyId, Process, ProcessFilter, ProcessId, ProcessUpdate, ReportRow,
    ResponsibleId,
};
use crate::domain::ports::ProcessRepository;
use crate::entity::processes;
use crate::error::DomainError;

/// PostgreSQL implementation of ProcessRepository
pub struct PostgresProcessRepository {
    db: DatabaseConnection,
}

impl PostgresProcessRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProcessRepository for PostgresProcessRepository {
    async fn find_by_id(&self, id: &ProcessId) -> Result<Option<Process>, DomainError> {
        let result = processes::Entity::find_by_id(id.0).one(&self.db).await?;

        Ok(result.map(|m| m.into()))
    }

    async fn find_by_number(&self, number: &str) -> Result<Option<Process>, DomainError> {
        let result = processes::Entity::find()
            .filter(processes::Column::Number.eq(number))
            .one(&self.db)
            .await?;

        Ok(result.map(|m| m.into()))
    }

    async fn list(&self, filter: &ProcessFilter) -> Result<(Vec<Process>, u64), DomainError> {
        let mut query = processes::Entity::find();

        if !filter.include_inactive {
            query = query.filter(processes::Column::Active.eq(true));
        }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
            query = query.filter(lower_contains(processes::Column::Number, search));
        }
        if let Some(situation_id) = filter.situation_id {
            query = query.filter(processes::Column::SituationId.eq(situation_id.0));
        }
        if let Some(responsible_id) = filter.responsible_id {
            query = query.filter(processes::Column::ResponsibleId.eq(responsible_id.0));
        }
        if let Some(entry_channel_id) = filter.entry_channel_id {
            query = query.filter(processes::Column::EntryChannelId.eq(entry_channel_id.0));
        }

        let total = query.clone().count(&self.db).await?;

        let results = query
            .order_by_desc(processes::Column::CreatedAt)
            .offset(filter.offset as u64)
            .limit(filter.limit as u64)
            .all(&self.db)
            .await?;

        Ok((results.into_iter().map(|m| m.into()).collect(), total))
    }

    async fn create(&self, process: &NewProcess) -> Result<Process, DomainError> {
        let now = Utc::now().fixed_offset();

        let model = processes::ActiveModel {
            id: Set(Uuid::new_v4()),
            number: Set(process.number.clone()),
            complainant_id: Set(process.complainant_id.map(|id| id.0)),
            controller_id: Set(process.controller_id.map(|id| id.0)),
            responsible_id: Set(process.responsible_id.map(|id| id.0)),
            entry_channel_id: Set(process.entry_channel_id.map(|id| id.0)),
            situation_id: Set(process.situation_id.map(|id| id.0)),
            referral_id: Set(process.referral_id.map(|id| id.0)),
            description: Set(process.description.clone()),
            received_at: Set(process.received_at),
            closed_at: Set(process.closed_at),
            active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model.insert(&self.db).await?;

        Ok(result.into())
    }

    async fn update(
        &self,
        id: &ProcessId,
        update: &ProcessUpdate,
    ) -> Result<Process, DomainError> {
        let existing = processes::Entity::find_by_id(id.0)
            .one(&self.db)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Process {} not found", id)))?;

        let mut model: processes::ActiveModel = existing.into();

        if let Some(number) = &update.number {
            model.number = Set(number.clone());
        }
        if let Some(complainant_id) = update.complainant_id {
            model.complainant_id = Set(complainant_id.map(|id| id.0));
        }
        if let Some(controller_id) = update.controller_id {
            model.controller_id = Set(controller_id.map(|id| id.0));
        }
        if let Some(responsible_id) = update.responsible_id {
            model.responsible_id = Set(responsible_id.map(|id| id.0));
        }
        if let Some(entry_channel_id) = update.entry_channel_id {
            model.entry_channel_id = Set(entry_channel_id.map(|id| id.0));
        }
        if let Some(situation_id) = update.situation_id {
            model.situation_id = Set(situation_id.map(|id| id.0));
        }
        if let Some(referral_id) = update.referral_id {
            model.referral_id = Set(referral_id.map(|id| id.0));
        }
        if let Some(description) = &update.description {
            model.description = Set(description.clone());
        }
        if let Some(received_at) = update.received_at {
            model.received_at = Set(received_at);
        }
        if let Some(closed_at) = update.closed_at {
            model.closed_at = Set(closed_at);
        }
        if let Some(active) = update.active {
            model.active = Set(active);
        }
        model.updated_at = Set(Utc::now().fixed_offset());

        let result = model.update(&self.db).await?;

        Ok(result.into())
    }

    async fn deactivate(&self, id: &ProcessId) -> Result<(), DomainError> {
        processes::ActiveModel {
            id: Set(id.0),
            active: Set(false),
            updated_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        }
        .update(&self.db)
        .await?;

        Ok(())
    }

    async fn report_rows(&self) -> Result<Vec<ReportRow>, DomainError> {
        let results = processes::Entity::find().all(&self.db).await?;

        Ok(results
            .into_iter()
            .map(|m| ReportRow {
                situation_id: m.situation_id.map(LookupId),
                entry_channel_id: m.entry_channel_id.map(LookupId),
                responsible_id: m.responsible_id.map(ResponsibleId),
                received_at: m.received_at,
                closed_at: m.closed_at,
                active: m.active,
            })
            .collect())
    }
}

/// Convert SeaORM model to domain entity
impl From<processes::Model> for Process {
    fn from(model: processes::Model) -> Self {
        Process {
            id: ProcessId(model.id),
            number: model.number,
            complainant_id: model.complainant_id.map(PartyId),
            controller_id: model.controller_id.map(PartyId),
            responsible_id: model.responsible_id.map(ResponsibleId),
            entry_channel_id: model.entry_channel_id.map(LookupId),
            situation_id: model.situation_id.map(LookupId),
            referral_id: model.referral_id.map(LookupId),
            description: model.description,
            received_at: model.received_at,
            closed_at: model.closed_at,
            active: model.active,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}
