//! Process service
//!
//! Validation and reference checks around process CRUD.

use std::sync::Arc;

use serde::Serialize;

use crate::app::validation;
use crate::domain::entities::{
    normalize_process_number, validate_dates, LookupId, LookupKind, NewProcess, PartyId,
    PartyKind, Process, ProcessFilter, ProcessId, ProcessUpdate, ResponsibleId,
};
use crate::domain::ports::{
    LookupRepository, PartyRepository, ProcessRepository, ResponsibleRepository,
};
use crate::error::{AppError, DomainError};

/// One page of a process listing
#[derive(Debug, Serialize)]
pub struct ProcessPage {
    pub items: Vec<Process>,
    pub total: u64,
    pub limit: i64,
    pub offset: i64,
}

pub struct ProcessService {
    processes: Arc<dyn ProcessRepository>,
    parties: Arc<dyn PartyRepository>,
    lookups: Arc<dyn LookupRepository>,
    responsibles: Arc<dyn ResponsibleRepository>,
}

impl ProcessService {
    pub fn new(
        processes: Arc<dyn ProcessRepository>,
        parties: Arc<dyn PartyRepository>,
        lookups: Arc<dyn LookupRepository>,
        responsibles: Arc<dyn ResponsibleRepository>,
    ) -> Self {
        Self {
            processes,
            parties,
            lookups,
            responsibles,
        }
    }

    pub async fn create(&self, mut new: NewProcess) -> Result<Process, AppError> {
        new.number = normalize_process_number(&new.number).map_err(DomainError::Validation)?;
        new.description = validation::optional(new.description.as_deref());
        validate_dates(new.received_at, new.closed_at).map_err(DomainError::Validation)?;

        self.check_party(new.complainant_id, PartyKind::Complainant)
            .await?;
        self.check_party(new.controller_id, PartyKind::Controller)
            .await?;
        self.check_responsible(new.responsible_id).await?;
        self.check_lookup(new.entry_channel_id, LookupKind::EntryChannel)
            .await?;
        self.check_lookup(new.situation_id, LookupKind::Situation)
            .await?;
        self.check_lookup(new.referral_id, LookupKind::Referral)
            .await?;

        if self.processes.find_by_number(&new.number).await?.is_some() {
            return Err(AppError::Domain(DomainError::AlreadyExists(format!(
                "Process {} already exists",
                new.number
            ))));
        }

        let process = self.processes.create(&new).await?;
        tracing::info!(process_id = %process.id, number = %process.number, "Process created");

        Ok(process)
    }

    pub async fn get(&self, id: &ProcessId) -> Result<Process, AppError> {
        self.processes
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Process {} not found", id)))
    }

    pub async fn list(
        &self,
        mut filter: ProcessFilter,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<ProcessPage, AppError> {
        let (limit, offset) = validation::page(limit, offset);
        filter.limit = limit;
        filter.offset = offset;
        filter.search = validation::optional(filter.search.as_deref());

        let (items, total) = self.processes.list(&filter).await?;

        Ok(ProcessPage {
            items,
            total,
            limit,
            offset,
        })
    }

    pub async fn update(
        &self,
        id: &ProcessId,
        mut update: ProcessUpdate,
    ) -> Result<Process, AppError> {
        let current = self.get(id).await?;

        if let Some(number) = &update.number {
            let number = normalize_process_number(number).map_err(DomainError::Validation)?;
            if number != current.number {
                if let Some(other) = self.processes.find_by_number(&number).await? {
                    if other.id != current.id {
                        return Err(AppError::Domain(DomainError::AlreadyExists(format!(
                            "Process {} already exists",
                            number
                        ))));
                    }
                }
            }
            update.number = Some(number);
        }
        if let Some(description) = &update.description {
            update.description = Some(validation::optional(description.as_deref()));
        }

        // Dates are checked against the merged record, not just the patch
        let merged = update.apply_to(current);
        validate_dates(merged.received_at, merged.closed_at).map_err(DomainError::Validation)?;

        // Only newly assigned references need checking; clearing is always fine
        self.check_party(update.complainant_id.flatten(), PartyKind::Complainant)
            .await?;
        self.check_party(update.controller_id.flatten(), PartyKind::Controller)
            .await?;
        self.check_responsible(update.responsible_id.flatten()).await?;
        self.check_lookup(update.entry_channel_id.flatten(), LookupKind::EntryChannel)
            .await?;
        self.check_lookup(update.situation_id.flatten(), LookupKind::Situation)
            .await?;
        self.check_lookup(update.referral_id.flatten(), LookupKind::Referral)
            .await?;

        Ok(self.processes.update(id, &update).await?)
    }

    pub async fn deactivate(&self, id: &ProcessId) -> Result<Process, AppError> {
        let process = self.get(id).await?;
        self.processes.deactivate(id).await?;
        tracing::info!(process_id = %id, number = %process.number, "Process deactivated");

        Ok(Process {
            active: false,
            ..process
        })
    }

    async fn check_party(&self, id: Option<PartyId>, kind: PartyKind) -> Result<(), AppError> {
        let Some(id) = id else {
            return Ok(());
        };
        match self.parties.find_by_id(&id).await? {
            Some(party) if party.kind == kind => Ok(()),
            _ => Err(unknown_reference(&kind.to_string(), &id.to_string())),
        }
    }

    async fn check_lookup(&self, id: Option<LookupId>, kind: LookupKind) -> Result<(), AppError> {
        let Some(id) = id else {
            return Ok(());
        };
        match self.lookups.find_by_id(&id).await? {
            Some(lookup) if lookup.kind == kind => Ok(()),
            _ => Err(unknown_reference(&kind.to_string(), &id.to_string())),
        }
    }

    async fn check_responsible(&self, id: Option<ResponsibleId>) -> Result<(), AppError> {
        let Some(id) = id else {
            return Ok(());
        };
        match self.responsibles.find_by_id(&id).await? {
            Some(_) => Ok(()),
            None => Err(unknown_reference("responsible", &id.to_string())),
        }
    }
}

fn unknown_reference(kind: &str, id: &str) -> AppError {
    AppError::Domain(DomainError::Validation(format!(
        "Unknown {}: {}",
        kind, id
    )))
}
