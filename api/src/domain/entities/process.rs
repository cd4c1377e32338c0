//! Process domain entity
//!
//! An administrative process opened for an LGPD complaint or inspection.
//! The process number is the business key and is unique across the system.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::lookup::LookupId;
use super::party::PartyId;
use super::responsible::ResponsibleId;

/// Longest process number accepted after normalization
pub const MAX_PROCESS_NUMBER_LEN: usize = 64;

/// Unique identifier for a process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessId(pub Uuid);

impl ProcessId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ProcessId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ProcessId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ProcessId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A tracked administrative process
#[derive(Debug, Clone, Serialize)]
pub struct Process {
    pub id: ProcessId,
    pub number: String,
    pub complainant_id: Option<PartyId>,
    /// The "requerido": the organization the complaint is filed against
    pub controller_id: Option<PartyId>,
    pub responsible_id: Option<ResponsibleId>,
    pub entry_channel_id: Option<LookupId>,
    pub situation_id: Option<LookupId>,
    pub referral_id: Option<LookupId>,
    pub description: Option<String>,
    pub received_at: Option<NaiveDate>,
    pub closed_at: Option<NaiveDate>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Process {
    pub fn is_closed(&self) -> bool {
        self.closed_at.is_some()
    }

    /// Active and not yet closed
    pub fn is_open(&self) -> bool {
        self.active && !self.is_closed()
    }
}

/// Data needed to create a new process
#[derive(Debug, Clone, Default)]
pub struct NewProcess {
    pub number: String,
    pub complainant_id: Option<PartyId>,
    pub controller_id: Option<PartyId>,
    pub responsible_id: Option<ResponsibleId>,
    pub entry_channel_id: Option<LookupId>,
    pub situation_id: Option<LookupId>,
    pub referral_id: Option<LookupId>,
    pub description: Option<String>,
    pub received_at: Option<NaiveDate>,
    pub closed_at: Option<NaiveDate>,
}

/// Partial update
///
/// `None` leaves the stored value untouched. Nullable fields use a nested
/// option: `Some(None)` clears the stored value.
#[derive(Debug, Clone, Default)]
pub struct ProcessUpdate {
    pub number: Option<String>,
    pub complainant_id: Option<Option<PartyId>>,
    pub controller_id: Option<Option<PartyId>>,
    pub responsible_id: Option<Option<ResponsibleId>>,
    pub entry_channel_id: Option<Option<LookupId>>,
    pub situation_id: Option<Option<LookupId>>,
    pub referral_id: Option<Option<LookupId>>,
    pub description: Option<Option<String>>,
    pub received_at: Option<Option<NaiveDate>>,
    pub closed_at: Option<Option<NaiveDate>>,
    pub active: Option<bool>,
}

impl ProcessUpdate {
    /// Apply the update to an existing process, returning the merged state
    pub fn apply_to(&self, mut process: Process) -> Process {
        if let Some(number) = &self.number {
            process.number = number.clone();
        }
        if let Some(complainant_id) = self.complainant_id {
            process.complainant_id = complainant_id;
        }
        if let Some(controller_id) = self.controller_id {
            process.controller_id = controller_id;
        }
        if let Some(responsible_id) = self.responsible_id {
            process.responsible_id = responsible_id;
        }
        if let Some(entry_channel_id) = self.entry_channel_id {
            process.entry_channel_id = entry_channel_id;
        }
        if let Some(situation_id) = self.situation_id {
            process.situation_id = situation_id;
        }
        if let Some(referral_id) = self.referral_id {
            process.referral_id = referral_id;
        }
        if let Some(description) = &self.description {
            process.description = description.clone();
        }
        if let Some(received_at) = self.received_at {
            process.received_at = received_at;
        }
        if let Some(closed_at) = self.closed_at {
            process.closed_at = closed_at;
        }
        if let Some(active) = self.active {
            process.active = active;
        }
        process
    }
}

/// Listing filter for processes
#[derive(Debug, Clone, Default)]
pub struct ProcessFilter {
    /// Substring match on the process number
    pub search: Option<String>,
    pub situation_id: Option<LookupId>,
    pub responsible_id: Option<ResponsibleId>,
    pub entry_channel_id: Option<LookupId>,
    pub include_inactive: bool,
    pub limit: i64,
    pub offset: i64,
}

/// Normalize a process number: trim and collapse inner whitespace.
///
/// Rejects empty numbers, numbers without any digit and numbers longer
/// than [`MAX_PROCESS_NUMBER_LEN`].
pub fn normalize_process_number(raw: &str) -> Result<String, String> {
    let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    if normalized.is_empty() {
        return Err("Process number is required".to_string());
    }
    if normalized.chars().count() > MAX_PROCESS_NUMBER_LEN {
        return Err(format!(
            "Process number must be at most {} characters",
            MAX_PROCESS_NUMBER_LEN
        ));
    }
    if !normalized.chars().any(|c| c.is_ascii_digit()) {
        return Err(format!("Invalid process number: {}", normalized));
    }

    Ok(normalized)
}

/// Closing date must not precede the receiving date
pub fn validate_dates(
    received_at: Option<NaiveDate>,
    closed_at: Option<NaiveDate>,
) -> Result<(), String> {
    match (received_at, closed_at) {
        (Some(received), Some(closed)) if closed < received => Err(format!(
            "closed_at ({}) must not be earlier than received_at ({})",
            closed, received
        )),
        _ => Ok(()),
    }
}
