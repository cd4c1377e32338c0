//! Lookup domain entity
//!
//! Label tables attached to processes: entry channel, situation and referral.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a lookup value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LookupId(pub Uuid);

impl LookupId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LookupId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for LookupId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for LookupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which label table a lookup belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupKind {
    EntryChannel,
    Situation,
    Referral,
}

impl LookupKind {
    pub const ALL: [LookupKind; 3] = [
        LookupKind::EntryChannel,
        LookupKind::Situation,
        LookupKind::Referral,
    ];
}

impl std::fmt::Display for LookupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupKind::EntryChannel => write!(f, "entry_channel"),
            LookupKind::Situation => write!(f, "situation"),
            LookupKind::Referral => write!(f, "referral"),
        }
    }
}

impl std::str::FromStr for LookupKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "entry_channel" | "entry_channels" => Ok(LookupKind::EntryChannel),
            "situation" | "situations" => Ok(LookupKind::Situation),
            "referral" | "referrals" => Ok(LookupKind::Referral),
            _ => Err(format!("Unknown lookup kind: {}", s)),
        }
    }
}

/// A label value such as "E-mail" (entry channel) or "Arquivado" (situation)
#[derive(Debug, Clone, Serialize)]
pub struct Lookup {
    pub id: LookupId,
    pub kind: LookupKind,
    pub name: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewLookup {
    pub kind: LookupKind,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct LookupUpdate {
    pub name: Option<String>,
    pub active: Option<bool>,
}
