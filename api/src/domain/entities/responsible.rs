//! Responsible domain entity
//!
//! A staff member a process can be assigned to. May be linked to a user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserId;

/// Unique identifier for a responsible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResponsibleId(pub Uuid);

impl ResponsibleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ResponsibleId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ResponsibleId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ResponsibleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Responsible {
    pub id: ResponsibleId,
    pub name: String,
    pub email: Option<String>,
    pub user_id: Option<UserId>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewResponsible {
    pub name: String,
    pub email: Option<String>,
    pub user_id: Option<UserId>,
}

#[derive(Debug, Clone, Default)]
pub struct ResponsibleUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub user_id: Option<UserId>,
    pub active: Option<bool>,
}
