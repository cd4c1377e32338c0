//! Audit log domain entity
//!
//! Append-only record of write operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::permission::Resource;
use super::user::UserId;

/// Unique identifier for an audit entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuditLogId(pub Uuid);

impl From<Uuid> for AuditLogId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for AuditLogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What happened, as recorded in the trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    Deactivate,
    Import,
    Grant,
    Revoke,
    RotateKey,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditAction::Create => write!(f, "create"),
            AuditAction::Update => write!(f, "update"),
            AuditAction::Deactivate => write!(f, "deactivate"),
            AuditAction::Import => write!(f, "import"),
            AuditAction::Grant => write!(f, "grant"),
            AuditAction::Revoke => write!(f, "revoke"),
            AuditAction::RotateKey => write!(f, "rotate_key"),
        }
    }
}

impl std::str::FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(AuditAction::Create),
            "update" => Ok(AuditAction::Update),
            "deactivate" => Ok(AuditAction::Deactivate),
            "import" => Ok(AuditAction::Import),
            "grant" => Ok(AuditAction::Grant),
            "revoke" => Ok(AuditAction::Revoke),
            "rotate_key" => Ok(AuditAction::RotateKey),
            _ => Err(format!("Unknown audit action: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditLog {
    pub id: AuditLogId,
    pub user_id: Option<UserId>,
    pub action: AuditAction,
    pub resource: Resource,
    pub resource_id: Option<String>,
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAuditLog {
    pub user_id: Option<UserId>,
    pub action: AuditAction,
    pub resource: Resource,
    pub resource_id: Option<String>,
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub user_id: Option<UserId>,
    pub resource: Option<Resource>,
    pub limit: i64,
    pub offset: i64,
}
