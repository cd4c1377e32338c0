//! Permission domain entity
//!
//! A permission grants one action on one resource to a profile.
//! `(profile, action, resource)` is unique.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::profile::ProfileId;

/// Unique identifier for a permission row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionId(pub Uuid);

impl PermissionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PermissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for PermissionId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for PermissionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Operation a permission allows. `Manage` implies every other action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
    Import,
    Manage,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Create => write!(f, "create"),
            Action::Read => write!(f, "read"),
            Action::Update => write!(f, "update"),
            Action::Delete => write!(f, "delete"),
            Action::Import => write!(f, "import"),
            Action::Manage => write!(f, "manage"),
        }
    }
}

impl std::str::FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "create" => Ok(Action::Create),
            "read" => Ok(Action::Read),
            "update" => Ok(Action::Update),
            "delete" => Ok(Action::Delete),
            "import" => Ok(Action::Import),
            "manage" => Ok(Action::Manage),
            _ => Err(format!("Unknown action: {}", s)),
        }
    }
}

/// What a permission applies to. `All` is the `*` wildcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resource {
    #[serde(rename = "process")]
    Process,
    #[serde(rename = "complainant")]
    Complainant,
    #[serde(rename = "controller")]
    Controller,
    #[serde(rename = "responsible")]
    Responsible,
    #[serde(rename = "lookup")]
    Lookup,
    #[serde(rename = "profile")]
    Profile,
    #[serde(rename = "user")]
    User,
    #[serde(rename = "audit_log")]
    AuditLog,
    #[serde(rename = "dashboard")]
    Dashboard,
    #[serde(rename = "*")]
    All,
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Resource::Process => "process",
            Resource::Complainant => "complainant",
            Resource::Controller => "controller",
            Resource::Responsible => "responsible",
            Resource::Lookup => "lookup",
            Resource::Profile => "profile",
            Resource::User => "user",
            Resource::AuditLog => "audit_log",
            Resource::Dashboard => "dashboard",
            Resource::All => "*",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for Resource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "process" => Ok(Resource::Process),
            "complainant" => Ok(Resource::Complainant),
            "controller" => Ok(Resource::Controller),
            "responsible" => Ok(Resource::Responsible),
            "lookup" => Ok(Resource::Lookup),
            "profile" => Ok(Resource::Profile),
            "user" => Ok(Resource::User),
            "audit_log" => Ok(Resource::AuditLog),
            "dashboard" => Ok(Resource::Dashboard),
            "*" => Ok(Resource::All),
            _ => Err(format!("Unknown resource: {}", s)),
        }
    }
}

/// An `(action, resource)` pair, the unit the authorizer matches on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grant {
    pub action: Action,
    pub resource: Resource,
}

impl Grant {
    pub fn new(action: Action, resource: Resource) -> Self {
        Self { action, resource }
    }

    /// Whether this grant covers `action` on `resource`
    pub fn allows(&self, action: Action, resource: Resource) -> bool {
        let action_ok = self.action == Action::Manage || self.action == action;
        let resource_ok = self.resource == Resource::All || self.resource == resource;
        action_ok && resource_ok
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Permission {
    pub id: PermissionId,
    pub profile_id: ProfileId,
    pub action: Action,
    pub resource: Resource,
    pub created_at: DateTime<Utc>,
}

impl Permission {
    pub fn grant(&self) -> Grant {
        Grant::new(self.action, self.resource)
    }
}

#[derive(Debug, Clone)]
pub struct NewPermission {
    pub profile_id: ProfileId,
    pub action: Action,
    pub resource: Resource,
}
