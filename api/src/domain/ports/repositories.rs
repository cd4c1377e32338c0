//! Repository port traits
//!
//! These traits define the interface for data persistence.
//! Implementations are provided by adapters (e.g., PostgreSQL).

use async_trait::async_trait;

use crate::domain::entities::{
    AuditFilter, AuditLog, ImportOutcome, ImportRow, Lookup, LookupId, LookupKind, LookupUpdate,
    NewAuditLog, NewLookup, NewParty, NewPermission, NewProcess, NewProfile, NewResponsible,
    NewUser, Party, PartyId, PartyKind, PartyUpdate, Permission, PermissionId, Process,
    ProcessFilter, ProcessId, ProcessUpdate, Profile, ProfileId, ProfileUpdate, ReportRow,
    Responsible, ResponsibleId, ResponsibleUpdate, User, UserId, UserUpdate,
};
use crate::error::DomainError;

/// Repository for Process entities
#[async_trait]
pub trait ProcessRepository: Send + Sync {
    /// Find a process by ID
    async fn find_by_id(&self, id: &ProcessId) -> Result<Option<Process>, DomainError>;

    /// Find a process by its (normalized) number
    async fn find_by_number(&self, number: &str) -> Result<Option<Process>, DomainError>;

    /// List processes matching a filter, newest first, with the total match count
    async fn list(&self, filter: &ProcessFilter) -> Result<(Vec<Process>, u64), DomainError>;

    /// Create a new process
    async fn create(&self, process: &NewProcess) -> Result<Process, DomainError>;

    /// Apply a partial update
    async fn update(&self, id: &ProcessId, update: &ProcessUpdate)
        -> Result<Process, DomainError>;

    /// Soft delete
    async fn deactivate(&self, id: &ProcessId) -> Result<(), DomainError>;

    /// Projection of every process for dashboard aggregation
    async fn report_rows(&self) -> Result<Vec<ReportRow>, DomainError>;
}

/// Repository for complainants and controllers
#[async_trait]
pub trait PartyRepository: Send + Sync {
    async fn find_by_id(&self, id: &PartyId) -> Result<Option<Party>, DomainError>;

    /// Case-insensitive exact name match within a kind
    async fn find_by_name(&self, kind: PartyKind, name: &str)
        -> Result<Option<Party>, DomainError>;

    async fn list(
        &self,
        kind: PartyKind,
        search: Option<&str>,
        include_inactive: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Party>, DomainError>;

    async fn create(&self, party: &NewParty) -> Result<Party, DomainError>;

    async fn update(&self, id: &PartyId, update: &PartyUpdate) -> Result<Party, DomainError>;

    async fn deactivate(&self, id: &PartyId) -> Result<(), DomainError>;
}

/// Repository for label tables (entry channel, situation, referral)
#[async_trait]
pub trait LookupRepository: Send + Sync {
    async fn find_by_id(&self, id: &LookupId) -> Result<Option<Lookup>, DomainError>;

    /// Case-insensitive exact name match within a kind
    async fn find_by_name(&self, kind: LookupKind, name: &str)
        -> Result<Option<Lookup>, DomainError>;

    async fn list(&self, kind: LookupKind, include_inactive: bool)
        -> Result<Vec<Lookup>, DomainError>;

    async fn create(&self, lookup: &NewLookup) -> Result<Lookup, DomainError>;

    async fn update(&self, id: &LookupId, update: &LookupUpdate) -> Result<Lookup, DomainError>;

    async fn deactivate(&self, id: &LookupId) -> Result<(), DomainError>;
}

/// Repository for Responsible entities
#[async_trait]
pub trait ResponsibleRepository: Send + Sync {
    async fn find_by_id(&self, id: &ResponsibleId) -> Result<Option<Responsible>, DomainError>;

    /// Case-insensitive exact name match
    async fn find_by_name(&self, name: &str) -> Result<Option<Responsible>, DomainError>;

    async fn list(&self, include_inactive: bool) -> Result<Vec<Responsible>, DomainError>;

    async fn create(&self, responsible: &NewResponsible) -> Result<Responsible, DomainError>;

    async fn update(
        &self,
        id: &ResponsibleId,
        update: &ResponsibleUpdate,
    ) -> Result<Responsible, DomainError>;

    async fn deactivate(&self, id: &ResponsibleId) -> Result<(), DomainError>;
}

/// Repository for Profile entities
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn find_by_id(&self, id: &ProfileId) -> Result<Option<Profile>, DomainError>;

    async fn find_by_name(&self, name: &str) -> Result<Option<Profile>, DomainError>;

    async fn list(&self, include_inactive: bool) -> Result<Vec<Profile>, DomainError>;

    async fn create(&self, profile: &NewProfile) -> Result<Profile, DomainError>;

    async fn update(&self, id: &ProfileId, update: &ProfileUpdate)
        -> Result<Profile, DomainError>;

    async fn deactivate(&self, id: &ProfileId) -> Result<(), DomainError>;
}

/// Repository for Permission rows
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    async fn find_by_id(&self, id: &PermissionId) -> Result<Option<Permission>, DomainError>;

    async fn list_for_profile(&self, profile_id: &ProfileId)
        -> Result<Vec<Permission>, DomainError>;

    /// Fails with `AlreadyExists` when the tuple is already granted
    async fn create(&self, permission: &NewPermission) -> Result<Permission, DomainError>;

    async fn delete(&self, id: &PermissionId) -> Result<(), DomainError>;

    /// Atomically replace every permission of a profile
    async fn replace_for_profile(
        &self,
        profile_id: &ProfileId,
        permissions: &[NewPermission],
    ) -> Result<Vec<Permission>, DomainError>;
}

/// Repository for User entities
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;

    async fn find_by_api_key_hash(&self, hash: &str) -> Result<Option<User>, DomainError>;

    async fn list(
        &self,
        include_inactive: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<User>, DomainError>;

    async fn count(&self) -> Result<u64, DomainError>;

    async fn create(&self, user: &NewUser) -> Result<User, DomainError>;

    async fn update(&self, id: &UserId, update: &UserUpdate) -> Result<User, DomainError>;

    async fn update_api_key_hash(&self, id: &UserId, hash: &str) -> Result<(), DomainError>;

    async fn update_last_seen(&self, id: &UserId) -> Result<(), DomainError>;

    async fn deactivate(&self, id: &UserId) -> Result<(), DomainError>;
}

/// Repository for the audit trail
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    async fn create(&self, entry: &NewAuditLog) -> Result<AuditLog, DomainError>;

    async fn list(&self, filter: &AuditFilter) -> Result<Vec<AuditLog>, DomainError>;
}

/// Writes one imported spreadsheet row
///
/// Implementations resolve every name in the row to a foreign key
/// (creating missing rows), check the process number for duplicates and
/// insert the process as a single unit: either everything is written or
/// nothing is.
#[async_trait]
pub trait ProcessImportRepository: Send + Sync {
    async fn import_row(&self, row: &ImportRow) -> Result<ImportOutcome, DomainError>;
}
