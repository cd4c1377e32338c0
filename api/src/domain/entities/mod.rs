//! Domain entities
//!
//! Pure domain models representing core business concepts.
//! These are separate from the SeaORM entities in the `entity` module.

pub mod audit_log;
pub mod dashboard;
pub mod import;
pub mod lookup;
pub mod party;
pub mod permission;
pub mod process;
pub mod profile;
pub mod responsible;
pub mod user;

pub use audit_log::{AuditAction, AuditFilter, AuditLog, AuditLogId, NewAuditLog};
pub use dashboard::{CountBucket, DashboardSummary, MonthBucket, ReportRow, UNASSIGNED_LABEL};
pub use import::{ImportOutcome, ImportReport, ImportRow, ImportRowError};
pub use lookup::{Lookup, LookupId, LookupKind, LookupUpdate, NewLookup};
pub use party::{normalize_document, NewParty, Party, PartyId, PartyKind, PartyUpdate};
pub use permission::{Action, Grant, NewPermission, Permission, PermissionId, Resource};
pub use process::{
    normalize_process_number, validate_dates, NewProcess, Process, ProcessFilter, ProcessId,
    ProcessUpdate,
};
pub use profile::{NewProfile, Profile, ProfileId, ProfileUpdate};
pub use responsible::{NewResponsible, Responsible, ResponsibleId, ResponsibleUpdate};
pub use user::{NewUser, User, UserId, UserUpdate};
