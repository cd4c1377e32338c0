//! Adapters layer
//!
//! Implementations of port traits for external systems.

pub mod postgres;

pub use postgres::{
    PostgresAuditLogRepository, PostgresLookupRepository, PostgresPartyRepository,
    PostgresPermissionRepository, PostgresProcessImportRepository, PostgresProcessRepository,
    PostgresProfileRepository, PostgresResponsibleRepository, PostgresUserRepository,
};
