//! Application layer
//!
//! Contains use cases and service orchestration.
//! Services coordinate between domain entities and repository ports.

pub mod access_service;
pub mod audit_service;
pub mod csv_import;
pub mod dashboard_service;
pub mod import_service;
pub mod permission_cache;
pub mod process_service;
pub mod registry_service;
pub mod validation;

pub use access_service::{hash_api_key, AccessService};
pub use audit_service::AuditService;
pub use dashboard_service::DashboardService;
pub use import_service::ImportService;
pub use permission_cache::PermissionCache;
pub use process_service::ProcessService;
pub use registry_service::RegistryService;
