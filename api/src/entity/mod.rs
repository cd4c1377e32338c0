//! SeaORM entities
//!
//! Table models mirroring `migrations/`. Adapters convert these into the
//! domain types in `crate::domain::entities`.

pub mod audit_logs;
pub mod lookups;
pub mod parties;
pub mod permissions;
pub mod processes;
pub mod profiles;
pub mod responsibles;
pub mod users;
