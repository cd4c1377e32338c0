//! HTTP handlers
//!
//! Axum request handlers for the API endpoints.

pub mod audit;
pub mod bootstrap;
pub mod dashboard;
pub mod imports;
pub mod lookups;
pub mod parties;
pub mod processes;
pub mod profiles;
pub mod responsibles;
pub mod users;

use std::str::FromStr;

use axum::extract::MatchedPath;

use crate::error::AppError;

pub use audit::list_audit_logs;
pub use bootstrap::bootstrap;
pub use dashboard::get_dashboard;
pub use imports::import_processes;
pub use lookups::{create_lookup, delete_lookup, get_lookup, list_lookups, update_lookup};
pub use parties::{create_party, delete_party, get_party, list_parties, update_party};
pub use processes::{
    create_process, delete_process, get_process, list_processes, update_process,
};
pub use profiles::{
    create_profile, delete_profile, get_profile, grant_permission, list_permissions,
    list_profiles, replace_permissions, revoke_permission, update_profile,
};
pub use responsibles::{
    create_responsible, delete_responsible, get_responsible, list_responsibles,
    update_responsible,
};
pub use users::{create_user, delete_user, get_user, list_users, me, rotate_key, update_user};

/// Resolve a kind from the first segment of the matched route
///
/// `/complainants/:id` yields the complainant kind, `/entry-channels` the
/// entry channel kind, and so on.
fn kind_from_path<K>(path: &MatchedPath) -> Result<K, AppError>
where
    K: FromStr<Err = String>,
{
    let segment = path
        .as_str()
        .trim_start_matches('/')
        .split('/')
        .next()
        .unwrap_or_default();

    K::from_str(segment).map_err(AppError::Internal)
}
