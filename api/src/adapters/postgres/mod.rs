//! PostgreSQL adapters
//!
//! Implementations of repository traits using SeaORM and PostgreSQL.

pub mod audit_log_repo;
pub mod import_repo;
pub mod lookup_repo;
pub mod party_repo;
pub mod permission_repo;
pub mod process_repo;
pub mod profile_repo;
pub mod responsible_repo;
pub mod user_repo;


use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::ColumnTrait;

pub use audit_log_repo::PostgresAuditLogRepository;
pub use import_repo::PostgresProcessImportRepository;
pub use lookup_repo::PostgresLookupRepository;
pub use party_repo::PostgresPartyRepository;
pub use permission_repo::PostgresPermissionRepository;
pub use process_repo::PostgresProcessRepository;
pub use profile_repo::PostgresProfileRepository;
pub use responsible_repo::PostgresResponsibleRepository;
pub use user_repo::PostgresUserRepository;

/// `LOWER(column) = lower(value)`
fn lower_eq<C>(column: C, value: &str) -> SimpleExpr
where
    C: ColumnTrait + 'static,
{
    Expr::expr(Func::lower(Expr::col(column))).eq(value.trim().to_lowercase())
}

/// `LOWER(column) LIKE '%value%'`, case-insensitive substring match
fn lower_contains<C>(column: C, value: &str) -> SimpleExpr
where
    C: ColumnTrait + 'static,
{
    Expr::expr(Func::lower(Expr::col(column))).like(contains_pattern(value))
}

/// Lowercased `%value%` with LIKE wildcards in `value` escaped
fn contains_pattern(value: &str) -> String {
    let escaped = value
        .trim()
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}
