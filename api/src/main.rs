//! LGPD Tracker API Server
//!
//! Case management for data-protection complaints and inspection processes:
//! processes, the parties involved, access profiles and a CSV import of the
//! legacy spreadsheet. Uses hexagonal (ports & adapters) architecture.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use sea_orm::Database;
use serde::Serialize;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;
use tower_governor::GovernorLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod adapters;
mod app;
mod auth;
mod config;
mod domain;
mod entity;
mod error;
mod handlers;

#[cfg(test)]
mod test_utils;

#[cfg(test)]
mod integration_tests;

use adapters::{
    PostgresAuditLogRepository, PostgresLookupRepository, PostgresPartyRepository,
    PostgresPermissionRepository, PostgresProcessImportRepository, PostgresProcessRepository,
    PostgresProfileRepository, PostgresResponsibleRepository, PostgresUserRepository,
};
use app::{
    AccessService, AuditService, DashboardService, ImportService, PermissionCache,
    ProcessService, RegistryService,
};
use config::Config;
use domain::ports::{
    AuditLogRepository, LookupRepository, PartyRepository, PermissionRepository,
    ProcessImportRepository, ProcessRepository, ProfileRepository, ResponsibleRepository,
    UserRepository,
};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub process_service: Arc<ProcessService>,
    pub registry_service: Arc<RegistryService>,
    pub access_service: Arc<AccessService>,
    pub import_service: Arc<ImportService>,
    pub dashboard_service: Arc<DashboardService>,
    pub audit_service: Arc<AuditService>,
    pub config: Config,
}

/// Every storage port the services need
pub struct Repositories {
    pub processes: Arc<dyn ProcessRepository>,
    pub parties: Arc<dyn PartyRepository>,
    pub lookups: Arc<dyn LookupRepository>,
    pub responsibles: Arc<dyn ResponsibleRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub permissions: Arc<dyn PermissionRepository>,
    pub users: Arc<dyn UserRepository>,
    pub audit_logs: Arc<dyn AuditLogRepository>,
    pub importer: Arc<dyn ProcessImportRepository>,
}

impl AppState {
    /// Wire the application services on top of a set of repositories
    pub fn new(repos: Repositories, config: Config) -> Self {
        let process_service = Arc::new(ProcessService::new(
            repos.processes.clone(),
            repos.parties.clone(),
            repos.lookups.clone(),
            repos.responsibles.clone(),
        ));

        let registry_service = Arc::new(RegistryService::new(
            repos.parties.clone(),
            repos.lookups.clone(),
            repos.responsibles.clone(),
            repos.users.clone(),
        ));

        let access_service = Arc::new(AccessService::new(
            repos.profiles.clone(),
            repos.permissions.clone(),
            repos.users.clone(),
            PermissionCache::new(config.permission_cache_ttl),
            config.allowed_email_domain.clone(),
            config.bootstrap_token.clone(),
        ));

        let import_service = Arc::new(ImportService::new(
            repos.importer.clone(),
            repos.processes.clone(),
        ));

        let dashboard_service = Arc::new(DashboardService::new(
            repos.processes.clone(),
            repos.lookups.clone(),
            repos.responsibles.clone(),
        ));

        let audit_service = Arc::new(AuditService::new(repos.audit_logs.clone()));

        Self {
            process_service,
            registry_service,
            access_service,
            import_service,
            dashboard_service,
            audit_service,
            config,
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Build the full router
///
/// `public` carries the unauthenticated routes that need their own layers
/// (the rate-limited `/bootstrap`); tests pass them without the limiter
/// because the governor needs the peer address of a real connection.
pub fn build_router(state: AppState, public: Router<AppState>) -> Router {
    let import_limit = DefaultBodyLimit::max(state.config.import_max_bytes);

    let protected = Router::new()
        .route("/me", get(handlers::me))
        // Processes
        .route(
            "/processes",
            get(handlers::list_processes).post(handlers::create_process),
        )
        .route(
            "/processes/import",
            post(handlers::import_processes).layer(import_limit),
        )
        .route(
            "/processes/:id",
            get(handlers::get_process)
                .patch(handlers::update_process)
                .delete(handlers::delete_process),
        )
        // Parties (kind taken from the first path segment)
        .route(
            "/complainants",
            get(handlers::list_parties).post(handlers::create_party),
        )
        .route(
            "/complainants/:id",
            get(handlers::get_party)
                .patch(handlers::update_party)
                .delete(handlers::delete_party),
        )
        .route(
            "/controllers",
            get(handlers::list_parties).post(handlers::create_party),
        )
        .route(
            "/controllers/:id",
            get(handlers::get_party)
                .patch(handlers::update_party)
                .delete(handlers::delete_party),
        )
        // Lookups (kind taken from the first path segment)
        .route(
            "/entry-channels",
            get(handlers::list_lookups).post(handlers::create_lookup),
        )
        .route(
            "/entry-channels/:id",
            get(handlers::get_lookup)
                .patch(handlers::update_lookup)
                .delete(handlers::delete_lookup),
        )
        .route(
            "/situations",
            get(handlers::list_lookups).post(handlers::create_lookup),
        )
        .route(
            "/situations/:id",
            get(handlers::get_lookup)
                .patch(handlers::update_lookup)
                .delete(handlers::delete_lookup),
        )
        .route(
            "/referrals",
            get(handlers::list_lookups).post(handlers::create_lookup),
        )
        .route(
            "/referrals/:id",
            get(handlers::get_lookup)
                .patch(handlers::update_lookup)
                .delete(handlers::delete_lookup),
        )
        // Responsibles
        .route(
            "/responsibles",
            get(handlers::list_responsibles).post(handlers::create_responsible),
        )
        .route(
            "/responsibles/:id",
            get(handlers::get_responsible)
                .patch(handlers::update_responsible)
                .delete(handlers::delete_responsible),
        )
        // Access control
        .route(
            "/profiles",
            get(handlers::list_profiles).post(handlers::create_profile),
        )
        .route(
            "/profiles/:id",
            get(handlers::get_profile)
                .patch(handlers::update_profile)
                .delete(handlers::delete_profile),
        )
        .route(
            "/profiles/:id/permissions",
            get(handlers::list_permissions)
                .post(handlers::grant_permission)
                .put(handlers::replace_permissions),
        )
        .route(
            "/profiles/:id/permissions/:permission_id",
            delete(handlers::revoke_permission),
        )
        .route(
            "/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route(
            "/users/:id",
            get(handlers::get_user)
                .patch(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .route("/users/:id/rotate-key", post(handlers::rotate_key))
        // Reporting
        .route("/audit-logs", get(handlers::list_audit_logs))
        .route("/dashboard", get(handlers::get_dashboard))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    Router::new()
        // Health check (no auth)
        .route("/health", get(health))
        .merge(public)
        .merge(protected)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,lgpd_tracker_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting LGPD Tracker API...");

    let config = Config::from_env()?;

    // Connect to PostgreSQL
    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    let repos = Repositories {
        processes: Arc::new(PostgresProcessRepository::new(db.clone())),
        parties: Arc::new(PostgresPartyRepository::new(db.clone())),
        lookups: Arc::new(PostgresLookupRepository::new(db.clone())),
        responsibles: Arc::new(PostgresResponsibleRepository::new(db.clone())),
        profiles: Arc::new(PostgresProfileRepository::new(db.clone())),
        permissions: Arc::new(PostgresPermissionRepository::new(db.clone())),
        users: Arc::new(PostgresUserRepository::new(db.clone())),
        audit_logs: Arc::new(PostgresAuditLogRepository::new(db.clone())),
        importer: Arc::new(PostgresProcessImportRepository::new(db.clone())),
    };

    if config.bootstrap_token.is_none() {
        tracing::info!("BOOTSTRAP_TOKEN not set, /bootstrap is disabled");
    }

    let port = config.port;
    let state = AppState::new(repos, config);

    // Rate limiting config: 2 req/sec sustained, burst of 5
    // Uses PeerIpKeyExtractor to get client IP from socket connection
    // (SmartIpKeyExtractor requires X-Forwarded-For headers from reverse proxy)
    let governor_config = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(PeerIpKeyExtractor)
            .per_second(2)
            .burst_size(5)
            .finish()
            .context("Failed to build governor config")?,
    );

    let rate_limited_routes = Router::new()
        .route("/bootstrap", post(handlers::bootstrap))
        .layer(GovernorLayer {
            config: governor_config,
        });

    let app = build_router(state, rate_limited_routes);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}
