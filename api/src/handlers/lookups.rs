//! Lookup handlers
//!
//! Entry channels, situations and referrals. The kind comes from the route.

use axum::{
    extract::{MatchedPath, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::kind_from_path;
use crate::domain::entities::{
    Action, AuditAction, Lookup, LookupId, LookupKind, LookupUpdate, Resource, User,
};
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListLookupsQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateLookupRequest {
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateLookupRequest {
    pub name: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct LookupResponse {
    pub id: String,
    pub kind: LookupKind,
    pub name: String,
    pub active: bool,
}

impl From<Lookup> for LookupResponse {
    fn from(l: Lookup) -> Self {
        Self {
            id: l.id.to_string(),
            kind: l.kind,
            name: l.name,
            active: l.active,
        }
    }
}

pub async fn list_lookups(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    path: MatchedPath,
    Query(query): Query<ListLookupsQuery>,
) -> Result<Json<Vec<LookupResponse>>, AppError> {
    let kind: LookupKind = kind_from_path(&path)?;
    state
        .access_service
        .authorize(&user, Action::Read, Resource::Lookup)
        .await?;

    let lookups = state
        .registry_service
        .list_lookups(kind, query.include_inactive)
        .await?;

    Ok(Json(lookups.into_iter().map(LookupResponse::from).collect()))
}

pub async fn get_lookup(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    path: MatchedPath,
    Path(id): Path<Uuid>,
) -> Result<Json<LookupResponse>, AppError> {
    let kind: LookupKind = kind_from_path(&path)?;
    state
        .access_service
        .authorize(&user, Action::Read, Resource::Lookup)
        .await?;

    let lookup = state.registry_service.get_lookup(kind, &LookupId(id)).await?;
    Ok(Json(lookup.into()))
}

pub async fn create_lookup(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    path: MatchedPath,
    Json(request): Json<CreateLookupRequest>,
) -> Result<(StatusCode, Json<LookupResponse>), AppError> {
    let kind: LookupKind = kind_from_path(&path)?;
    state
        .access_service
        .authorize(&user, Action::Create, Resource::Lookup)
        .await?;

    let lookup = state
        .registry_service
        .create_lookup(kind, &request.name)
        .await?;

    state.audit_service.record(
        Some(user.id),
        AuditAction::Create,
        Resource::Lookup,
        Some(lookup.id.to_string()),
        Some(json!({ "kind": kind, "name": lookup.name })),
    );

    Ok((StatusCode::CREATED, Json(lookup.into())))
}

pub async fn update_lookup(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    path: MatchedPath,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateLookupRequest>,
) -> Result<Json<LookupResponse>, AppError> {
    let kind: LookupKind = kind_from_path(&path)?;
    state
        .access_service
        .authorize(&user, Action::Update, Resource::Lookup)
        .await?;

    let lookup = state
        .registry_service
        .update_lookup(
            kind,
            &LookupId(id),
            LookupUpdate {
                name: request.name,
                active: request.active,
            },
        )
        .await?;

    state.audit_service.record(
        Some(user.id),
        AuditAction::Update,
        Resource::Lookup,
        Some(lookup.id.to_string()),
        Some(json!({ "kind": kind, "name": lookup.name, "active": lookup.active })),
    );

    Ok(Json(lookup.into()))
}

pub async fn delete_lookup(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    path: MatchedPath,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let kind: LookupKind = kind_from_path(&path)?;
    state
        .access_service
        .authorize(&user, Action::Delete, Resource::Lookup)
        .await?;

    state
        .registry_service
        .deactivate_lookup(kind, &LookupId(id))
        .await?;

    state.audit_service.record(
        Some(user.id),
        AuditAction::Deactivate,
        Resource::Lookup,
        Some(id.to_string()),
        Some(json!({ "kind": kind })),
    );

    Ok(StatusCode::NO_CONTENT)
}
