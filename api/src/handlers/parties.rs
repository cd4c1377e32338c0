//! Party handlers
//!
//! Complainants and controllers share one set of handlers; the kind comes
//! from the route (`/complainants` or `/controllers`).

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
    Action, AuditAction, NewParty, Party, PartyId, PartyKind, PartyUpdate, Resource, User,
};
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListPartiesQuery {
    /// Substring of the name
    pub search: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePartyRequest {
    pub name: String,
    /// CPF or CNPJ, with or without punctuation
    pub document: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePartyRequest {
    pub name: Option<String>,
    pub document: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct PartyResponse {
    pub id: String,
    pub kind: PartyKind,
    pub name: String,
    pub document: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Party> for PartyResponse {
    fn from(p: Party) -> Self {
        Self {
            id: p.id.to_string(),
            kind: p.kind,
            name: p.name,
            document: p.document,
            email: p.email,
            phone: p.phone,
            active: p.active,
            created_at: p.created_at.to_rfc3339(),
            updated_at: p.updated_at.to_rfc3339(),
        }
    }
}

fn resource_for(kind: PartyKind) -> Resource {
    match kind {
        PartyKind::Complainant => Resource::Complainant,
        PartyKind::Controller => Resource::Controller,
    }
}

/// GET /complainants, GET /controllers
pub async fn list_parties(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    path: MatchedPath,
    Query(query): Query<ListPartiesQuery>,
) -> Result<Json<Vec<PartyResponse>>, AppError> {
    let kind: PartyKind = kind_from_path(&path)?;
    state
        .access_service
        .authorize(&user, Action::Read, resource_for(kind))
        .await?;

    let parties = state
        .registry_service
        .list_parties(
            kind,
            query.search.as_deref(),
            query.include_inactive,
            query.limit,
            query.offset,
        )
        .await?;

    Ok(Json(parties.into_iter().map(PartyResponse::from).collect()))
}

/// GET /complainants/:id, GET /controllers/:id
pub async fn get_party(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    path: MatchedPath,
    Path(id): Path<Uuid>,
) -> Result<Json<PartyResponse>, AppError> {
    let kind: PartyKind = kind_from_path(&path)?;
    state
        .access_service
        .authorize(&user, Action::Read, resource_for(kind))
        .await?;

    let party = state.registry_service.get_party(kind, &PartyId(id)).await?;
    Ok(Json(party.into()))
}

/// POST /complainants, POST /controllers
pub async fn create_party(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    path: MatchedPath,
    Json(request): Json<CreatePartyRequest>,
) -> Result<(StatusCode, Json<PartyResponse>), AppError> {
    let kind: PartyKind = kind_from_path(&path)?;
    let resource = resource_for(kind);
    state
        .access_service
        .authorize(&user, Action::Create, resource)
        .await?;

    let party = state
        .registry_service
        .create_party(NewParty {
            kind,
            name: request.name,
            document: request.document,
            email: request.email,
            phone: request.phone,
        })
        .await?;

    state.audit_service.record(
        Some(user.id),
        AuditAction::Create,
        resource,
        Some(party.id.to_string()),
        Some(json!({ "name": party.name })),
    );

    Ok((StatusCode::CREATED, Json(party.into())))
}

/// PATCH /complainants/:id, PATCH /controllers/:id
pub async fn update_party(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    path: MatchedPath,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdatePartyRequest>,
) -> Result<Json<PartyResponse>, AppError> {
    let kind: PartyKind = kind_from_path(&path)?;
    let resource = resource_for(kind);
    state
        .access_service
        .authorize(&user, Action::Update, resource)
        .await?;

    let party = state
        .registry_service
        .update_party(
            kind,
            &PartyId(id),
            PartyUpdate {
                name: request.name,
                document: request.document,
                email: request.email,
                phone: request.phone,
                active: request.active,
            },
        )
        .await?;

    state.audit_service.record(
        Some(user.id),
        AuditAction::Update,
        resource,
        Some(party.id.to_string()),
        Some(json!({ "name": party.name, "active": party.active })),
    );

    Ok(Json(party.into()))
}

/// DELETE /complainants/:id, DELETE /controllers/:id
pub async fn delete_party(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    path: MatchedPath,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let kind: PartyKind = kind_from_path(&path)?;
    let resource = resource_for(kind);
    state
        .access_service
        .authorize(&user, Action::Delete, resource)
        .await?;

    state
        .registry_service
        .deactivate_party(kind, &PartyId(id))
        .await?;

    state.audit_service.record(
        Some(user.id),
        AuditAction::Deactivate,
        resource,
        Some(id.to_string()),
        None,
    );

    Ok(StatusCode::NO_CONTENT)
}
