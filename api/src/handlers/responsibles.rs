//! Responsible handlers
//!
//! Staff members processes are assigned to.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::domain::entities::{
    Action, AuditAction, NewResponsible, Resource, Responsible, ResponsibleId, ResponsibleUpdate,
    User, UserId,
};
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListResponsiblesQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateResponsibleRequest {
    pub name: String,
    pub email: Option<String>,
    /// Optional link to the user account of this person
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateResponsibleRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub user_id: Option<Uuid>,
    pub active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ResponsibleResponse {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub user_id: Option<String>,
    pub active: bool,
    pub created_at: String,
}

impl From<Responsible> for ResponsibleResponse {
    fn from(r: Responsible) -> Self {
        Self {
            id: r.id.to_string(),
            name: r.name,
            email: r.email,
            user_id: r.user_id.map(|id| id.to_string()),
            active: r.active,
            created_at: r.created_at.to_rfc3339(),
        }
    }
}

/// GET /responsibles
pub async fn list_responsibles(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<ListResponsiblesQuery>,
) -> Result<Json<Vec<ResponsibleResponse>>, AppError> {
    state
        .access_service
        .authorize(&user, Action::Read, Resource::Responsible)
        .await?;

    let responsibles = state
        .registry_service
        .list_responsibles(query.include_inactive)
        .await?;

    Ok(Json(
        responsibles
            .into_iter()
            .map(ResponsibleResponse::from)
            .collect(),
    ))
}

/// GET /responsibles/:id
pub async fn get_responsible(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResponsibleResponse>, AppError> {
    state
        .access_service
        .authorize(&user, Action::Read, Resource::Responsible)
        .await?;

    let responsible = state
        .registry_service
        .get_responsible(&ResponsibleId(id))
        .await?;
    Ok(Json(responsible.into()))
}

/// POST /responsibles
pub async fn create_responsible(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateResponsibleRequest>,
) -> Result<(StatusCode, Json<ResponsibleResponse>), AppError> {
    state
        .access_service
        .authorize(&user, Action::Create, Resource::Responsible)
        .await?;

    let responsible = state
        .registry_service
        .create_responsible(NewResponsible {
            name: request.name,
            email: request.email,
            user_id: request.user_id.map(UserId),
        })
        .await?;

    state.audit_service.record(
        Some(user.id),
        AuditAction::Create,
        Resource::Responsible,
        Some(responsible.id.to_string()),
        Some(json!({ "name": responsible.name })),
    );

    Ok((StatusCode::CREATED, Json(responsible.into())))
}

/// PATCH /responsibles/:id
pub async fn update_responsible(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateResponsibleRequest>,
) -> Result<Json<ResponsibleResponse>, AppError> {
    state
        .access_service
        .authorize(&user, Action::Update, Resource::Responsible)
        .await?;

    let responsible = state
        .registry_service
        .update_responsible(
            &ResponsibleId(id),
            ResponsibleUpdate {
                name: request.name,
                email: request.email,
                user_id: request.user_id.map(UserId),
                active: request.active,
            },
        )
        .await?;

    state.audit_service.record(
        Some(user.id),
        AuditAction::Update,
        Resource::Responsible,
        Some(responsible.id.to_string()),
        Some(json!({ "name": responsible.name, "active": responsible.active })),
    );

    Ok(Json(responsible.into()))
}

/// DELETE /responsibles/:id
pub async fn delete_responsible(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .access_service
        .authorize(&user, Action::Delete, Resource::Responsible)
        .await?;

    state
        .registry_service
        .deactivate_responsible(&ResponsibleId(id))
        .await?;

    state.audit_service.record(
        Some(user.id),
        AuditAction::Deactivate,
        Resource::Responsible,
        Some(id.to_string()),
        None,
    );

    Ok(StatusCode::NO_CONTENT)
}
