//! Profile and permission handlers
//!
//! Access profiles group permissions; every user has exactly one profile.
//! All writes here invalidate the permission cache (see `AccessService`).

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::domain::entities::{
    Action, AuditAction, Grant, Permission, PermissionId, Profile, ProfileId, ProfileUpdate,
    Resource, User,
};
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListProfilesQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateProfileRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub active: Option<bool>,
}

/// Body of POST /profiles/:id/permissions
#[derive(Debug, Deserialize)]
pub struct GrantRequest {
    pub action: Action,
    pub resource: Resource,
}

/// Body of PUT /profiles/:id/permissions
#[derive(Debug, Deserialize)]
pub struct ReplacePermissionsRequest {
    pub permissions: Vec<Grant>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
    pub created_at: String,
}

impl From<Profile> for ProfileResponse {
    fn from(p: Profile) -> Self {
        Self {
            id: p.id.to_string(),
            name: p.name,
            description: p.description,
            active: p.active,
            created_at: p.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PermissionResponse {
    pub id: String,
    pub profile_id: String,
    pub action: Action,
    pub resource: Resource,
}

impl From<Permission> for PermissionResponse {
    fn from(p: Permission) -> Self {
        Self {
            id: p.id.to_string(),
            profile_id: p.profile_id.to_string(),
            action: p.action,
            resource: p.resource,
        }
    }
}

async fn require(state: &AppState, user: &User, action: Action) -> Result<(), AppError> {
    state
        .access_service
        .authorize(user, action, Resource::Profile)
        .await
}

/// GET /profiles
pub async fn list_profiles(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<ListProfilesQuery>,
) -> Result<Json<Vec<ProfileResponse>>, AppError> {
    require(&state, &user, Action::Read).await?;

    let profiles = state
        .access_service
        .list_profiles(query.include_inactive)
        .await?;

    Ok(Json(profiles.into_iter().map(ProfileResponse::from).collect()))
}

/// GET /profiles/:id
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProfileResponse>, AppError> {
    require(&state, &user, Action::Read).await?;

    let profile = state.access_service.get_profile(&ProfileId(id)).await?;
    Ok(Json(profile.into()))
}

/// POST /profiles
pub async fn create_profile(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateProfileRequest>,
) -> Result<(StatusCode, Json<ProfileResponse>), AppError> {
    require(&state, &user, Action::Create).await?;

    let profile = state
        .access_service
        .create_profile(&request.name, request.description.as_deref())
        .await?;

    state.audit_service.record(
        Some(user.id),
        AuditAction::Create,
        Resource::Profile,
        Some(profile.id.to_string()),
        Some(json!({ "name": profile.name })),
    );

    Ok((StatusCode::CREATED, Json(profile.into())))
}

/// PATCH /profiles/:id
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    require(&state, &user, Action::Update).await?;

    let profile = state
        .access_service
        .update_profile(
            &ProfileId(id),
            ProfileUpdate {
                name: request.name,
                description: request.description,
                active: request.active,
            },
        )
        .await?;

    state.audit_service.record(
        Some(user.id),
        AuditAction::Update,
        Resource::Profile,
        Some(profile.id.to_string()),
        Some(json!({ "name": profile.name, "active": profile.active })),
    );

    Ok(Json(profile.into()))
}

/// DELETE /profiles/:id
pub async fn delete_profile(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    require(&state, &user, Action::Delete).await?;

    state
        .access_service
        .deactivate_profile(&ProfileId(id))
        .await?;

    state.audit_service.record(
        Some(user.id),
        AuditAction::Deactivate,
        Resource::Profile,
        Some(id.to_string()),
        None,
    );

    Ok(StatusCode::NO_CONTENT)
}

/// GET /profiles/:id/permissions
pub async fn list_permissions(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<PermissionResponse>>, AppError> {
    require(&state, &user, Action::Read).await?;

    let permissions = state
        .access_service
        .list_permissions(&ProfileId(id))
        .await?;

    Ok(Json(
        permissions
            .into_iter()
            .map(PermissionResponse::from)
            .collect(),
    ))
}

/// POST /profiles/:id/permissions
pub async fn grant_permission(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(request): Json<GrantRequest>,
) -> Result<(StatusCode, Json<PermissionResponse>), AppError> {
    require(&state, &user, Action::Update).await?;

    let permission = state
        .access_service
        .grant(&ProfileId(id), request.action, request.resource)
        .await?;

    state.audit_service.record(
        Some(user.id),
        AuditAction::Grant,
        Resource::Profile,
        Some(id.to_string()),
        Some(json!({ "action": permission.action, "resource": permission.resource })),
    );

    Ok((StatusCode::CREATED, Json(permission.into())))
}

/// PUT /profiles/:id/permissions
///
/// Replace the whole permission set of a profile.
pub async fn replace_permissions(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(request): Json<ReplacePermissionsRequest>,
) -> Result<Json<Vec<PermissionResponse>>, AppError> {
    require(&state, &user, Action::Update).await?;

    let permissions = state
        .access_service
        .replace_permissions(&ProfileId(id), &request.permissions)
        .await?;

    state.audit_service.record(
        Some(user.id),
        AuditAction::Grant,
        Resource::Profile,
        Some(id.to_string()),
        Some(json!({ "replaced": true, "permissions": request.permissions })),
    );

    Ok(Json(
        permissions
            .into_iter()
            .map(PermissionResponse::from)
            .collect(),
    ))
}

/// DELETE /profiles/:id/permissions/:permission_id
pub async fn revoke_permission(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path((id, permission_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    require(&state, &user, Action::Update).await?;

    let permission = state
        .access_service
        .revoke(&ProfileId(id), &PermissionId(permission_id))
        .await?;

    state.audit_service.record(
        Some(user.id),
        AuditAction::Revoke,
        Resource::Profile,
        Some(id.to_string()),
        Some(json!({ "action": permission.action, "resource": permission.resource })),
    );

    Ok(StatusCode::NO_CONTENT)
}
