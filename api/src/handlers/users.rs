//! User handlers
//!
//! User administration, API key rotation and the `/me` endpoint.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::domain::entities::{
    Action, AuditAction, Grant, ProfileId, Resource, User, UserId, UserUpdate,
};
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    #[serde(default)]
    pub include_inactive: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub profile_id: Uuid,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub profile_id: Option<Uuid>,
    pub active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub profile_id: String,
    pub active: bool,
    pub last_seen_at: Option<String>,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id.to_string(),
            name: u.name,
            email: u.email,
            profile_id: u.profile_id.to_string(),
            active: u.active,
            last_seen_at: u.last_seen_at.map(|t| t.to_rfc3339()),
            created_at: u.created_at.to_rfc3339(),
        }
    }
}

/// A user together with a freshly issued API key
///
/// The key is only ever returned here; the server stores its hash.
#[derive(Debug, Serialize)]
pub struct UserWithKeyResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    /// API key for calls (Authorization: Bearer <api_key>)
    pub api_key: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub permissions: Vec<Grant>,
}

/// GET /me
///
/// The authenticated user and its effective permissions.
pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<MeResponse>, AppError> {
    let grants = state.access_service.grants_for(&user).await?;

    let mut permissions: Vec<Grant> = grants.iter().copied().collect();
    permissions.sort_by_key(|g| (g.action.to_string(), g.resource.to_string()));

    Ok(Json(MeResponse {
        user: user.into(),
        permissions,
    }))
}

/// GET /users
pub async fn list_users(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    state
        .access_service
        .authorize(&user, Action::Read, Resource::User)
        .await?;

    let users = state
        .access_service
        .list_users(query.include_inactive, query.limit, query.offset)
        .await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// GET /users/:id
pub async fn get_user(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, AppError> {
    if user.id.0 != id {
        state
            .access_service
            .authorize(&user, Action::Read, Resource::User)
            .await?;
    }

    let found = state.access_service.get_user(&UserId(id)).await?;
    Ok(Json(found.into()))
}

/// POST /users
pub async fn create_user(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserWithKeyResponse>), AppError> {
    state
        .access_service
        .authorize(&user, Action::Create, Resource::User)
        .await?;

    let (created, api_key) = state
        .access_service
        .create_user(&request.name, &request.email, &ProfileId(request.profile_id))
        .await?;

    state.audit_service.record(
        Some(user.id),
        AuditAction::Create,
        Resource::User,
        Some(created.id.to_string()),
        Some(json!({ "email": created.email, "profile_id": created.profile_id })),
    );

    Ok((
        StatusCode::CREATED,
        Json(UserWithKeyResponse {
            user: created.into(),
            api_key,
        }),
    ))
}

/// PATCH /users/:id
pub async fn update_user(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    state
        .access_service
        .authorize(&user, Action::Update, Resource::User)
        .await?;

    if user.id.0 == id && request.active == Some(false) {
        return Err(AppError::BadRequest(
            "Users cannot deactivate themselves".to_string(),
        ));
    }

    let updated = state
        .access_service
        .update_user(
            &UserId(id),
            UserUpdate {
                name: request.name,
                profile_id: request.profile_id.map(ProfileId),
                active: request.active,
            },
        )
        .await?;

    state.audit_service.record(
        Some(user.id),
        AuditAction::Update,
        Resource::User,
        Some(updated.id.to_string()),
        Some(json!({ "profile_id": updated.profile_id, "active": updated.active })),
    );

    Ok(Json(updated.into()))
}

/// DELETE /users/:id
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .access_service
        .authorize(&user, Action::Delete, Resource::User)
        .await?;

    if user.id.0 == id {
        return Err(AppError::BadRequest(
            "Users cannot deactivate themselves".to_string(),
        ));
    }

    state.access_service.deactivate_user(&UserId(id)).await?;

    state.audit_service.record(
        Some(user.id),
        AuditAction::Deactivate,
        Resource::User,
        Some(id.to_string()),
        None,
    );

    Ok(StatusCode::NO_CONTENT)
}

/// POST /users/:id/rotate-key
///
/// Users may always rotate their own key; rotating someone else's
/// requires `update` on `user`. The old key stops working immediately.
pub async fn rotate_key(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserWithKeyResponse>, AppError> {
    if user.id.0 != id {
        state
            .access_service
            .authorize(&user, Action::Update, Resource::User)
            .await?;
    }

    let (rotated, api_key) = state.access_service.rotate_key(&UserId(id)).await?;

    state.audit_service.record(
        Some(user.id),
        AuditAction::RotateKey,
        Resource::User,
        Some(rotated.id.to_string()),
        None,
    );

    Ok(Json(UserWithKeyResponse {
        user: rotated.into(),
        api_key,
    }))
}
