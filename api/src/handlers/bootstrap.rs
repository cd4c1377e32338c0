//! Bootstrap handler
//!
//! Creates the administrator profile and the first user. Rate limited per
//! peer IP and only usable while the user table is empty.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::json;

use super::users::UserWithKeyResponse;
use crate::domain::entities::{AuditAction, Resource};
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct BootstrapRequest {
    /// Must equal the configured BOOTSTRAP_TOKEN
    pub token: String,
    pub name: String,
    pub email: String,
}

/// POST /bootstrap
pub async fn bootstrap(
    State(state): State<AppState>,
    Json(request): Json<BootstrapRequest>,
) -> Result<(StatusCode, Json<UserWithKeyResponse>), AppError> {
    let (user, api_key) = state
        .access_service
        .bootstrap(&request.token, &request.name, &request.email)
        .await?;

    state.audit_service.record(
        Some(user.id),
        AuditAction::Create,
        Resource::User,
        Some(user.id.to_string()),
        Some(json!({ "bootstrap": true, "profile_id": user.profile_id })),
    );

    Ok((
        StatusCode::CREATED,
        Json(UserWithKeyResponse {
            user: user.into(),
            api_key,
        }),
    ))
}
