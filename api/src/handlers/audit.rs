//! Audit log handlers

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::validation;
use crate::domain::entities::{Action, AuditAction, AuditFilter, AuditLog, Resource, User, UserId};
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListAuditQuery {
    pub user_id: Option<Uuid>,
    pub resource: Option<Resource>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct AuditLogResponse {
    pub id: String,
    pub user_id: Option<String>,
    pub action: AuditAction,
    pub resource: Resource,
    pub resource_id: Option<String>,
    pub details: Option<serde_json::Value>,
    pub created_at: String,
}

impl From<AuditLog> for AuditLogResponse {
    fn from(log: AuditLog) -> Self {
        Self {
            id: log.id.to_string(),
            user_id: log.user_id.map(|id| id.to_string()),
            action: log.action,
            resource: log.resource,
            resource_id: log.resource_id,
            details: log.details,
            created_at: log.created_at.to_rfc3339(),
        }
    }
}

/// GET /audit-logs
///
/// Newest entries first.
pub async fn list_audit_logs(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<ListAuditQuery>,
) -> Result<Json<Vec<AuditLogResponse>>, AppError> {
    state
        .access_service
        .authorize(&user, Action::Read, Resource::AuditLog)
        .await?;

    let (limit, offset) = validation::page(query.limit, query.offset);
    let entries = state
        .audit_service
        .list(&AuditFilter {
            user_id: query.user_id.map(UserId),
            resource: query.resource,
            limit,
            offset,
        })
        .await?;

    Ok(Json(entries.into_iter().map(AuditLogResponse::from).collect()))
}
