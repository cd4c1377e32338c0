//! Process handlers
//!
//! CRUD endpoints for complaint/inspection processes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::domain::entities::{
    Action, AuditAction, LookupId, NewProcess, PartyId, Process, ProcessFilter, ProcessId,
    ProcessUpdate, Resource, ResponsibleId, User,
};
use crate::error::AppError;
use crate::AppState;

/// Query parameters for listing processes
#[derive(Debug, Default, Deserialize)]
pub struct ListProcessesQuery {
    /// Substring of the process number
    pub search: Option<String>,
    pub situation_id: Option<Uuid>,
    pub responsible_id: Option<Uuid>,
    pub entry_channel_id: Option<Uuid>,
    #[serde(default)]
    pub include_inactive: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Request to create a process
#[derive(Debug, Deserialize)]
pub struct CreateProcessRequest {
    pub number: String,
    pub complainant_id: Option<Uuid>,
    pub controller_id: Option<Uuid>,
    pub responsible_id: Option<Uuid>,
    pub entry_channel_id: Option<Uuid>,
    pub situation_id: Option<Uuid>,
    pub referral_id: Option<Uuid>,
    pub description: Option<String>,
    /// ISO date (yyyy-mm-dd)
    pub received_at: Option<NaiveDate>,
    pub closed_at: Option<NaiveDate>,
}

/// Partial update; omitted fields are left unchanged and an explicit
/// `null` clears a nullable field
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProcessRequest {
    pub number: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub complainant_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "nullable")]
    pub controller_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "nullable")]
    pub responsible_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "nullable")]
    pub entry_channel_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "nullable")]
    pub situation_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "nullable")]
    pub referral_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub received_at: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "nullable")]
    pub closed_at: Option<Option<NaiveDate>>,
    pub active: Option<bool>,
}

/// A present field, `null` included, becomes `Some`; absent fields fall
/// back to `None` through `#[serde(default)]`
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub id: String,
    pub number: String,
    pub complainant_id: Option<String>,
    pub controller_id: Option<String>,
    pub responsible_id: Option<String>,
    pub entry_channel_id: Option<String>,
    pub situation_id: Option<String>,
    pub referral_id: Option<String>,
    pub description: Option<String>,
    pub received_at: Option<NaiveDate>,
    pub closed_at: Option<NaiveDate>,
    pub open: bool,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Process> for ProcessResponse {
    fn from(p: Process) -> Self {
        Self {
            id: p.id.to_string(),
            open: p.is_open(),
            number: p.number,
            complainant_id: p.complainant_id.map(|id| id.to_string()),
            controller_id: p.controller_id.map(|id| id.to_string()),
            responsible_id: p.responsible_id.map(|id| id.to_string()),
            entry_channel_id: p.entry_channel_id.map(|id| id.to_string()),
            situation_id: p.situation_id.map(|id| id.to_string()),
            referral_id: p.referral_id.map(|id| id.to_string()),
            description: p.description,
            received_at: p.received_at,
            closed_at: p.closed_at,
            active: p.active,
            created_at: p.created_at.to_rfc3339(),
            updated_at: p.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProcessListResponse {
    pub items: Vec<ProcessResponse>,
    pub total: u64,
    pub limit: i64,
    pub offset: i64,
}

/// GET /processes
pub async fn list_processes(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<ListProcessesQuery>,
) -> Result<Json<ProcessListResponse>, AppError> {
    state
        .access_service
        .authorize(&user, Action::Read, Resource::Process)
        .await?;

    let filter = ProcessFilter {
        search: query.search,
        situation_id: query.situation_id.map(LookupId),
        responsible_id: query.responsible_id.map(ResponsibleId),
        entry_channel_id: query.entry_channel_id.map(LookupId),
        include_inactive: query.include_inactive,
        ..Default::default()
    };

    let page = state
        .process_service
        .list(filter, query.limit, query.offset)
        .await?;

    Ok(Json(ProcessListResponse {
        items: page.items.into_iter().map(ProcessResponse::from).collect(),
        total: page.total,
        limit: page.limit,
        offset: page.offset,
    }))
}

/// GET /processes/:id
pub async fn get_process(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProcessResponse>, AppError> {
    state
        .access_service
        .authorize(&user, Action::Read, Resource::Process)
        .await?;

    let process = state.process_service.get(&ProcessId(id)).await?;
    Ok(Json(process.into()))
}

/// POST /processes
pub async fn create_process(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateProcessRequest>,
) -> Result<(StatusCode, Json<ProcessResponse>), AppError> {
    state
        .access_service
        .authorize(&user, Action::Create, Resource::Process)
        .await?;

    let process = state
        .process_service
        .create(NewProcess {
            number: request.number,
            complainant_id: request.complainant_id.map(PartyId),
            controller_id: request.controller_id.map(PartyId),
            responsible_id: request.responsible_id.map(ResponsibleId),
            entry_channel_id: request.entry_channel_id.map(LookupId),
            situation_id: request.situation_id.map(LookupId),
            referral_id: request.referral_id.map(LookupId),
            description: request.description,
            received_at: request.received_at,
            closed_at: request.closed_at,
        })
        .await?;

    state.audit_service.record(
        Some(user.id),
        AuditAction::Create,
        Resource::Process,
        Some(process.id.to_string()),
        Some(json!({ "number": process.number })),
    );

    Ok((StatusCode::CREATED, Json(process.into())))
}

/// PATCH /processes/:id
pub async fn update_process(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateProcessRequest>,
) -> Result<Json<ProcessResponse>, AppError> {
    state
        .access_service
        .authorize(&user, Action::Update, Resource::Process)
        .await?;

    let changed = changed_fields(&request);
    let process = state
        .process_service
        .update(
            &ProcessId(id),
            ProcessUpdate {
                number: request.number,
                complainant_id: request.complainant_id.map(|id| id.map(PartyId)),
                controller_id: request.controller_id.map(|id| id.map(PartyId)),
                responsible_id: request.responsible_id.map(|id| id.map(ResponsibleId)),
                entry_channel_id: request.entry_channel_id.map(|id| id.map(LookupId)),
                situation_id: request.situation_id.map(|id| id.map(LookupId)),
                referral_id: request.referral_id.map(|id| id.map(LookupId)),
                description: request.description,
                received_at: request.received_at,
                closed_at: request.closed_at,
                active: request.active,
            },
        )
        .await?;

    state.audit_service.record(
        Some(user.id),
        AuditAction::Update,
        Resource::Process,
        Some(process.id.to_string()),
        Some(json!({ "fields": changed })),
    );

    Ok(Json(process.into()))
}

/// DELETE /processes/:id
///
/// Soft delete: the process is kept but marked inactive.
pub async fn delete_process(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProcessResponse>, AppError> {
    state
        .access_service
        .authorize(&user, Action::Delete, Resource::Process)
        .await?;

    let process = state.process_service.deactivate(&ProcessId(id)).await?;

    state.audit_service.record(
        Some(user.id),
        AuditAction::Deactivate,
        Resource::Process,
        Some(process.id.to_string()),
        Some(json!({ "number": process.number })),
    );

    Ok(Json(process.into()))
}

/// Names of the fields present in an update, for the audit trail
fn changed_fields(request: &UpdateProcessRequest) -> Vec<&'static str> {
    [
        ("number", request.number.is_some()),
        ("complainant_id", request.complainant_id.is_some()),
        ("controller_id", request.controller_id.is_some()),
        ("responsible_id", request.responsible_id.is_some()),
        ("entry_channel_id", request.entry_channel_id.is_some()),
        ("situation_id", request.situation_id.is_some()),
        ("referral_id", request.referral_id.is_some()),
        ("description", request.description.is_some()),
        ("received_at", request.received_at.is_some()),
        ("closed_at", request.closed_at.is_some()),
        ("active", request.active.is_some()),
    ]
    .into_iter()
    .filter_map(|(name, present)| present.then_some(name))
    .collect()
}
