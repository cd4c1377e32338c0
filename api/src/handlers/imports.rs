//! CSV import handler

use axum::{
    extract::{multipart::MultipartError, Multipart, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::domain::entities::{Action, AuditAction, ImportReport, Resource, User};
use crate::error::AppError;
use crate::AppState;

/// Name of the multipart field carrying the spreadsheet
const FILE_FIELD: &str = "file";

#[derive(Debug, Default, Deserialize)]
pub struct ImportQuery {
    /// Validate and report without writing anything
    #[serde(default)]
    pub dry_run: bool,
}

/// Uploads over `IMPORT_MAX_BYTES` surface here while the body is read
fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::BadRequest(e.body_text())
    }
}

/// POST /processes/import
///
/// Upload a CSV export of the process spreadsheet as multipart field
/// `file`. Each row is imported on its own; the report lists every row
/// that was skipped or failed.
pub async fn import_processes(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<ImportQuery>,
    mut multipart: Multipart,
) -> Result<Json<ImportReport>, AppError> {
    state
        .access_service
        .authorize(&user, Action::Import, Resource::Process)
        .await?;

    let mut file = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(multipart_error)?
    {
        if field.name() == Some(FILE_FIELD) {
            let filename = field.file_name().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(multipart_error)?;
            file = Some((filename, bytes));
            break;
        }
    }

    let (filename, bytes) = file.ok_or_else(|| {
        AppError::BadRequest(format!("Missing multipart field '{}'", FILE_FIELD))
    })?;

    tracing::info!(
        user_id = %user.id,
        filename = filename.as_deref().unwrap_or("-"),
        size = bytes.len(),
        dry_run = query.dry_run,
        "Starting process import"
    );

    let report = state.import_service.import(&bytes, query.dry_run).await?;

    if !query.dry_run {
        state.audit_service.record(
            Some(user.id),
            AuditAction::Import,
            Resource::Process,
            None,
            Some(json!({
                "filename": filename,
                "total": report.total,
                "imported": report.imported,
                "skipped": report.skipped,
                "failed": report.failed,
            })),
        );
    }

    Ok(Json(report))
}
