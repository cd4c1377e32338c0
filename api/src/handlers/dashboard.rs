//! Dashboard handler

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::domain::entities::{Action, DashboardSummary, Resource, User};
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    /// Year of the monthly series; defaults to the current year
    pub year: Option<i32>,
}

/// GET /dashboard
pub async fn get_dashboard(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardSummary>, AppError> {
    state
        .access_service
        .authorize(&user, Action::Read, Resource::Dashboard)
        .await?;

    if let Some(year) = query.year {
        if !(1900..=9999).contains(&year) {
            return Err(AppError::BadRequest(format!("Invalid year: {}", year)));
        }
    }

    Ok(Json(state.dashboard_service.summary(query.year).await?))
}
