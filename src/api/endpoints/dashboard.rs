//! Clinician dashboard endpoint.

use axum::extract::State;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::dashboard::DashboardView;

/// `GET /api/dashboard`: counters plus the leading patients and appointments.
pub async fn overview(State(ctx): State<ApiContext>) -> Result<Json<DashboardView>, ApiError> {
    Ok(Json(ctx.core.dashboard()?))
}
