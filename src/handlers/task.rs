//! Housekeeping trigger handlers

use axum::{extract::State, Json};

use crate::error::ApiError;
use crate::middleware::auth::AdminUser;
use crate::models::ApiResponse;
use crate::state::AppState;

/// Manually run the daily overdue-loan sweep. Returns the swept loan ids.
pub async fn trigger_overdue_sweep(
    State(app_state): State<AppState>,
    AdminUser(_user): AdminUser,
) -> Result<Json<ApiResponse<Vec<i64>>>, ApiError> {
    let swept = app_state.loan_service.auto_complete_overdue().await?;

    Ok(Json(ApiResponse::ok(swept)))
}
