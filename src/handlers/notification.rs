//! Push token API handlers

use axum::{extract::State, Json};

use crate::error::ApiError;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::ApiResponse;
use crate::notification::{PushToken, TokenBody};
use crate::state::AppState;

/// Register a device token for the caller
pub async fn register_token(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<TokenBody>,
) -> Result<Json<ApiResponse<PushToken>>, ApiError> {
    let token = app_state
        .notification_service
        .register_token(user.user_id, &body.token)
        .await?;

    Ok(Json(ApiResponse::ok(token)))
}

/// Remove a device token for the caller
pub async fn remove_token(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<TokenBody>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    app_state
        .notification_service
        .remove_token(user.user_id, &body.token)
        .await?;

    Ok(Json(ApiResponse::ok(())))
}
