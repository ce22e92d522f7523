//! Payment API handlers

use axum::{extract::State, Json};
use serde::Deserialize;
use validator::Validate;

use crate::error::ApiError;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::ApiResponse;
use crate::payment::PaymentIntent;
use crate::state::AppState;

/// Request DTO for creating a payment intent
#[derive(Debug, Deserialize, Validate)]
pub struct CreateIntentBody {
    #[validate(range(min = 1))]
    pub amount: i64,
    #[validate(length(min = 3, max = 3))]
    pub currency: String,
}

/// Create a payment intent for a deposit
pub async fn create_payment_intent(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Json(body): Json<CreateIntentBody>,
) -> Result<Json<ApiResponse<PaymentIntent>>, ApiError> {
    body.validate()?;

    let intent = app_state
        .payment_service
        .create_payment_intent(body.amount, &body.currency)
        .await?;

    Ok(Json(ApiResponse::ok(intent)))
}
