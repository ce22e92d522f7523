//! Loan request API handlers

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::ApiError;
use crate::loan::Loan;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::ApiResponse;
use crate::request::{LoanRequest, NewLoanRequest};
use crate::state::AppState;

/// Submit a loan request for an item
pub async fn submit_request(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<NewLoanRequest>,
) -> Result<Json<ApiResponse<LoanRequest>>, ApiError> {
    let request = app_state.request_service.submit(&user, body).await?;

    Ok(Json(ApiResponse::ok(request)))
}

/// Pending requests received by the caller as lender
pub async fn list_received_requests(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<Vec<LoanRequest>>>, ApiError> {
    let requests = app_state.request_service.list_received(&user).await?;

    Ok(Json(ApiResponse::ok(requests)))
}

/// Pending requests sent by the caller as requester
pub async fn list_sent_requests(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<Vec<LoanRequest>>>, ApiError> {
    let requests = app_state.request_service.list_sent(&user).await?;

    Ok(Json(ApiResponse::ok(requests)))
}

/// Accept a request, creating the loan
pub async fn accept_request(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Loan>>, ApiError> {
    let loan = app_state.request_service.accept(id, &user).await?;

    Ok(Json(ApiResponse::ok(loan)))
}

/// Reject a received request
pub async fn reject_request(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<LoanRequest>>, ApiError> {
    let request = app_state.request_service.reject(id, &user).await?;

    Ok(Json(ApiResponse::ok(request)))
}

/// Cancel a sent request
pub async fn cancel_request(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<LoanRequest>>, ApiError> {
    let request = app_state.request_service.cancel(id, &user).await?;

    Ok(Json(ApiResponse::ok(request)))
}
