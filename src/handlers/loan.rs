//! Loan API handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use validator::Validate;

use crate::error::ApiError;
use crate::loan::{ListLoansQuery, Loan, ReviewBody, ValidateLoanBody};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::ApiResponse;
use crate::state::AppState;

/// Caller's loans as lender (admins see all)
pub async fn list_loans(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<ListLoansQuery>,
) -> Result<Json<ApiResponse<Vec<Loan>>>, ApiError> {
    let loans = app_state.loan_service.list_loans(&user, query.status).await?;

    Ok(Json(ApiResponse::ok(loans)))
}

/// Caller's loans as borrower (admins see all)
pub async fn list_borrows(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<ListLoansQuery>,
) -> Result<Json<ApiResponse<Vec<Loan>>>, ApiError> {
    let loans = app_state
        .loan_service
        .list_borrows(&user, query.status)
        .await?;

    Ok(Json(ApiResponse::ok(loans)))
}

/// Caller's archived loans
pub async fn list_archived_loans(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<ListLoansQuery>,
) -> Result<Json<ApiResponse<Vec<Loan>>>, ApiError> {
    let loans = app_state
        .loan_service
        .list_archived(&user, query.status)
        .await?;

    Ok(Json(ApiResponse::ok(loans)))
}

/// Get a single loan
pub async fn get_loan(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Loan>>, ApiError> {
    let loan = app_state.loan_service.get(id, &user).await?;

    Ok(Json(ApiResponse::ok(loan)))
}

/// Record the payment reference and start the loan
pub async fn validate_loan(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<ValidateLoanBody>,
) -> Result<Json<ApiResponse<Loan>>, ApiError> {
    let loan = app_state
        .loan_service
        .validate(id, &body.payment_id, &user)
        .await?;

    Ok(Json(ApiResponse::ok(loan)))
}

/// Cancel a loan
pub async fn cancel_loan(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Loan>>, ApiError> {
    let loan = app_state.loan_service.cancel(id, &user).await?;

    Ok(Json(ApiResponse::ok(loan)))
}

/// Mark the return as initiated
pub async fn return_loan(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Loan>>, ApiError> {
    let loan = app_state.loan_service.mark_in_completion(id, &user).await?;

    Ok(Json(ApiResponse::ok(loan)))
}

/// Complete the loan with the lender's review of the borrower
pub async fn complete_loan(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<ReviewBody>,
) -> Result<Json<ApiResponse<Loan>>, ApiError> {
    body.validate()?;

    let loan = app_state
        .loan_service
        .complete(id, body.rating, body.comment, &user)
        .await?;

    Ok(Json(ApiResponse::ok(loan)))
}

/// Submit the borrower's review of the lender
pub async fn review_loan(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<ReviewBody>,
) -> Result<Json<ApiResponse<Loan>>, ApiError> {
    body.validate()?;

    let loan = app_state
        .loan_service
        .submit_borrower_review(id, body.rating, body.comment, &user)
        .await?;

    Ok(Json(ApiResponse::ok(loan)))
}

/// Archive a loan
pub async fn archive_loan(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Loan>>, ApiError> {
    let loan = app_state.loan_service.archive(id, &user).await?;

    Ok(Json(ApiResponse::ok(loan)))
}
