//! Loan route definitions

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::*;
use crate::state::AppState;

pub fn loan_routes() -> Router<AppState> {
    Router::new()
        .route("/loans", get(list_loans))
        .route("/loans/borrows", get(list_borrows))
        .route("/loans/archived", get(list_archived_loans))
        .route("/loans/:id", get(get_loan))
        .route("/loans/:id/validate", post(validate_loan))
        .route("/loans/:id/cancel", post(cancel_loan))
        .route("/loans/:id/return", post(return_loan))
        .route("/loans/:id/complete", post(complete_loan))
        .route("/loans/:id/review", post(review_loan))
        .route("/loans/:id/archive", post(archive_loan))
}
