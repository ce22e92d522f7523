//! Loan request route definitions

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::*;
use crate::state::AppState;

pub fn loan_request_routes() -> Router<AppState> {
    Router::new()
        .route("/loan-requests", post(submit_request))
        .route("/loan-requests/received", get(list_received_requests))
        .route("/loan-requests/sent", get(list_sent_requests))
        .route("/loan-requests/:id/accept", post(accept_request))
        .route("/loan-requests/:id/reject", post(reject_request))
        .route("/loan-requests/:id/cancel", post(cancel_request))
}
