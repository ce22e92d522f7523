//! Payment route definitions

use axum::{routing::post, Router};

use crate::handlers::*;
use crate::state::AppState;

pub fn payment_routes() -> Router<AppState> {
    Router::new().route("/payment/intent", post(create_payment_intent))
}
