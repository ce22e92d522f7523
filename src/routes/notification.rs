//! Push token route definitions

use axum::{
    routing::{delete, post},
    Router,
};

use crate::handlers::*;
use crate::state::AppState;

pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/notifications/token", post(register_token))
        .route("/notifications/token", delete(remove_token))
}
