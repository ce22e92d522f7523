//! Housekeeping trigger route definitions

use axum::{routing::post, Router};

use crate::handlers::*;
use crate::state::AppState;

pub fn task_routes() -> Router<AppState> {
    Router::new().route("/tasks/trigger-overdue-sweep", post(trigger_overdue_sweep))
}
