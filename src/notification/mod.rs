//! Push notification domain module
//!
//! Token registry plus a client for the external push gateway. Delivery is
//! best-effort: business logic logs failures and moves on.

mod model;
mod service;

pub use model::*;
pub use service::{build_messages, NotificationError, NotificationService};
