//! API handlers

pub mod item;
pub mod loan;
pub mod notification;
pub mod payment;
pub mod request;
pub mod task;

pub use item::*;
pub use loan::*;
pub use notification::*;
pub use payment::*;
pub use request::*;
pub use task::*;

// Re-export AuthenticatedUser from middleware for handler use
pub use crate::middleware::auth::{AdminUser, AuthenticatedUser};
