//! Route definitions for the API

mod item;
mod loan;
mod notification;
mod payment;
mod request;
mod task;

pub use item::item_routes;
pub use loan::loan_routes;
pub use notification::notification_routes;
pub use payment::payment_routes;
pub use request::loan_request_routes;
pub use task::task_routes;
