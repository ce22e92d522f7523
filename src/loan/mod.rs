//! Loan domain module
//!
//! Contains the loan state machine, review records, and the lifecycle
//! service from creation through completion and archival.

mod model;
mod service;

pub use model::*;
pub use service::LoanService;
