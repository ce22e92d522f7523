//! Loan request domain module
//!
//! Contains models and service for loan requests, from submission up to the
//! accept transaction that turns one into a loan.

mod model;
mod service;

pub use model::*;
pub use service::LoanRequestService;
