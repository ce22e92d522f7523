//! Payment processor domain module
//!
//! Thin client for the external payment processor. The processor owns
//! capture; this side only creates intents and issues refunds.

mod service;

pub use service::{PaymentError, PaymentIntent, PaymentService, Refund};
