//! Item registry domain module
//!
//! Contains models and service for the items users put up for lending.

mod model;
mod service;

pub use model::*;
pub use service::ItemService;
