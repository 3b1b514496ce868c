//! Domain layer - core business logic, models, and port definitions

pub mod error;
pub mod ports;
pub mod services;

pub use error::*;
