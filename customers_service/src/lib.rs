//! Customers Service library following hexagonal architecture pattern
//!
//! This library provides the custom field registry and the customer aggregate
//! and can be composed into various runtime contexts (services, workers, tests)

pub mod domain;
pub mod inbound;
pub mod outbound;
