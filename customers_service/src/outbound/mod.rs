//! Outbound adapters - implementations of domain ports

pub mod memory;
pub mod postgres;

pub use memory::{InMemoryCustomerCache, NoCustomerCache};
pub use postgres::{CustomersPgStorage, CustomersStorageError, EavSynchronizer, SchemaSynchronizer};
