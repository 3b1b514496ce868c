//! Service implementations of the inbound ports

mod customer_aggregate;
mod field_registry;

pub use customer_aggregate::CustomerAggregateImpl;
pub use field_registry::FieldRegistryImpl;
