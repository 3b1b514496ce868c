//! Database layer types - used only by the postgres adapter in customers_service.
//!
//! These structs directly map to database rows and include all database fields.
//! They should not be exposed outside of the adapter.

pub mod customer;
pub mod error;
pub mod field_definition;
pub mod field_value;

pub use customer::CustomerRow;
pub use error::DbConversionError;
pub use field_definition::FieldDefinitionRow;
pub use field_value::FieldValueRow;
