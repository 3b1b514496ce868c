//! Service layer types - used within customers_service.

pub mod customer;
pub mod field_definition;
pub mod field_value;

pub use customer::{Customer, CustomerAttributes, CustomerRecord};
pub use field_definition::{FieldDefinition, FieldSpec};
pub use field_value::{FieldValue, RawFieldValue};
