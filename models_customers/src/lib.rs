//! Customers Models
//!
//! This crate defines the data models for customers and their custom fields using a layered layout:
//!
//! - **shared**: Shared types (DataType, calendar date parsing) used across all layers
//! - **db**: Database row types, only used by the postgres adapter
//! - **service**: Business logic layer types (definitions, typed values, customer aggregates)
//! - **api**: External-facing requests, responses and validation errors

pub mod api;
pub mod db;
pub mod service;
pub mod shared;

// Re-export commonly used types for convenience
pub use api::{
    CustomerValidationError, FieldDefinitionValidationError, FieldValueValidationError,
    ValidationError,
};
pub use service::{
    Customer, CustomerAttributes, CustomerRecord, FieldDefinition, FieldSpec, FieldValue,
    RawFieldValue,
};
pub use shared::DataType;
