//! API validation errors

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during field definition validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FieldDefinitionValidationError {
    #[error("Field name cannot be empty")]
    EmptyName,

    #[error("Field name length {length} is invalid. Must be at most {max} characters.")]
    NameTooLong { length: usize, max: usize },

    #[error("Unrecognized data type '{0}'. Expected one of text, number, date, boolean, select")]
    UnknownDataType(String),

    #[error("Select fields require at least one option")]
    MissingOptions,
}

/// Errors that can occur while interpreting a value for a custom field
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FieldValueValidationError {
    #[error("'{0}' is not a number")]
    NotANumber(String),

    #[error("Number values must be finite")]
    NonFiniteNumber,

    #[error("'{0}' is not a calendar date")]
    NotADate(String),

    #[error("'{0}' is not a boolean")]
    NotABoolean(String),

    #[error("'{value}' is not one of the allowed options {allowed:?}")]
    NotAnOption { value: String, allowed: Vec<String> },

    #[error("Unsupported value {0}. Expected a scalar")]
    UnsupportedShape(String),
}

/// Errors that can occur during customer base attribute validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CustomerValidationError {
    #[error("Customer name cannot be empty")]
    EmptyName,

    #[error("Date of birth '{0}' is not a calendar date")]
    InvalidDateOfBirth(String),
}

/// Any validation failure detected before a write is attempted
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error(transparent)]
    FieldDefinition(#[from] FieldDefinitionValidationError),

    #[error("Invalid value for field {field_id}: {source}")]
    FieldValue {
        field_id: Uuid,
        #[source]
        source: FieldValueValidationError,
    },

    #[error(transparent)]
    Customer(#[from] CustomerValidationError),
}
