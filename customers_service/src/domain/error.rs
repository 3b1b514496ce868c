//! Domain error types

use models_customers::{CustomerValidationError, FieldDefinitionValidationError, ValidationError};
use strum::Display;
use thiserror::Error;
use uuid::Uuid;

/// The kind of record a [CrmError::NotFound] refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Resource {
    #[strum(serialize = "field definition")]
    FieldDefinition,
    #[strum(serialize = "customer")]
    Customer,
}

/// Domain-level errors for field registry and customer operations
#[derive(Debug, Error)]
pub enum CrmError {
    /// Input was rejected before any write was attempted
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Resource not found
    #[error("{resource} {id} not found")]
    NotFound { resource: Resource, id: Uuid },

    /// A concurrent change won the race for the same rows
    #[error("Conflicting concurrent change: {0}")]
    Conflict(String),

    /// The persistence layer failed
    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl CrmError {
    pub(crate) fn field_not_found(id: Uuid) -> Self {
        CrmError::NotFound {
            resource: Resource::FieldDefinition,
            id,
        }
    }

    pub(crate) fn customer_not_found(id: Uuid) -> Self {
        CrmError::NotFound {
            resource: Resource::Customer,
            id,
        }
    }
}

impl From<FieldDefinitionValidationError> for CrmError {
    fn from(err: FieldDefinitionValidationError) -> Self {
        CrmError::Validation(err.into())
    }
}

impl From<CustomerValidationError> for CrmError {
    fn from(err: CustomerValidationError) -> Self {
        CrmError::Validation(err.into())
    }
}

/// Result type for domain operations
pub type Result<T> = std::result::Result<T, CrmError>;
