//! API layer types - external-facing requests, responses and validation errors.

pub mod error;
pub mod query_params;
pub mod requests;
pub mod responses;

pub use error::{
    CustomerValidationError, FieldDefinitionValidationError, FieldValueValidationError,
    ValidationError,
};
pub use query_params::CustomerQueryParams;
pub use requests::{CustomerRequest, FieldDefinitionRequest, FieldOptionsInput};
pub use responses::{CustomerListResponse, ErrorResponse, FieldDefinitionListResponse};
