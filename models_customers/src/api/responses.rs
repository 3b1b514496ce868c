//! API layer response types.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::service::{CustomerRecord, FieldDefinition};

/// Response for listing field definitions
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FieldDefinitionListResponse {
    /// Definitions in insertion order
    pub fields: Vec<FieldDefinition>,
}

/// Response for listing or searching customers
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CustomerListResponse {
    /// Customers, newest created first
    pub customers: Vec<CustomerRecord>,
}

/// A plain json error response: `{"message": "..."}`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse<'a> {
    /// Message to explain failure
    pub message: &'a str,
}
