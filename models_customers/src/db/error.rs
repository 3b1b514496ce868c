//! Database layer conversion errors

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during database model conversions
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DbConversionError {
    #[error(
        "Invalid database state: select field_definition {id} has no options. Expected a non-empty options_json array."
    )]
    SelectWithoutOptions { id: Uuid },
}
