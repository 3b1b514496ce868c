//! Service layer customer models.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::service::field_value::FieldValue;

/// The fixed, schema-level attributes every customer has.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct CustomerAttributes {
    pub name: String,
    /// Serialized as `YYYY-MM-DD`
    pub dob: Option<NaiveDate>,
    pub phone: String,
    pub email: String,
    pub occupation: String,
    pub location: String,
}

/// A persisted customer without its custom field values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub id: Uuid,
    pub attributes: CustomerAttributes,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The customer aggregate: base attributes plus typed custom field values keyed by field id.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct CustomerRecord {
    pub id: Uuid,
    #[serde(flatten)]
    pub attributes: CustomerAttributes,
    /// Only fields that are currently defined and hold a value appear here.
    pub custom_field_values: BTreeMap<Uuid, FieldValue>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CustomerRecord {
    /// Attach custom field values to a customer
    pub fn assemble(customer: Customer, custom_field_values: BTreeMap<Uuid, FieldValue>) -> Self {
        let Customer {
            id,
            attributes,
            created_at,
            updated_at,
        } = customer;
        Self {
            id,
            attributes,
            custom_field_values,
            created_at,
            updated_at,
        }
    }
}
