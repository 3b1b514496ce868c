//! Service layer field definition model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::DataType;

/// A validated field shape: everything a definition carries except identity and timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub data_type: DataType,
    /// Present only when `data_type` is [DataType::Select]
    pub options: Option<Vec<String>>,
}

/// Custom field definition (service representation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct FieldDefinition {
    pub id: Uuid,
    pub name: String,
    pub data_type: DataType,
    /// Ordered allowed values, present only for select fields.
    pub options: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FieldDefinition {
    /// Build a brand new definition from a validated spec
    pub fn new(id: Uuid, spec: FieldSpec, now: DateTime<Utc>) -> Self {
        let FieldSpec {
            name,
            data_type,
            options,
        } = spec;
        Self {
            id,
            name,
            data_type,
            options,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a validated spec on top of this definition, keeping identity and creation time
    pub fn redefine(&self, spec: FieldSpec, now: DateTime<Utc>) -> Self {
        let FieldSpec {
            name,
            data_type,
            options,
        } = spec;
        Self {
            id: self.id,
            name,
            data_type,
            options,
            created_at: self.created_at,
            updated_at: now,
        }
    }

    /// The allowed options, empty for non-select fields
    pub fn options(&self) -> &[String] {
        self.options.as_deref().unwrap_or_default()
    }

    /// Whether `value` is one of the allowed options
    pub fn allows_option(&self, value: &str) -> bool {
        self.options().iter().any(|option| option == value)
    }
}
