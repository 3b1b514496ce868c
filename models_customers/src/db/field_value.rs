//! Database row for `field_values`.

use uuid::Uuid;

use crate::service::RawFieldValue;

/// A row of `field_values`
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct FieldValueRow {
    pub customer_id: Uuid,
    pub field_id: Uuid,
    pub value: String,
}

impl From<FieldValueRow> for RawFieldValue {
    fn from(row: FieldValueRow) -> Self {
        RawFieldValue {
            field_id: row.field_id,
            value: row.value,
        }
    }
}
