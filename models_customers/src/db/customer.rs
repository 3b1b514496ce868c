//! Database row for `customers`.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::service::{Customer, CustomerAttributes};

/// A row of `customers`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CustomerRow {
    pub id: Uuid,
    pub name: String,
    pub dob: Option<NaiveDate>,
    pub phone: String,
    pub email: String,
    pub occupation: String,
    pub location: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            attributes: CustomerAttributes {
                name: row.name,
                dob: row.dob,
                phone: row.phone,
                email: row.email,
                occupation: row.occupation,
                location: row.location,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
