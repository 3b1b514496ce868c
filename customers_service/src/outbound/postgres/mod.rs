//! PostgreSQL implementation of storage ports
//! Maps directly from SQL rows to domain models using the row types of models_customers

mod customers;
mod fields;
mod schema;
mod values;


use std::collections::HashMap;

use models_customers::{
    Customer, CustomerAttributes, FieldDefinition, RawFieldValue, db::DbConversionError,
};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    error::CrmError,
    ports::{CustomerStorage, FieldRegistryStorage, FieldValueStore},
};

pub use schema::{EavSynchronizer, SchemaSynchronizer};

/// serialization_failure
const SERIALIZATION_FAILURE: &str = "40001";
/// deadlock_detected
const DEADLOCK_DETECTED: &str = "40P01";
/// foreign_key_violation, raised when a referenced field definition was removed concurrently
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// PostgreSQL storage for field definitions, customers and their values.
///
/// Generic over the [SchemaSynchronizer] so exactly one storage strategy is wired per process.
#[derive(Debug, Clone)]
pub struct CustomersPgStorage<Y = EavSynchronizer> {
    pool: PgPool,
    synchronizer: Y,
}

/// Error type for customers storage operations
#[derive(Debug, Error)]
pub enum CustomersStorageError {
    /// Database error
    #[error(transparent)]
    Db(#[from] sqlx::Error),
    /// A row could not be converted into its service model
    #[error("Data conversion error: {0}")]
    Conversion(#[from] DbConversionError),
    /// Values were written for a customer that does not exist
    #[error("customer {0} does not exist")]
    MissingCustomer(Uuid),
}

impl From<CustomersStorageError> for CrmError {
    fn from(err: CustomersStorageError) -> Self {
        match err {
            CustomersStorageError::MissingCustomer(id) => CrmError::customer_not_found(id),
            CustomersStorageError::Db(sqlx::Error::Database(db))
                if matches!(
                    db.code().as_deref(),
                    Some(SERIALIZATION_FAILURE | DEADLOCK_DETECTED | FOREIGN_KEY_VIOLATION)
                ) =>
            {
                CrmError::Conflict(db.message().to_string())
            }
            other => CrmError::Storage(other.into()),
        }
    }
}

impl CustomersPgStorage {
    /// Create a new PostgreSQL customers storage using entity-attribute-value rows
    pub fn new(pool: PgPool) -> Self {
        Self::with_synchronizer(pool, EavSynchronizer)
    }
}

impl<Y: SchemaSynchronizer> CustomersPgStorage<Y> {
    /// Create a new PostgreSQL customers storage with an explicit schema strategy
    pub fn with_synchronizer(pool: PgPool, synchronizer: Y) -> Self {
        Self { pool, synchronizer }
    }
}

impl<Y: SchemaSynchronizer> FieldRegistryStorage for CustomersPgStorage<Y> {
    type Err = CustomersStorageError;

    #[tracing::instrument(err, skip(self))]
    async fn list_fields(&self) -> Result<Vec<FieldDefinition>, Self::Err> {
        fields::list_fields(&self.pool).await
    }

    #[tracing::instrument(err, skip(self))]
    async fn get_field(&self, id: Uuid) -> Result<Option<FieldDefinition>, Self::Err> {
        fields::get_field(&self.pool, id).await
    }

    #[tracing::instrument(err, skip(self, definition), fields(field_id = %definition.id))]
    async fn insert_field(&self, definition: FieldDefinition) -> Result<FieldDefinition, Self::Err> {
        fields::insert_field(&self.pool, &self.synchronizer, definition).await
    }

    #[tracing::instrument(err, skip(self, definition), fields(field_id = %definition.id))]
    async fn update_field(
        &self,
        definition: FieldDefinition,
    ) -> Result<Option<FieldDefinition>, Self::Err> {
        fields::update_field(&self.pool, &self.synchronizer, definition).await
    }

    #[tracing::instrument(err, skip(self))]
    async fn delete_field(&self, id: Uuid) -> Result<bool, Self::Err> {
        fields::delete_field(&self.pool, &self.synchronizer, id).await
    }
}

impl<Y: SchemaSynchronizer> CustomerStorage for CustomersPgStorage<Y> {
    type Err = CustomersStorageError;

    #[tracing::instrument(err, skip(self, customer, values), fields(customer_id = %customer.id, values = values.len()))]
    async fn insert_customer(
        &self,
        customer: Customer,
        values: Vec<RawFieldValue>,
    ) -> Result<(Customer, Vec<RawFieldValue>), Self::Err> {
        customers::insert_customer(&self.pool, customer, values).await
    }

    #[tracing::instrument(err, skip(self, attributes, values), fields(values = values.len()))]
    async fn update_customer(
        &self,
        id: Uuid,
        attributes: CustomerAttributes,
        values: Vec<RawFieldValue>,
    ) -> Result<Option<(Customer, Vec<RawFieldValue>)>, Self::Err> {
        customers::update_customer(&self.pool, id, attributes, values).await
    }

    #[tracing::instrument(err, skip(self))]
    async fn get_customer(&self, id: Uuid) -> Result<Option<Customer>, Self::Err> {
        customers::get_customer(&self.pool, id).await
    }

    #[tracing::instrument(err, skip(self))]
    async fn list_customers(&self) -> Result<Vec<Customer>, Self::Err> {
        customers::list_customers(&self.pool).await
    }

    #[tracing::instrument(err, skip(self))]
    async fn search_customers(&self, term: &str) -> Result<Vec<Customer>, Self::Err> {
        customers::search_customers(&self.pool, term).await
    }

    #[tracing::instrument(err, skip(self))]
    async fn delete_customer(&self, id: Uuid) -> Result<bool, Self::Err> {
        customers::delete_customer(&self.pool, id).await
    }
}

impl<Y: SchemaSynchronizer> FieldValueStore for CustomersPgStorage<Y> {
    type Err = CustomersStorageError;

    #[tracing::instrument(err, skip(self, values), fields(values = values.len()))]
    async fn set_values(
        &self,
        customer_id: Uuid,
        values: Vec<RawFieldValue>,
    ) -> Result<Vec<RawFieldValue>, Self::Err> {
        let mut transaction = self.pool.begin().await?;

        let locked = sqlx::query_scalar::<_, Uuid>("SELECT id FROM customers WHERE id = $1 FOR UPDATE")
            .bind(customer_id)
            .fetch_optional(&mut *transaction)
            .await?;
        if locked.is_none() {
            return Err(CustomersStorageError::MissingCustomer(customer_id));
        }

        let stored = values::replace_values(&mut transaction, customer_id, &values).await?;

        transaction.commit().await?;
        Ok(stored)
    }

    #[tracing::instrument(err, skip(self))]
    async fn get_values(&self, customer_id: Uuid) -> Result<Vec<RawFieldValue>, Self::Err> {
        Ok(values::get_values(&self.pool, customer_id).await?)
    }

    #[tracing::instrument(err, skip(self, customer_ids), fields(customers = customer_ids.len()))]
    async fn get_values_for_customers(
        &self,
        customer_ids: Vec<Uuid>,
    ) -> Result<HashMap<Uuid, Vec<RawFieldValue>>, Self::Err> {
        Ok(values::get_values_for_customers(&self.pool, &customer_ids).await?)
    }

    #[tracing::instrument(err, skip(self))]
    async fn delete_values(&self, customer_id: Uuid) -> Result<u64, Self::Err> {
        Ok(values::delete_values(&self.pool, customer_id).await?)
    }

    #[tracing::instrument(err, skip(self))]
    async fn delete_values_for_field(&self, field_id: Uuid) -> Result<u64, Self::Err> {
        Ok(values::delete_values_for_field(&self.pool, field_id).await?)
    }
}
