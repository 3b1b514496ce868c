//! Ports - the interfaces the domain exposes (inbound) and depends on (outbound)

use std::collections::HashMap;

use models_customers::{
    Customer, CustomerAttributes, CustomerRecord, FieldDefinition, RawFieldValue,
    api::{CustomerRequest, FieldDefinitionRequest},
};
use uuid::Uuid;

use crate::domain::error::CrmError;

// ===== Outbound =====

/// Persistence for field definitions.
///
/// Every mutation persists the definition and the matching storage-shape change
/// as one atomic unit.
#[cfg_attr(test, mockall::automock(type Err = anyhow::Error;))]
pub trait FieldRegistryStorage: Send + Sync + 'static {
    type Err;

    /// All definitions in insertion order
    fn list_fields(&self) -> impl Future<Output = Result<Vec<FieldDefinition>, Self::Err>> + Send;

    fn get_field(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<FieldDefinition>, Self::Err>> + Send;

    /// Persist a new definition and provision storage for it
    fn insert_field(
        &self,
        definition: FieldDefinition,
    ) -> impl Future<Output = Result<FieldDefinition, Self::Err>> + Send;

    /// Overwrite an existing definition, migrating storage when the data type changes.
    /// Returns [None] if the definition no longer exists.
    fn update_field(
        &self,
        definition: FieldDefinition,
    ) -> impl Future<Output = Result<Option<FieldDefinition>, Self::Err>> + Send;

    /// Remove the definition together with every value stored for it.
    /// Returns false if the definition did not exist.
    fn delete_field(&self, id: Uuid) -> impl Future<Output = Result<bool, Self::Err>> + Send;
}

/// Persistence for customers. Writes that carry values are atomic with the base row.
#[cfg_attr(test, mockall::automock(type Err = anyhow::Error;))]
pub trait CustomerStorage: Send + Sync + 'static {
    type Err;

    /// Insert the base row and its values. Values whose field no longer exists are dropped.
    /// Returns the stored customer and the values that were actually written.
    fn insert_customer(
        &self,
        customer: Customer,
        values: Vec<RawFieldValue>,
    ) -> impl Future<Output = Result<(Customer, Vec<RawFieldValue>), Self::Err>> + Send;

    /// Replace the base attributes and the full value set of a customer.
    /// Returns [None] if the customer does not exist.
    fn update_customer(
        &self,
        id: Uuid,
        attributes: CustomerAttributes,
        values: Vec<RawFieldValue>,
    ) -> impl Future<Output = Result<Option<(Customer, Vec<RawFieldValue>)>, Self::Err>> + Send;

    fn get_customer(&self, id: Uuid)
    -> impl Future<Output = Result<Option<Customer>, Self::Err>> + Send;

    /// Newest created first
    fn list_customers(&self) -> impl Future<Output = Result<Vec<Customer>, Self::Err>> + Send;

    /// Case-insensitive substring match on name, phone and email. Newest created first.
    fn search_customers(
        &self,
        term: &str,
    ) -> impl Future<Output = Result<Vec<Customer>, Self::Err>> + Send;

    /// Remove the customer and its values. Returns false if the customer did not exist.
    fn delete_customer(&self, id: Uuid) -> impl Future<Output = Result<bool, Self::Err>> + Send;
}

/// Persistence for the values customers hold for custom fields
///
/// The customer aggregate only reads through this port. Its writes go through
/// [CustomerStorage] so the base row and the values commit together.
/// [FieldValueStore::set_values] and the delete operations are standalone
/// maintenance hooks for callers that manage values outside a customer write.
#[cfg_attr(test, mockall::automock(type Err = anyhow::Error;))]
pub trait FieldValueStore: Send + Sync + 'static {
    type Err;

    /// Replace the full value set of a customer, dropping values for unknown fields
    fn set_values(
        &self,
        customer_id: Uuid,
        values: Vec<RawFieldValue>,
    ) -> impl Future<Output = Result<Vec<RawFieldValue>, Self::Err>> + Send;

    /// Values of one customer, restricted to fields that currently exist
    fn get_values(
        &self,
        customer_id: Uuid,
    ) -> impl Future<Output = Result<Vec<RawFieldValue>, Self::Err>> + Send;

    /// Values of many customers in one round trip, keyed by customer id
    fn get_values_for_customers(
        &self,
        customer_ids: Vec<Uuid>,
    ) -> impl Future<Output = Result<HashMap<Uuid, Vec<RawFieldValue>>, Self::Err>> + Send;

    /// Idempotent. Returns the number of removed values.
    fn delete_values(&self, customer_id: Uuid)
    -> impl Future<Output = Result<u64, Self::Err>> + Send;

    /// Idempotent. Returns the number of removed values.
    fn delete_values_for_field(
        &self,
        field_id: Uuid,
    ) -> impl Future<Output = Result<u64, Self::Err>> + Send;
}

/// Cache-aside fallback consulted only when storage is unreachable.
#[cfg_attr(test, mockall::automock)]
pub trait CustomerCache: Send + Sync + 'static {
    /// Whether reads may be served from this cache
    fn is_available(&self) -> bool;

    fn get(&self, id: Uuid) -> Option<CustomerRecord>;

    fn put(&self, record: CustomerRecord);

    fn evict(&self, id: Uuid);

    /// Every cached record, in no particular order
    fn snapshot(&self) -> Vec<CustomerRecord>;

    /// Drop the values of one field from every cached record
    fn forget_field(&self, field_id: Uuid);
}

// ===== Inbound =====

/// The service level interface for field definitions
pub trait FieldRegistryService: Send + Sync + 'static {
    fn define(
        &self,
        request: FieldDefinitionRequest,
    ) -> impl Future<Output = Result<FieldDefinition, CrmError>> + Send;

    fn update(
        &self,
        id: Uuid,
        request: FieldDefinitionRequest,
    ) -> impl Future<Output = Result<FieldDefinition, CrmError>> + Send;

    fn remove(&self, id: Uuid) -> impl Future<Output = Result<(), CrmError>> + Send;

    fn list(&self) -> impl Future<Output = Result<Vec<FieldDefinition>, CrmError>> + Send;

    fn get(&self, id: Uuid) -> impl Future<Output = Result<FieldDefinition, CrmError>> + Send;
}

/// The service level interface for customer records and their custom field values
pub trait CustomerAggregateService: Send + Sync + 'static {
    fn create(
        &self,
        request: CustomerRequest,
    ) -> impl Future<Output = Result<CustomerRecord, CrmError>> + Send;

    /// Full replace: custom values missing from the request are cleared
    fn update(
        &self,
        id: Uuid,
        request: CustomerRequest,
    ) -> impl Future<Output = Result<CustomerRecord, CrmError>> + Send;

    fn get(&self, id: Uuid) -> impl Future<Output = Result<CustomerRecord, CrmError>> + Send;

    fn list(&self) -> impl Future<Output = Result<Vec<CustomerRecord>, CrmError>> + Send;

    /// A blank query behaves like [CustomerAggregateService::list]
    fn search(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<CustomerRecord>, CrmError>> + Send;

    fn delete(&self, id: Uuid) -> impl Future<Output = Result<(), CrmError>> + Send;
}
