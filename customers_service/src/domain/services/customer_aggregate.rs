//! Customer aggregate: composes base attributes with typed custom field values on read,
//! and splits a submitted record into base and value writes on write.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use models_customers::{
    Customer, CustomerRecord, FieldDefinition, FieldValue, RawFieldValue, ValidationError,
    api::CustomerRequest,
};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::{
    error::{CrmError, Result},
    ports::{
        CustomerAggregateService, CustomerCache, CustomerStorage, FieldRegistryStorage,
        FieldValueStore,
    },
};

#[cfg(test)]
mod tests;

type Definitions = HashMap<Uuid, FieldDefinition>;

/// Concrete implementation of [CustomerAggregateService]
pub struct CustomerAggregateImpl<C, V, F, K> {
    /// base customer rows
    customers: C,
    /// custom field values
    values: V,
    /// field definitions, consulted to type and filter values
    fields: F,
    /// fallback for reads when storage is unreachable
    cache: K,
}

impl<C, V, F, K> CustomerAggregateImpl<C, V, F, K>
where
    C: CustomerStorage,
    V: FieldValueStore,
    F: FieldRegistryStorage,
    K: CustomerCache,
    CrmError: From<C::Err> + From<V::Err> + From<F::Err>,
{
    pub fn new(customers: C, values: V, fields: F, cache: K) -> Self {
        CustomerAggregateImpl {
            customers,
            values,
            fields,
            cache,
        }
    }

    async fn definitions(&self) -> Result<Definitions> {
        Ok(self
            .fields
            .list_fields()
            .await?
            .into_iter()
            .map(|definition| (definition.id, definition))
            .collect())
    }

    async fn load(&self, id: Uuid) -> Result<Option<CustomerRecord>> {
        let Some(customer) = self.customers.get_customer(id).await? else {
            return Ok(None);
        };
        let definitions = self.definitions().await?;
        let raw = self.values.get_values(id).await?;
        Ok(Some(CustomerRecord::assemble(
            customer,
            typed_values(&definitions, raw),
        )))
    }

    async fn load_many(&self, customers: Vec<Customer>) -> Result<Vec<CustomerRecord>> {
        if customers.is_empty() {
            return Ok(Vec::new());
        }

        let definitions = self.definitions().await?;
        let ids = customers.iter().map(|customer| customer.id).collect();
        let mut values = self.values.get_values_for_customers(ids).await?;

        Ok(customers
            .into_iter()
            .map(|customer| {
                let raw = values.remove(&customer.id).unwrap_or_default();
                CustomerRecord::assemble(customer, typed_values(&definitions, raw))
            })
            .collect())
    }

    fn remember(&self, records: &[CustomerRecord]) {
        for record in records {
            self.cache.put(record.clone());
        }
    }

    /// Serve a read from the cache when storage failed and the cache can answer
    fn fallback<T>(&self, err: CrmError, read: impl FnOnce(&K) -> Option<T>) -> Result<T> {
        if !matches!(err, CrmError::Storage(_)) || !self.cache.is_available() {
            return Err(err);
        }
        match read(&self.cache) {
            Some(cached) => {
                tracing::warn!(error = %err, "storage unavailable, serving customers from cache");
                Ok(cached)
            }
            None => Err(err),
        }
    }
}

impl<C, V, F, K> CustomerAggregateService for CustomerAggregateImpl<C, V, F, K>
where
    C: CustomerStorage,
    V: FieldValueStore,
    F: FieldRegistryStorage,
    K: CustomerCache,
    CrmError: From<C::Err> + From<V::Err> + From<F::Err>,
{
    #[tracing::instrument(err, skip(self, request))]
    async fn create(&self, request: CustomerRequest) -> Result<CustomerRecord> {
        let attributes = request.attributes()?;
        let definitions = self.definitions().await?;
        let values = decompose(&definitions, request.custom_field_values)?;

        let now = Utc::now();
        let customer = Customer {
            id: Uuid::now_v7(),
            attributes,
            created_at: now,
            updated_at: now,
        };

        let (customer, stored) = self.customers.insert_customer(customer, values).await?;
        let record = CustomerRecord::assemble(customer, typed_values(&definitions, stored));
        self.cache.put(record.clone());

        tracing::info!(
            customer_id = %record.id,
            custom_values = record.custom_field_values.len(),
            "created customer"
        );
        Ok(record)
    }

    #[tracing::instrument(err, skip(self, request))]
    async fn update(&self, id: Uuid, request: CustomerRequest) -> Result<CustomerRecord> {
        let attributes = request.attributes()?;
        let definitions = self.definitions().await?;
        let values = decompose(&definitions, request.custom_field_values)?;

        let Some((customer, stored)) = self
            .customers
            .update_customer(id, attributes, values)
            .await?
        else {
            self.cache.evict(id);
            return Err(CrmError::customer_not_found(id));
        };

        let record = CustomerRecord::assemble(customer, typed_values(&definitions, stored));
        self.cache.put(record.clone());

        tracing::info!(
            customer_id = %record.id,
            custom_values = record.custom_field_values.len(),
            "updated customer"
        );
        Ok(record)
    }

    #[tracing::instrument(err, skip(self))]
    async fn get(&self, id: Uuid) -> Result<CustomerRecord> {
        match self.load(id).await {
            Ok(Some(record)) => {
                self.cache.put(record.clone());
                Ok(record)
            }
            Ok(None) => {
                self.cache.evict(id);
                Err(CrmError::customer_not_found(id))
            }
            Err(err) => self.fallback(err, |cache| cache.get(id)),
        }
    }

    #[tracing::instrument(err, skip(self))]
    async fn list(&self) -> Result<Vec<CustomerRecord>> {
        // port errors are not Send, so convert before the next await
        let loaded = match self.customers.list_customers().await.map_err(CrmError::from) {
            Ok(customers) => self.load_many(customers).await,
            Err(err) => Err(err),
        };

        match loaded {
            Ok(records) => {
                self.remember(&records);
                tracing::debug!(count = records.len(), "listed customers");
                Ok(records)
            }
            Err(err) => self.fallback(err, |cache| Some(newest_first(cache.snapshot()))),
        }
    }

    #[tracing::instrument(err, skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<CustomerRecord>> {
        let term = query.trim();
        if term.is_empty() {
            return self.list().await;
        }

        let loaded = match self
            .customers
            .search_customers(term)
            .await
            .map_err(CrmError::from)
        {
            Ok(customers) => self.load_many(customers).await,
            Err(err) => Err(err),
        };

        match loaded {
            Ok(records) => {
                self.remember(&records);
                tracing::debug!(count = records.len(), "searched customers");
                Ok(records)
            }
            Err(err) => self.fallback(err, |cache| {
                let needle = term.to_lowercase();
                let matching = cache
                    .snapshot()
                    .into_iter()
                    .filter(|record| matches_search(record, &needle))
                    .collect();
                Some(newest_first(matching))
            }),
        }
    }

    #[tracing::instrument(err, skip(self))]
    async fn delete(&self, id: Uuid) -> Result<()> {
        let deleted = self.customers.delete_customer(id).await?;
        self.cache.evict(id);
        if !deleted {
            return Err(CrmError::customer_not_found(id));
        }
        tracing::info!(customer_id = %id, "deleted customer");
        Ok(())
    }
}

/// Validate and encode submitted custom values.
///
/// Keys that are not ids of current definitions are dropped, never rejected.
fn decompose(
    definitions: &Definitions,
    submitted: HashMap<String, Value>,
) -> Result<Vec<RawFieldValue>> {
    let mut values: BTreeMap<Uuid, String> = BTreeMap::new();

    for (key, input) in submitted {
        let Some(definition) = Uuid::parse_str(key.trim())
            .ok()
            .and_then(|field_id| definitions.get(&field_id))
        else {
            tracing::debug!(key = %key, "dropping value for unknown custom field");
            continue;
        };

        let parsed = FieldValue::parse_input(definition, &input).map_err(|source| {
            ValidationError::FieldValue {
                field_id: definition.id,
                source,
            }
        })?;

        if let Some(value) = parsed {
            values.insert(definition.id, value.to_stored());
        }
    }

    Ok(values
        .into_iter()
        .map(|(field_id, value)| RawFieldValue { field_id, value })
        .collect())
}

/// Interpret stored payloads under each field's current data type
fn typed_values(definitions: &Definitions, raw: Vec<RawFieldValue>) -> BTreeMap<Uuid, FieldValue> {
    raw.into_iter()
        .filter_map(|RawFieldValue { field_id, value }| {
            let definition = definitions.get(&field_id)?;
            match FieldValue::from_stored(definition, &value) {
                Ok(typed) => Some((field_id, typed)),
                Err(err) => {
                    tracing::warn!(
                        field_id = %field_id,
                        data_type = %definition.data_type,
                        error = %err,
                        "skipping stored value that no longer matches its field type"
                    );
                    None
                }
            }
        })
        .collect()
}

fn matches_search(record: &CustomerRecord, needle: &str) -> bool {
    let attributes = &record.attributes;
    [&attributes.name, &attributes.phone, &attributes.email]
        .into_iter()
        .any(|haystack| haystack.to_lowercase().contains(needle))
}

fn newest_first(mut records: Vec<CustomerRecord>) -> Vec<CustomerRecord> {
    records.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
    records
}
