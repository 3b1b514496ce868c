//! In-process implementations of [CustomerCache]

use std::sync::Arc;

use dashmap::DashMap;
use models_customers::CustomerRecord;
use uuid::Uuid;

use crate::domain::ports::CustomerCache;

/// Keeps the last known state of every customer read or written by this process.
///
/// Clones share the same records, so the field registry and the customer
/// aggregate see one cache.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCustomerCache {
    records: Arc<DashMap<Uuid, CustomerRecord>>,
}

impl InMemoryCustomerCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CustomerCache for InMemoryCustomerCache {
    fn is_available(&self) -> bool {
        true
    }

    fn get(&self, id: Uuid) -> Option<CustomerRecord> {
        self.records.get(&id).map(|entry| entry.value().clone())
    }

    fn put(&self, record: CustomerRecord) {
        self.records.insert(record.id, record);
    }

    fn evict(&self, id: Uuid) {
        self.records.remove(&id);
    }

    fn snapshot(&self) -> Vec<CustomerRecord> {
        self.records
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    fn forget_field(&self, field_id: Uuid) {
        for mut entry in self.records.iter_mut() {
            entry.value_mut().custom_field_values.remove(&field_id);
        }
    }
}

/// Disables the fallback: reads always surface storage failures.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCustomerCache;

impl CustomerCache for NoCustomerCache {
    fn is_available(&self) -> bool {
        false
    }

    fn get(&self, _id: Uuid) -> Option<CustomerRecord> {
        None
    }

    fn put(&self, _record: CustomerRecord) {}

    fn evict(&self, _id: Uuid) {}

    fn snapshot(&self) -> Vec<CustomerRecord> {
        Vec::new()
    }

    fn forget_field(&self, _field_id: Uuid) {}
}
