//! Field registry: the single source of truth for which custom fields exist

use chrono::Utc;
use models_customers::{FieldDefinition, api::FieldDefinitionRequest};
use uuid::Uuid;

use crate::domain::{
    error::{CrmError, Result},
    ports::{CustomerCache, FieldRegistryService, FieldRegistryStorage},
};


/// Concrete implementation of [FieldRegistryService]
pub struct FieldRegistryImpl<S, K> {
    storage: S,
    /// shared with the customer aggregate; cached values of changed fields are dropped
    cache: K,
}

impl<S, K> FieldRegistryImpl<S, K>
where
    S: FieldRegistryStorage,
    K: CustomerCache,
    CrmError: From<S::Err>,
{
    pub fn new(storage: S, cache: K) -> Self {
        FieldRegistryImpl { storage, cache }
    }
}

impl<S, K> FieldRegistryService for FieldRegistryImpl<S, K>
where
    S: FieldRegistryStorage,
    K: CustomerCache,
    CrmError: From<S::Err>,
{
    #[tracing::instrument(err, skip(self))]
    async fn define(&self, request: FieldDefinitionRequest) -> Result<FieldDefinition> {
        let spec = request.validate()?;
        let definition = FieldDefinition::new(Uuid::now_v7(), spec, Utc::now());

        let definition = self.storage.insert_field(definition).await?;

        tracing::info!(
            field_id = %definition.id,
            data_type = %definition.data_type,
            "defined custom field"
        );
        Ok(definition)
    }

    #[tracing::instrument(err, skip(self))]
    async fn update(&self, id: Uuid, request: FieldDefinitionRequest) -> Result<FieldDefinition> {
        let spec = request.validate()?;

        let existing = self
            .storage
            .get_field(id)
            .await?
            .ok_or_else(|| CrmError::field_not_found(id))?;

        let data_type_changed = existing.data_type != spec.data_type;
        let definition = self
            .storage
            .update_field(existing.redefine(spec, Utc::now()))
            .await?
            // removed between the lookup and the write
            .ok_or_else(|| CrmError::field_not_found(id))?;

        // cached values may no longer fit the new type or options
        self.cache.forget_field(id);

        tracing::info!(
            field_id = %definition.id,
            data_type = %definition.data_type,
            data_type_changed,
            "updated custom field"
        );
        Ok(definition)
    }

    #[tracing::instrument(err, skip(self))]
    async fn remove(&self, id: Uuid) -> Result<()> {
        if !self.storage.delete_field(id).await? {
            return Err(CrmError::field_not_found(id));
        }
        self.cache.forget_field(id);
        tracing::info!(field_id = %id, "removed custom field");
        Ok(())
    }

    #[tracing::instrument(err, skip(self))]
    async fn list(&self) -> Result<Vec<FieldDefinition>> {
        let definitions = self.storage.list_fields().await?;
        tracing::debug!(count = definitions.len(), "listed custom fields");
        Ok(definitions)
    }

    #[tracing::instrument(err, skip(self))]
    async fn get(&self, id: Uuid) -> Result<FieldDefinition> {
        self.storage
            .get_field(id)
            .await?
            .ok_or_else(|| CrmError::field_not_found(id))
    }
}
