//! Schema synchronization: keeps the physical storage shape in line with the field registry.

use models_customers::FieldDefinition;
use sqlx::PgConnection;
use uuid::Uuid;

use super::values;

/// Applies the storage-shape change that accompanies a field definition write.
///
/// Every hook runs on the caller's open transaction, so a failure here rolls back
/// the definition write as well.
pub trait SchemaSynchronizer: Send + Sync + 'static {
    /// Prepare storage for a newly defined field
    fn provision(
        &self,
        conn: &mut PgConnection,
        definition: &FieldDefinition,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;

    /// Adapt storage after a field's data type changed
    fn migrate(
        &self,
        conn: &mut PgConnection,
        previous: &FieldDefinition,
        next: &FieldDefinition,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;

    /// Remove every trace of a field before its definition is deleted
    fn decommission(
        &self,
        conn: &mut PgConnection,
        field_id: Uuid,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
}

/// Entity-attribute-value storage: values are rows of `field_values`, so the
/// physical schema never changes at runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct EavSynchronizer;

impl SchemaSynchronizer for EavSynchronizer {
    async fn provision(
        &self,
        _conn: &mut PgConnection,
        definition: &FieldDefinition,
    ) -> Result<(), sqlx::Error> {
        tracing::debug!(field_id = %definition.id, "eav storage needs no provisioning");
        Ok(())
    }

    async fn migrate(
        &self,
        _conn: &mut PgConnection,
        previous: &FieldDefinition,
        next: &FieldDefinition,
    ) -> Result<(), sqlx::Error> {
        // stored payloads are reinterpreted under the new type on read
        tracing::debug!(
            field_id = %next.id,
            from = %previous.data_type,
            to = %next.data_type,
            "eav storage needs no migration"
        );
        Ok(())
    }

    #[tracing::instrument(err, skip(self, conn))]
    async fn decommission(&self, conn: &mut PgConnection, field_id: Uuid) -> Result<(), sqlx::Error> {
        let removed = values::delete_values_for_field(conn, field_id).await?;
        tracing::debug!(removed, "removed values of decommissioned field");
        Ok(())
    }
}
