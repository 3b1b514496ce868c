//! `field_definitions` queries. Writes run in one transaction with the schema synchronizer.

use models_customers::{FieldDefinition, db::FieldDefinitionRow};
use sqlx::PgPool;
use uuid::Uuid;

use super::{CustomersStorageError, schema::SchemaSynchronizer};

pub(super) async fn list_fields(pool: &PgPool) -> Result<Vec<FieldDefinition>, CustomersStorageError> {
    let rows = sqlx::query_as::<_, FieldDefinitionRow>(
        r#"
        SELECT id, name, data_type, options_json, created_at, updated_at
        FROM field_definitions
        ORDER BY created_at, id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(FieldDefinition::try_from)
        .collect::<Result<Vec<_>, _>>()?)
}

pub(super) async fn get_field(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<FieldDefinition>, CustomersStorageError> {
    let row = sqlx::query_as::<_, FieldDefinitionRow>(
        r#"
        SELECT id, name, data_type, options_json, created_at, updated_at
        FROM field_definitions
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(FieldDefinition::try_from).transpose()?)
}

pub(super) async fn insert_field<Y: SchemaSynchronizer>(
    pool: &PgPool,
    synchronizer: &Y,
    definition: FieldDefinition,
) -> Result<FieldDefinition, CustomersStorageError> {
    let mut transaction = pool.begin().await?;

    let row = sqlx::query_as::<_, FieldDefinitionRow>(
        r#"
        INSERT INTO field_definitions (id, name, data_type, options_json, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, name, data_type, options_json, created_at, updated_at
        "#,
    )
    .bind(definition.id)
    .bind(&definition.name)
    .bind(definition.data_type.to_string())
    .bind(definition.options_json())
    .bind(definition.created_at)
    .bind(definition.updated_at)
    .fetch_one(&mut *transaction)
    .await?;

    let stored = FieldDefinition::try_from(row)?;
    synchronizer.provision(&mut transaction, &stored).await?;

    transaction.commit().await?;
    Ok(stored)
}

pub(super) async fn update_field<Y: SchemaSynchronizer>(
    pool: &PgPool,
    synchronizer: &Y,
    definition: FieldDefinition,
) -> Result<Option<FieldDefinition>, CustomersStorageError> {
    let mut transaction = pool.begin().await?;

    // the row lock serializes concurrent edits of one field
    let Some(previous) = sqlx::query_as::<_, FieldDefinitionRow>(
        r#"
        SELECT id, name, data_type, options_json, created_at, updated_at
        FROM field_definitions
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(definition.id)
    .fetch_optional(&mut *transaction)
    .await?
    else {
        return Ok(None);
    };
    let previous = FieldDefinition::try_from(previous)?;

    let row = sqlx::query_as::<_, FieldDefinitionRow>(
        r#"
        UPDATE field_definitions
        SET name = $2, data_type = $3, options_json = $4, updated_at = $5
        WHERE id = $1
        RETURNING id, name, data_type, options_json, created_at, updated_at
        "#,
    )
    .bind(definition.id)
    .bind(&definition.name)
    .bind(definition.data_type.to_string())
    .bind(definition.options_json())
    .bind(definition.updated_at)
    .fetch_one(&mut *transaction)
    .await?;
    let next = FieldDefinition::try_from(row)?;

    if previous.data_type != next.data_type {
        synchronizer.migrate(&mut transaction, &previous, &next).await?;
    }

    transaction.commit().await?;
    Ok(Some(next))
}

pub(super) async fn delete_field<Y: SchemaSynchronizer>(
    pool: &PgPool,
    synchronizer: &Y,
    id: Uuid,
) -> Result<bool, CustomersStorageError> {
    let mut transaction = pool.begin().await?;

    let exists = sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM field_definitions WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *transaction)
    .await?
    .is_some();

    if !exists {
        return Ok(false);
    }

    // values go first so no committed state ever references a missing definition
    synchronizer.decommission(&mut transaction, id).await?;

    sqlx::query("DELETE FROM field_definitions WHERE id = $1")
        .bind(id)
        .execute(&mut *transaction)
        .await?;

    transaction.commit().await?;
    Ok(true)
}
