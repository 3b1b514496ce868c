//! `field_values` queries. Reads only return values whose field still exists.

use std::collections::HashMap;

use models_customers::{RawFieldValue, db::FieldValueRow};
use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

/// Insert values for a customer, silently skipping fields that do not exist.
/// Returns the rows that were written, ordered by field id.
pub(super) async fn insert_values(
    conn: &mut PgConnection,
    customer_id: Uuid,
    values: &[RawFieldValue],
) -> Result<Vec<RawFieldValue>, sqlx::Error> {
    if values.is_empty() {
        return Ok(Vec::new());
    }

    let (field_ids, payloads): (Vec<Uuid>, Vec<String>) = values
        .iter()
        .map(|value| (value.field_id, value.value.clone()))
        .unzip();

    let mut stored: Vec<RawFieldValue> = sqlx::query_as::<_, FieldValueRow>(
        r#"
        INSERT INTO field_values (customer_id, field_id, value)
        SELECT $1, input.field_id, input.value
        FROM UNNEST($2::uuid[], $3::text[]) AS input(field_id, value)
        JOIN field_definitions fd ON fd.id = input.field_id
        RETURNING customer_id, field_id, value
        "#,
    )
    .bind(customer_id)
    .bind(&field_ids)
    .bind(&payloads)
    .fetch_all(conn)
    .await?
    .into_iter()
    .map(RawFieldValue::from)
    .collect();

    if stored.len() < values.len() {
        tracing::debug!(
            customer_id = %customer_id,
            submitted = values.len(),
            stored = stored.len(),
            "skipped values for fields that no longer exist"
        );
    }

    stored.sort_by_key(|value| value.field_id);
    Ok(stored)
}

/// Delete-then-insert the full value set of a customer
pub(super) async fn replace_values(
    conn: &mut PgConnection,
    customer_id: Uuid,
    values: &[RawFieldValue],
) -> Result<Vec<RawFieldValue>, sqlx::Error> {
    delete_values(&mut *conn, customer_id).await?;
    insert_values(conn, customer_id, values).await
}

pub(super) async fn get_values(
    executor: impl PgExecutor<'_>,
    customer_id: Uuid,
) -> Result<Vec<RawFieldValue>, sqlx::Error> {
    let rows = sqlx::query_as::<_, FieldValueRow>(
        r#"
        SELECT fv.customer_id, fv.field_id, fv.value
        FROM field_values fv
        JOIN field_definitions fd ON fd.id = fv.field_id
        WHERE fv.customer_id = $1
        ORDER BY fv.field_id
        "#,
    )
    .bind(customer_id)
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(RawFieldValue::from).collect())
}

pub(super) async fn get_values_for_customers(
    executor: impl PgExecutor<'_>,
    customer_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<RawFieldValue>>, sqlx::Error> {
    if customer_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = sqlx::query_as::<_, FieldValueRow>(
        r#"
        SELECT fv.customer_id, fv.field_id, fv.value
        FROM field_values fv
        JOIN field_definitions fd ON fd.id = fv.field_id
        WHERE fv.customer_id = ANY($1)
        ORDER BY fv.customer_id, fv.field_id
        "#,
    )
    .bind(customer_ids)
    .fetch_all(executor)
    .await?;

    let mut grouped: HashMap<Uuid, Vec<RawFieldValue>> = HashMap::new();
    for row in rows {
        grouped
            .entry(row.customer_id)
            .or_default()
            .push(RawFieldValue::from(row));
    }
    Ok(grouped)
}

pub(super) async fn delete_values(
    executor: impl PgExecutor<'_>,
    customer_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM field_values WHERE customer_id = $1")
        .bind(customer_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

pub(super) async fn delete_values_for_field(
    executor: impl PgExecutor<'_>,
    field_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM field_values WHERE field_id = $1")
        .bind(field_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}
