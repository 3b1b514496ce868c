//! `customers` queries. Writes that carry values share one transaction with them.

use models_customers::{Customer, CustomerAttributes, RawFieldValue, db::CustomerRow};
use sqlx::PgPool;
use uuid::Uuid;

use super::{CustomersStorageError, values};

pub(super) async fn insert_customer(
    pool: &PgPool,
    customer: Customer,
    field_values: Vec<RawFieldValue>,
) -> Result<(Customer, Vec<RawFieldValue>), CustomersStorageError> {
    let mut transaction = pool.begin().await?;

    let Customer {
        id,
        attributes,
        created_at,
        updated_at,
    } = customer;

    let row = sqlx::query_as::<_, CustomerRow>(
        r#"
        INSERT INTO customers (id, name, dob, phone, email, occupation, location, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id, name, dob, phone, email, occupation, location, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(&attributes.name)
    .bind(attributes.dob)
    .bind(&attributes.phone)
    .bind(&attributes.email)
    .bind(&attributes.occupation)
    .bind(&attributes.location)
    .bind(created_at)
    .bind(updated_at)
    .fetch_one(&mut *transaction)
    .await?;

    let stored = values::insert_values(&mut transaction, id, &field_values).await?;

    transaction.commit().await?;
    Ok((row.into(), stored))
}

pub(super) async fn update_customer(
    pool: &PgPool,
    id: Uuid,
    attributes: CustomerAttributes,
    field_values: Vec<RawFieldValue>,
) -> Result<Option<(Customer, Vec<RawFieldValue>)>, CustomersStorageError> {
    let mut transaction = pool.begin().await?;

    // the row lock taken here is held until commit, serializing concurrent replaces
    let Some(row) = sqlx::query_as::<_, CustomerRow>(
        r#"
        UPDATE customers
        SET name = $2, dob = $3, phone = $4, email = $5, occupation = $6, location = $7, updated_at = NOW()
        WHERE id = $1
        RETURNING id, name, dob, phone, email, occupation, location, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(&attributes.name)
    .bind(attributes.dob)
    .bind(&attributes.phone)
    .bind(&attributes.email)
    .bind(&attributes.occupation)
    .bind(&attributes.location)
    .fetch_optional(&mut *transaction)
    .await?
    else {
        return Ok(None);
    };

    let stored = values::replace_values(&mut transaction, id, &field_values).await?;

    transaction.commit().await?;
    Ok(Some((row.into(), stored)))
}

pub(super) async fn get_customer(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<Customer>, CustomersStorageError> {
    let row = sqlx::query_as::<_, CustomerRow>(
        r#"
        SELECT id, name, dob, phone, email, occupation, location, created_at, updated_at
        FROM customers
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Customer::from))
}

pub(super) async fn list_customers(pool: &PgPool) -> Result<Vec<Customer>, CustomersStorageError> {
    let rows = sqlx::query_as::<_, CustomerRow>(
        r#"
        SELECT id, name, dob, phone, email, occupation, location, created_at, updated_at
        FROM customers
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Customer::from).collect())
}

pub(super) async fn search_customers(
    pool: &PgPool,
    term: &str,
) -> Result<Vec<Customer>, CustomersStorageError> {
    let pattern = format!("%{}%", escape_like(term));

    let rows = sqlx::query_as::<_, CustomerRow>(
        r#"
        SELECT id, name, dob, phone, email, occupation, location, created_at, updated_at
        FROM customers
        WHERE name ILIKE $1 ESCAPE '\'
            OR phone ILIKE $1 ESCAPE '\'
            OR email ILIKE $1 ESCAPE '\'
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(pattern)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Customer::from).collect())
}

pub(super) async fn delete_customer(pool: &PgPool, id: Uuid) -> Result<bool, CustomersStorageError> {
    let mut transaction = pool.begin().await?;

    values::delete_values(&mut *transaction, id).await?;

    let deleted = sqlx::query("DELETE FROM customers WHERE id = $1")
        .bind(id)
        .execute(&mut *transaction)
        .await?
        .rows_affected();

    transaction.commit().await?;
    Ok(deleted > 0)
}

/// Escape LIKE metacharacters so the term only ever matches literally
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
