//! The sole responsibility of this crate is to expose the statically imported sql migrations for the customers db.
//!
//! Keeping them out of customers_service lets tests and tooling run migrations without pulling in the service.
pub static CUSTOMERS_DB_MIGRATIONS: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
