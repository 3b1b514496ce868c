use anyhow::Context;
use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
};
use config::Config;
use crm_entrypoint::Entrypoint;
use customers_db_migrator::CUSTOMERS_DB_MIGRATIONS;
use customers_service::{
    domain::{
        ports::{CustomerAggregateService, FieldRegistryService},
        services::{CustomerAggregateImpl, FieldRegistryImpl},
    },
    inbound::{CrmRouterState, crm_router, service_router},
    outbound::{CustomersPgStorage, InMemoryCustomerCache, NoCustomerCache},
};
use sqlx::postgres::PgPoolOptions;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

mod config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    Entrypoint::default().init();

    // Parse our configuration from the environment.
    let config = Config::from_env().context("expected to be able to generate config")?;

    tracing::info!("initialized config");

    let (min_connections, max_connections) = config.pool_size();

    let db = PgPoolOptions::new()
        .min_connections(min_connections)
        .max_connections(max_connections)
        .acquire_timeout(config.database_acquire_timeout)
        .connect(&config.database_url)
        .await
        .context("could not connect to customers db")?;

    tracing::info!(
        min_connections,
        max_connections,
        "initialized customers db connection"
    );

    if config.run_migrations {
        CUSTOMERS_DB_MIGRATIONS
            .run(&db)
            .await
            .context("failed to run customers db migrations")?;
        tracing::info!("applied customers db migrations");
    }

    let storage = CustomersPgStorage::new(db);

    if config.customer_cache_enabled {
        let cache = InMemoryCustomerCache::new();
        let fields = FieldRegistryImpl::new(storage.clone(), cache.clone());
        let customers =
            CustomerAggregateImpl::new(storage.clone(), storage.clone(), storage, cache);
        serve(config, fields, customers).await
    } else {
        let fields = FieldRegistryImpl::new(storage.clone(), NoCustomerCache);
        let customers =
            CustomerAggregateImpl::new(storage.clone(), storage.clone(), storage, NoCustomerCache);
        serve(config, fields, customers).await
    }
}

async fn serve<F, C>(config: Config, fields: F, customers: C) -> anyhow::Result<()>
where
    F: FieldRegistryService,
    C: CustomerAggregateService,
{
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_origin(Any);

    let app: Router = crm_router(CrmRouterState::new(fields, customers))
        .layer(TraceLayer::new_for_http())
        .merge(service_router())
        .layer(cors);

    let bind_address = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind to address {}", bind_address))?;

    tracing::info!(
        environment = %config.environment,
        port = config.port,
        cache = config.customer_cache_enabled,
        "customers service is up and running"
    );

    axum::serve(listener, app.into_make_service())
        .await
        .context("error running axum server")
}
