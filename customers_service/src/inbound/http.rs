//! HTTP inbound adapters - thin wrappers around domain services

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use models_customers::{
    CustomerRecord, FieldDefinition,
    api::{
        CustomerListResponse, CustomerQueryParams, CustomerRequest, ErrorResponse,
        FieldDefinitionListResponse, FieldDefinitionRequest,
    },
};
use serde_json::{Value, json};
use thiserror::Error;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::domain::{
    error::CrmError,
    ports::{CustomerAggregateService, FieldRegistryService},
};


const INTERNAL_ERROR_MESSAGE: &str = "An internal server error has occurred";

// ===== State and Router =====

pub struct CrmRouterState<F, C> {
    fields: Arc<F>,
    customers: Arc<C>,
}

impl<F, C> Clone for CrmRouterState<F, C> {
    fn clone(&self) -> Self {
        Self {
            fields: self.fields.clone(),
            customers: self.customers.clone(),
        }
    }
}

impl<F, C> CrmRouterState<F, C>
where
    F: FieldRegistryService,
    C: CustomerAggregateService,
{
    pub fn new(fields: F, customers: C) -> Self {
        CrmRouterState {
            fields: Arc::new(fields),
            customers: Arc::new(customers),
        }
    }
}

/// Routes for field definitions and customers
pub fn crm_router<F, C, S>(state: CrmRouterState<F, C>) -> Router<S>
where
    F: FieldRegistryService,
    C: CustomerAggregateService,
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route(
            "/fields",
            get(list_fields::<F, C>).post(define_field::<F, C>),
        )
        .route(
            "/fields/{id}",
            get(get_field::<F, C>)
                .put(update_field::<F, C>)
                .delete(remove_field::<F, C>),
        )
        .route(
            "/customers",
            get(list_customers::<F, C>).post(create_customer::<F, C>),
        )
        .route(
            "/customers/{id}",
            get(get_customer::<F, C>)
                .put(update_customer::<F, C>)
                .delete(delete_customer::<F, C>),
        )
        .with_state(state)
}

/// Liveness and the generated OpenAPI document
pub fn service_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/api-doc/openapi.json", get(openapi))
}

#[tracing::instrument]
async fn health() -> Json<Value> {
    tracing::debug!("health check requested");
    Json(json!({
        "status": "ok",
        "service": "customers_service"
    }))
}

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

// ===== Error Handling =====

#[derive(Debug, Error)]
#[error(transparent)]
pub struct HttpError(#[from] CrmError);

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CrmError::Validation(_) => StatusCode::BAD_REQUEST,
            CrmError::NotFound { .. } => StatusCode::NOT_FOUND,
            CrmError::Conflict(_) => StatusCode::CONFLICT,
            CrmError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = if status.is_server_error() {
            tracing::error!(error = ?self.0, "request failed");
            INTERNAL_ERROR_MESSAGE.to_string()
        } else {
            self.0.to_string()
        };

        (status, Json(ErrorResponse { message: &message })).into_response()
    }
}

// ===== Field Handlers =====

/// List custom field definitions in insertion order
#[utoipa::path(
    get,
    tag = "fields",
    path = "/fields",
    responses(
        (status = 200, body = FieldDefinitionListResponse),
        (status = 500, body = ErrorResponse),
    )
)]
#[tracing::instrument(err, skip(state))]
pub async fn list_fields<F, C>(
    State(state): State<CrmRouterState<F, C>>,
) -> Result<Json<FieldDefinitionListResponse>, HttpError>
where
    F: FieldRegistryService,
    C: CustomerAggregateService,
{
    let fields = state.fields.list().await?;
    Ok(Json(FieldDefinitionListResponse { fields }))
}

/// Define a new custom field
#[utoipa::path(
    post,
    tag = "fields",
    path = "/fields",
    request_body = FieldDefinitionRequest,
    responses(
        (status = 201, body = FieldDefinition),
        (status = 400, body = ErrorResponse),
        (status = 500, body = ErrorResponse),
    )
)]
#[tracing::instrument(err, skip(state))]
pub async fn define_field<F, C>(
    State(state): State<CrmRouterState<F, C>>,
    Json(request): Json<FieldDefinitionRequest>,
) -> Result<(StatusCode, Json<FieldDefinition>), HttpError>
where
    F: FieldRegistryService,
    C: CustomerAggregateService,
{
    let definition = state.fields.define(request).await?;
    Ok((StatusCode::CREATED, Json(definition)))
}

/// Get a single custom field definition
#[utoipa::path(
    get,
    tag = "fields",
    path = "/fields/{id}",
    params(("id" = Uuid, Path, description = "Field definition id")),
    responses(
        (status = 200, body = FieldDefinition),
        (status = 404, body = ErrorResponse),
        (status = 500, body = ErrorResponse),
    )
)]
#[tracing::instrument(err, skip(state))]
pub async fn get_field<F, C>(
    State(state): State<CrmRouterState<F, C>>,
    Path(id): Path<Uuid>,
) -> Result<Json<FieldDefinition>, HttpError>
where
    F: FieldRegistryService,
    C: CustomerAggregateService,
{
    Ok(Json(state.fields.get(id).await?))
}

/// Redefine a custom field. Stored values are kept as they are.
#[utoipa::path(
    put,
    tag = "fields",
    path = "/fields/{id}",
    params(("id" = Uuid, Path, description = "Field definition id")),
    request_body = FieldDefinitionRequest,
    responses(
        (status = 200, body = FieldDefinition),
        (status = 400, body = ErrorResponse),
        (status = 404, body = ErrorResponse),
        (status = 409, body = ErrorResponse),
        (status = 500, body = ErrorResponse),
    )
)]
#[tracing::instrument(err, skip(state))]
pub async fn update_field<F, C>(
    State(state): State<CrmRouterState<F, C>>,
    Path(id): Path<Uuid>,
    Json(request): Json<FieldDefinitionRequest>,
) -> Result<Json<FieldDefinition>, HttpError>
where
    F: FieldRegistryService,
    C: CustomerAggregateService,
{
    Ok(Json(state.fields.update(id, request).await?))
}

/// Remove a custom field together with every value stored for it
#[utoipa::path(
    delete,
    tag = "fields",
    path = "/fields/{id}",
    params(("id" = Uuid, Path, description = "Field definition id")),
    responses(
        (status = 204),
        (status = 404, body = ErrorResponse),
        (status = 500, body = ErrorResponse),
    )
)]
#[tracing::instrument(err, skip(state))]
pub async fn remove_field<F, C>(
    State(state): State<CrmRouterState<F, C>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, HttpError>
where
    F: FieldRegistryService,
    C: CustomerAggregateService,
{
    state.fields.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ===== Customer Handlers =====

/// List customers newest first, optionally filtered by a search term
#[utoipa::path(
    get,
    tag = "customers",
    path = "/customers",
    params(CustomerQueryParams),
    responses(
        (status = 200, body = CustomerListResponse),
        (status = 500, body = ErrorResponse),
    )
)]
#[tracing::instrument(err, skip(state))]
pub async fn list_customers<F, C>(
    State(state): State<CrmRouterState<F, C>>,
    Query(params): Query<CustomerQueryParams>,
) -> Result<Json<CustomerListResponse>, HttpError>
where
    F: FieldRegistryService,
    C: CustomerAggregateService,
{
    let customers = match params.search_term() {
        Some(term) => state.customers.search(term).await?,
        None => state.customers.list().await?,
    };
    Ok(Json(CustomerListResponse { customers }))
}

/// Create a customer with its custom field values
#[utoipa::path(
    post,
    tag = "customers",
    path = "/customers",
    request_body = CustomerRequest,
    responses(
        (status = 201, body = CustomerRecord),
        (status = 400, body = ErrorResponse),
        (status = 409, body = ErrorResponse),
        (status = 500, body = ErrorResponse),
    )
)]
#[tracing::instrument(err, skip(state, request))]
pub async fn create_customer<F, C>(
    State(state): State<CrmRouterState<F, C>>,
    Json(request): Json<CustomerRequest>,
) -> Result<(StatusCode, Json<CustomerRecord>), HttpError>
where
    F: FieldRegistryService,
    C: CustomerAggregateService,
{
    let record = state.customers.create(request).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Get a customer with its current custom field values
#[utoipa::path(
    get,
    tag = "customers",
    path = "/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer id")),
    responses(
        (status = 200, body = CustomerRecord),
        (status = 404, body = ErrorResponse),
        (status = 500, body = ErrorResponse),
    )
)]
#[tracing::instrument(err, skip(state))]
pub async fn get_customer<F, C>(
    State(state): State<CrmRouterState<F, C>>,
    Path(id): Path<Uuid>,
) -> Result<Json<CustomerRecord>, HttpError>
where
    F: FieldRegistryService,
    C: CustomerAggregateService,
{
    Ok(Json(state.customers.get(id).await?))
}

/// Replace a customer. Custom values missing from the body are cleared.
#[utoipa::path(
    put,
    tag = "customers",
    path = "/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer id")),
    request_body = CustomerRequest,
    responses(
        (status = 200, body = CustomerRecord),
        (status = 400, body = ErrorResponse),
        (status = 404, body = ErrorResponse),
        (status = 409, body = ErrorResponse),
        (status = 500, body = ErrorResponse),
    )
)]
#[tracing::instrument(err, skip(state, request))]
pub async fn update_customer<F, C>(
    State(state): State<CrmRouterState<F, C>>,
    Path(id): Path<Uuid>,
    Json(request): Json<CustomerRequest>,
) -> Result<Json<CustomerRecord>, HttpError>
where
    F: FieldRegistryService,
    C: CustomerAggregateService,
{
    Ok(Json(state.customers.update(id, request).await?))
}

/// Delete a customer and its custom field values
#[utoipa::path(
    delete,
    tag = "customers",
    path = "/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer id")),
    responses(
        (status = 204),
        (status = 404, body = ErrorResponse),
        (status = 500, body = ErrorResponse),
    )
)]
#[tracing::instrument(err, skip(state))]
pub async fn delete_customer<F, C>(
    State(state): State<CrmRouterState<F, C>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, HttpError>
where
    F: FieldRegistryService,
    C: CustomerAggregateService,
{
    state.customers.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ===== OpenAPI =====

#[derive(OpenApi)]
#[openapi(
    paths(
        list_fields,
        define_field,
        get_field,
        update_field,
        remove_field,
        list_customers,
        create_customer,
        get_customer,
        update_customer,
        delete_customer,
    ),
    components(schemas(
        FieldDefinitionRequest,
        models_customers::api::FieldOptionsInput,
        FieldDefinition,
        FieldDefinitionListResponse,
        models_customers::DataType,
        CustomerRequest,
        CustomerRecord,
        models_customers::CustomerAttributes,
        models_customers::FieldValue,
        CustomerListResponse,
        ErrorResponse,
    )),
    tags(
        (name = "fields", description = "Custom field definitions"),
        (name = "customers", description = "Customers and their custom field values"),
    )
)]
pub struct ApiDoc;
