//! Inbound adapters that drive the domain services

pub mod http;

pub use http::{ApiDoc, CrmRouterState, HttpError, crm_router, service_router};
