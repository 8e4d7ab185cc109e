use std::sync::Arc;

use axum::Router;
use tower_http::{compression::CompressionLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::error::ApiError;
use crate::simulation::Simulator;

pub mod docs;
pub mod health;
pub mod payment;
pub mod utils;

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Assembles every route of the service with its middleware stack.
pub fn app(simulator: Arc<Simulator>, body_limit: usize) -> Router {
    Router::new()
        .merge(health::health_routes())
        .merge(docs::docs_routes())
        .merge(payment::payment_routes(simulator))
        .fallback(not_found)
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(CompressionLayer::new().gzip(true))
        .layer(TraceLayer::new_for_http())
}
