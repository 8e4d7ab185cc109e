use axum::{http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use super::method_not_allowed;

#[derive(Debug, Serialize, ToSchema)]
pub struct Health {
    #[schema(example = "ok")]
    status: String,
    #[schema(example = "payment-processor")]
    service: String,
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Salud",
    responses((status = 200, description = "Service is alive", body = Health))
)]
pub async fn health_check() -> (StatusCode, Json<Health>) {
    (
        StatusCode::OK,
        Json(Health {
            status: "ok".to_string(),
            service: "payment-processor".to_string(),
        }),
    )
}

pub fn health_routes() -> Router {
    Router::new().route("/", get(health_check).fallback(method_not_allowed))
}
