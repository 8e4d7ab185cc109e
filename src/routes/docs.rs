use axum::{routing::get, Json, Router};
use utoipa::OpenApi;

use crate::error::{ErrorMessage, FieldError, ValidationErrorBody};
use crate::schema::{PaymentRequest, PaymentResponse, PaymentStatus};

use super::{health, method_not_allowed, payment};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Servicio de Procesamiento de Pagos Ficticio",
        description = "Microservicio para simular aprobaciones de pagos.",
        version = "1.0.0"
    ),
    paths(health::health_check, payment::process_payment),
    components(schemas(
        PaymentRequest,
        PaymentResponse,
        PaymentStatus,
        health::Health,
        FieldError,
        ValidationErrorBody,
        ErrorMessage
    )),
    tags(
        (name = "Salud", description = "Liveness"),
        (name = "Pagos", description = "Simulated payment processing")
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn docs_routes() -> Router {
    Router::new().route("/openapi.json", get(openapi_json).fallback(method_not_allowed))
}
