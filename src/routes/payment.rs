use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect},
    routing::{any, post},
    Json, Router,
};

use crate::error::{ErrorMessage, ValidationErrorBody};
use crate::schema::{PaymentRequest, PaymentResponse};
use crate::simulation::Simulator;

use super::{method_not_allowed, utils::ValidatedJson};

/// Simulates processing a payment.
///
/// Receives the amount and the card token.
#[utoipa::path(
    post,
    path = "/process/",
    tag = "Pagos",
    request_body = PaymentRequest,
    responses(
        (status = 200, description = "Simulated processor answer", body = PaymentResponse),
        (status = 405, description = "Method not allowed", body = ErrorMessage),
        (status = 422, description = "Validation error", body = ValidationErrorBody)
    )
)]
pub async fn process_payment(
    State(simulator): State<Arc<Simulator>>,
    ValidatedJson(req): ValidatedJson<PaymentRequest>,
) -> impl IntoResponse {
    let response = simulator.process(&req).await;
    (StatusCode::OK, Json(response))
}

// `/process` answers with a 307 so the method and body are replayed on `/process/`
async fn redirect_to_slash() -> Redirect {
    Redirect::temporary("/process/")
}

pub fn payment_routes(simulator: Arc<Simulator>) -> Router {
    Router::new()
        .route(
            "/process/",
            post(process_payment).fallback(method_not_allowed),
        )
        .route("/process", any(redirect_to_slash))
        .with_state(simulator)
}
