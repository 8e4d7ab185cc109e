use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::FieldError;

/// A request body that can be read field by field out of a JSON object,
/// reporting every problem it finds instead of stopping at the first one.
pub trait BodySchema: Sized {
    fn from_body(body: &Map<String, Value>) -> Result<Self, Vec<FieldError>>;
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaymentRequest {
    /// Payment amount, must be positive.
    #[schema(exclusive_minimum = 0.0, example = 100.0)]
    pub monto: f64,
    /// Secure token of the card.
    #[schema(min_length = 16, example = "abcdefghijklmnop")]
    pub token_hash: String,
}

// Fields that decoded to the right type, checked before a request is built
#[derive(Debug, Default, Validate)]
struct PaymentForm {
    #[validate(range(exclusive_min = 0.0))]
    monto: Option<f64>,
    #[validate(length(min = 16))]
    token_hash: Option<String>,
}

const PAYMENT_FIELDS: [&str; 2] = ["monto", "token_hash"];

impl BodySchema for PaymentRequest {
    fn from_body(body: &Map<String, Value>) -> Result<Self, Vec<FieldError>> {
        let mut errors = Vec::new();
        let form = PaymentForm {
            monto: number_field(body, "monto", &mut errors),
            token_hash: string_field(body, "token_hash", &mut errors),
        };
        if let Err(invalid) = form.validate() {
            errors.extend(FieldError::from_validation_errors(&invalid));
        }

        match (form.monto, form.token_hash) {
            (Some(monto), Some(token_hash)) if errors.is_empty() => {
                Ok(PaymentRequest { monto, token_hash })
            }
            _ => {
                // report in declaration order
                errors.sort_by_key(|err| {
                    let field = err.loc.get(1).and_then(Value::as_str);
                    PAYMENT_FIELDS
                        .iter()
                        .position(|name| Some(*name) == field)
                        .unwrap_or(PAYMENT_FIELDS.len())
                });
                Err(errors)
            }
        }
    }
}

/// Reads a float the lax way: JSON numbers and numeric strings are accepted.
fn number_field(
    body: &Map<String, Value>,
    field: &'static str,
    errors: &mut Vec<FieldError>,
) -> Option<f64> {
    let value = match body.get(field) {
        Some(value) => value,
        None => {
            errors.push(FieldError::missing(field, &Value::Object(body.clone())));
            return None;
        }
    };
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(n) => Some(n),
            Err(_) => {
                errors.push(FieldError::invalid(
                    "float_parsing",
                    field,
                    "Input should be a valid number, unable to parse string as a number",
                    value,
                ));
                return None;
            }
        },
        _ => {
            errors.push(FieldError::invalid(
                "float_type",
                field,
                "Input should be a valid number",
                value,
            ));
            return None;
        }
    };
    match parsed {
        Some(n) if n.is_finite() => Some(n),
        _ => {
            errors.push(FieldError::invalid(
                "finite_number",
                field,
                "Input should be a finite number",
                value,
            ));
            None
        }
    }
}

fn string_field(
    body: &Map<String, Value>,
    field: &'static str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match body.get(field) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(value) => {
            errors.push(FieldError::invalid(
                "string_type",
                field,
                "Input should be a valid string",
                value,
            ));
            None
        }
        None => {
            errors.push(FieldError::missing(field, &Value::Object(body.clone())));
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    Approved,
    Rejected,
}

impl PaymentStatus {
    pub fn message(&self) -> &'static str {
        match self {
            PaymentStatus::Approved => "Pago aprobado.",
            PaymentStatus::Rejected => "Pago rechazado (Simulación de fallo 20%).",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentResponse {
    /// 'APPROVED' or 'REJECTED'.
    #[serde(rename = "estado")]
    pub status: PaymentStatus,
    /// Unique id of the generated transaction.
    #[serde(rename = "transaccion_id")]
    pub transaction_id: Uuid,
    /// Message from the processor.
    #[serde(rename = "mensaje")]
    pub message: String,
}

impl PaymentResponse {
    pub fn new(status: PaymentStatus, transaction_id: Uuid) -> Self {
        Self {
            status,
            transaction_id,
            message: status.message().to_string(),
        }
    }
}
