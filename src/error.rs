use axum::{
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use utoipa::ToSchema;
use validator::{ValidationError, ValidationErrors};

/// One entry of a `422` response body.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FieldError {
    #[serde(rename = "type")]
    pub kind: String,
    #[schema(value_type = Vec<Object>)]
    pub loc: Vec<Value>,
    pub msg: String,
    #[schema(value_type = Object)]
    pub input: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub ctx: Option<Value>,
}

/// Body of a `422` response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ValidationErrorBody {
    pub detail: Vec<FieldError>,
}

/// Body of a `404` or `405` response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorMessage {
    pub detail: String,
}

impl FieldError {
    pub fn missing(field: &str, body: &Value) -> Self {
        Self {
            kind: "missing".to_string(),
            loc: vec![json!("body"), json!(field)],
            msg: "Field required".to_string(),
            input: body.clone(),
            ctx: None,
        }
    }

    /// `offset` is the 0-based character position of the decode error.
    pub fn json_invalid(err: &serde_json::Error, offset: usize) -> Self {
        Self {
            kind: "json_invalid".to_string(),
            loc: vec![json!("body"), json!(offset)],
            msg: "JSON decode error".to_string(),
            input: json!({}),
            ctx: Some(json!({ "error": err.to_string() })),
        }
    }

    pub fn not_an_object(body: &Value) -> Self {
        Self {
            kind: "model_attributes_type".to_string(),
            loc: vec![json!("body")],
            msg: "Input should be a valid dictionary or object to extract fields from".to_string(),
            input: body.clone(),
            ctx: None,
        }
    }

    pub fn invalid(kind: &str, field: &str, msg: &str, input: &Value) -> Self {
        Self {
            kind: kind.to_string(),
            loc: vec![json!("body"), json!(field)],
            msg: msg.to_string(),
            input: input.clone(),
            ctx: None,
        }
    }

    pub fn from_validation_errors(errors: &ValidationErrors) -> Vec<Self> {
        errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                let field = field.to_string();
                errs.iter()
                    .map(move |err| FieldError::from_validation(&field, err))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    fn from_validation(field: &str, err: &ValidationError) -> Self {
        let input = err.params.get("value").cloned().unwrap_or(Value::Null);
        let loc = vec![json!("body"), json!(field)];
        match &*err.code {
            "range" => {
                let (kind, op, bound) = if let Some(bound) = err.params.get("exclusive_min") {
                    ("greater_than", "greater than", bound.clone())
                } else if let Some(bound) = err.params.get("min") {
                    ("greater_than_equal", "greater than or equal to", bound.clone())
                } else if let Some(bound) = err.params.get("exclusive_max") {
                    ("less_than", "less than", bound.clone())
                } else {
                    let bound = err.params.get("max").cloned().unwrap_or(Value::Null);
                    ("less_than_equal", "less than or equal to", bound)
                };
                let ctx_key = match kind {
                    "greater_than" => "gt",
                    "greater_than_equal" => "ge",
                    "less_than" => "lt",
                    _ => "le",
                };
                Self {
                    kind: kind.to_string(),
                    loc,
                    msg: format!("Input should be {op} {}", display_number(&bound)),
                    input,
                    ctx: Some(json!({ ctx_key: bound })),
                }
            }
            "length" => {
                let min = err.params.get("min").cloned().unwrap_or(Value::Null);
                Self {
                    kind: "string_too_short".to_string(),
                    loc,
                    msg: format!("String should have at least {min} characters"),
                    input,
                    ctx: Some(json!({ "min_length": min })),
                }
            }
            code => Self {
                kind: code.to_string(),
                loc,
                msg: err
                    .message
                    .as_ref()
                    .map(|msg| msg.to_string())
                    .unwrap_or_else(|| format!("Value error, {code}")),
                input,
                ctx: None,
            },
        }
    }
}

// `0.0` reads as `0` in messages
fn display_number(value: &Value) -> String {
    match value.as_f64() {
        Some(n) if n.fract() == 0.0 => format!("{}", n as i64),
        Some(n) => n.to_string(),
        None => value.to_string(),
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request validation failed with {} error(s)", .0.len())]
    Validation(Vec<FieldError>),
    #[error(transparent)]
    Body(#[from] BytesRejection),
    #[error("not found")]
    NotFound,
    #[error("method not allowed")]
    MethodNotAllowed,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(detail) => {
                tracing::warn!(errors = detail.len(), "Rejected invalid payment request");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(ValidationErrorBody { detail }),
                )
                    .into_response()
            }
            ApiError::Body(rejection) => {
                tracing::warn!("Failed to read request body: {rejection}");
                rejection.into_response()
            }
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(ErrorMessage {
                    detail: "Not Found".to_string(),
                }),
            )
                .into_response(),
            ApiError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                Json(ErrorMessage {
                    detail: "Method Not Allowed".to_string(),
                }),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::*;

    #[test]
    fn exclusive_min_reads_as_greater_than() {
        let mut err = ValidationError::new("range");
        err.add_param(Cow::from("exclusive_min"), &0.0);
        err.add_param(Cow::from("value"), &-5.0);
        let field = FieldError::from_validation("monto", &err);
        assert_eq!(field.kind, "greater_than");
        assert_eq!(field.msg, "Input should be greater than 0");
        assert_eq!(field.loc, vec![json!("body"), json!("monto")]);
        assert_eq!(field.input, json!(-5.0));
        assert_eq!(field.ctx, Some(json!({ "gt": 0.0 })));
    }

    #[test]
    fn length_reads_as_string_too_short() {
        let mut err = ValidationError::new("length");
        err.add_param(Cow::from("min"), &16);
        err.add_param(Cow::from("value"), &"short");
        let field = FieldError::from_validation("token_hash", &err);
        assert_eq!(field.kind, "string_too_short");
        assert_eq!(field.msg, "String should have at least 16 characters");
        assert_eq!(field.ctx, Some(json!({ "min_length": 16 })));
    }

    #[test]
    fn missing_field_points_at_field() {
        let body = json!({ "token_hash": "abcdefghijklmnop" });
        let field = FieldError::missing("monto", &body);
        let rendered = serde_json::to_value(&field).unwrap();
        assert_eq!(rendered["type"], "missing");
        assert_eq!(rendered["loc"], json!(["body", "monto"]));
        assert_eq!(rendered["msg"], "Field required");
        assert!(rendered.get("ctx").is_none());
    }

    #[test]
    fn validation_errors_render_as_unprocessable() {
        let res = ApiError::Validation(vec![]).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(ApiError::NotFound.into_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::MethodNotAllowed.into_response().status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
    }
}
