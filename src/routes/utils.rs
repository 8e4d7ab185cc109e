use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde_json::{json, Value};

use crate::error::{ApiError, FieldError};
use crate::schema::BodySchema;

/// JSON body that has been decoded and checked against its schema.
///
/// Any failure is reported as a `422` listing the offending fields, before
/// the handler runs.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: BodySchema,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await?;
        let value = decode_body(&bytes)?;
        let Some(body) = value.as_object() else {
            return Err(ApiError::Validation(vec![FieldError::not_an_object(&value)]));
        };

        T::from_body(body)
            .map(ValidatedJson)
            .map_err(ApiError::Validation)
    }
}

#[inline]
fn decode_body(bytes: &[u8]) -> Result<Value, ApiError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::Validation(vec![FieldError {
            kind: "missing".to_string(),
            loc: vec![json!("body")],
            msg: "Field required".to_string(),
            input: Value::Null,
            ctx: None,
        }]));
    }
    serde_json::from_slice(bytes).map_err(|err| {
        let offset = char_offset(bytes, err.line(), err.column());
        ApiError::Validation(vec![FieldError::json_invalid(&err, offset)])
    })
}

// serde reports 1-based line/column, callers expect a 0-based character offset
fn char_offset(bytes: &[u8], line: usize, column: usize) -> usize {
    let mut start = 0;
    for _ in 1..line {
        match bytes[start..].iter().position(|b| *b == b'\n') {
            Some(newline) => start += newline + 1,
            None => break,
        }
    }
    let end = (start + column.saturating_sub(1)).min(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_is_missing() {
        let Err(ApiError::Validation(detail)) = decode_body(b"  ") else {
            panic!("empty body must be rejected");
        };
        assert_eq!(detail[0].kind, "missing");
        assert_eq!(detail[0].loc, vec![json!("body")]);
    }

    #[test]
    fn broken_json_is_invalid() {
        let Err(ApiError::Validation(detail)) = decode_body(br#"{"monto": 10,"#) else {
            panic!("broken json must be rejected");
        };
        assert_eq!(detail[0].kind, "json_invalid");
        assert_eq!(detail[0].msg, "JSON decode error");
    }

    #[test]
    fn decode_error_position_is_a_character_offset() {
        // stray `x` at offset 12 on a single line
        let Err(ApiError::Validation(detail)) = decode_body(br#"{"monto": 1,x}"#) else {
            panic!("broken json must be rejected");
        };
        assert_eq!(detail[0].loc, vec![json!("body"), json!(12)]);

        // the column restarts on the second line, the offset does not
        let Err(ApiError::Validation(detail)) = decode_body(b"{\n  \"monto\": 1,\n  x}") else {
            panic!("broken json must be rejected");
        };
        assert_eq!(detail[0].loc, vec![json!("body"), json!(18)]);
    }

    #[test]
    fn offset_counts_characters_not_bytes() {
        let body = "{\"ñ\": 1 x}".as_bytes();
        // `x` is the 9th character but the 10th byte
        assert_eq!(char_offset(body, 1, 10), 8);
        assert_eq!(char_offset(b"ab\ncd", 2, 2), 4);
        assert_eq!(char_offset(b"", 1, 0), 0);
    }
}
