//! Opaque pagination tokens.
//!
//! A token is the URL-safe base64 form of `{"id": .., "value": ..}` where
//! `value` is the ordering key (`created_at`) of the last row on a page and
//! `id` is that row's tiebreak. Decoding validates structure only.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cursor {
    pub id: String,
    pub value: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CursorError {
    #[error("cursor is not valid base64")]
    Encoding,

    #[error("cursor does not contain a JSON object")]
    Payload,

    #[error("cursor is missing a non-empty id")]
    MissingId,

    #[error("cursor is missing a scalar value")]
    MissingValue,
}

impl Cursor {
    pub fn new(id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
        }
    }

    pub fn encode(&self) -> String {
        encode(&self.id, &self.value)
    }
}

pub fn encode(id: &str, value: &str) -> String {
    let payload = serde_json::json!({ "id": id, "value": value });
    URL_SAFE_NO_PAD.encode(payload.to_string())
}

pub fn decode(token: &str) -> Result<Cursor, CursorError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(token.trim())
        .map_err(|_| CursorError::Encoding)?;

    let payload: Value = serde_json::from_slice(&bytes).map_err(|_| CursorError::Payload)?;
    let object = payload.as_object().ok_or(CursorError::Payload)?;

    let id = match object.get("id") {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        _ => return Err(CursorError::MissingId),
    };

    let value = object
        .get("value")
        .ok_or(CursorError::MissingValue)
        .and_then(coerce_value)?;

    Ok(Cursor { id, value })
}

// Falsy scalars collapse to the empty string. Whole floats print without a
// fraction (`1.0` becomes "1"); other floats use Rust's shortest form, which
// differs from JavaScript only in exponent notation.
fn coerce_value(value: &Value) -> Result<String, CursorError> {
    match value {
        Value::Null | Value::Bool(false) => Ok(String::new()),
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => Ok(String::new()),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => {
                Ok(format!("{:.0}", f))
            }
            _ => Ok(n.to_string()),
        },
        Value::Bool(true) => Ok("true".to_string()),
        Value::Array(_) | Value::Object(_) => Err(CursorError::MissingValue),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_token(json: &str) -> String {
        URL_SAFE_NO_PAD.encode(json)
    }

    #[test]
    fn test_round_trip() {
        let cases = [
            ("a1", "2025-01-01T00:00:00.000Z"),
            ("0f5c2e9a-6f57-4a43-9d55-0b7d1c2b9b11", "2024-12-31T23:59:59.999Z"),
            ("課題", "値 with spaces & \"quotes\""),
            ("x", ""),
        ];

        for (id, value) in cases {
            let token = encode(id, value);
            let cursor = decode(&token).expect("token should decode");
            assert_eq!(cursor, Cursor::new(id, value));
        }
    }

    #[test]
    fn test_token_is_url_safe() {
        let token = encode("id/with+chars?", "value=with&stuff");
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_encoding_is_deterministic() {
        assert_eq!(encode("a", "b"), encode("a", "b"));
        assert_eq!(Cursor::new("a", "b").encode(), encode("a", "b"));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(decode("not-base64-json").is_err());
        assert_eq!(decode("%%%"), Err(CursorError::Encoding));
        assert_eq!(decode(&raw_token("not json")), Err(CursorError::Payload));
        assert_eq!(decode(&raw_token("[1,2]")), Err(CursorError::Payload));
    }

    #[test]
    fn test_rejects_missing_fields() {
        assert_eq!(
            decode(&raw_token(r#"{"value":"2025-01-01"}"#)),
            Err(CursorError::MissingId)
        );
        assert_eq!(
            decode(&raw_token(r#"{"id":"","value":"2025-01-01"}"#)),
            Err(CursorError::MissingId)
        );
        assert_eq!(
            decode(&raw_token(r#"{"id":7,"value":"2025-01-01"}"#)),
            Err(CursorError::MissingId)
        );
        assert_eq!(
            decode(&raw_token(r#"{"id":"a"}"#)),
            Err(CursorError::MissingValue)
        );
        assert_eq!(
            decode(&raw_token(r#"{"id":"a","value":{"nested":true}}"#)),
            Err(CursorError::MissingValue)
        );
    }

    #[test]
    fn test_value_is_coerced_to_string() {
        let cursor = decode(&raw_token(r#"{"id":"a","value":42}"#)).unwrap();
        assert_eq!(cursor.value, "42");

        let cursor = decode(&raw_token(r#"{"id":"a","value":null}"#)).unwrap();
        assert_eq!(cursor.value, "");

        let cursor = decode(&raw_token(r#"{"id":"a","value":0}"#)).unwrap();
        assert_eq!(cursor.value, "");

        let cursor = decode(&raw_token(r#"{"id":"a","value":1.0}"#)).unwrap();
        assert_eq!(cursor.value, "1");

        let cursor = decode(&raw_token(r#"{"id":"a","value":-2.5}"#)).unwrap();
        assert_eq!(cursor.value, "-2.5");
    }
}
