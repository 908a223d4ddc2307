//! Wire types for the single `POST /api` endpoint.
//!
//! Requests are plain serde structs. Responses are decoded leniently from a
//! `serde_json::Value`: the backend is free to omit or mistype the optional
//! fields, and the interpreter falls back to fixed text when they are absent.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body sent by the connectivity probe
pub const PROBE_TEXT: &str = "test connection";

/// A user question as sent to the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub text: String,
    pub dive_confirmed: bool,
    /// Always serialized as `null`; the backend picks the domain itself
    pub domain: Option<String>,
    pub mode: String,
}

impl Query {
    pub fn new(text: &str, dive_confirmed: bool, mode: &str) -> Self {
        Self {
            text: text.to_string(),
            dive_confirmed,
            domain: None,
            mode: mode.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProbeRequest {
    pub text: &'static str,
}

impl Default for ProbeRequest {
    fn default() -> Self {
        Self { text: PROBE_TEXT }
    }
}

/// The backend's verdict on a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Ok,
    NeedsDeeper,
    Clarify,
    Error,
    /// Anything else, including a missing or non-string status
    Unrecognized(String),
}

impl Status {
    pub fn as_str(&self) -> &str {
        match self {
            Status::Ok => "ok",
            Status::NeedsDeeper => "needs_deeper",
            Status::Clarify => "clarify",
            Status::Error => "error",
            Status::Unrecognized(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "ok" => Status::Ok,
            "needs_deeper" => Status::NeedsDeeper,
            "clarify" => Status::Clarify,
            "error" => Status::Error,
            other => Status::Unrecognized(other.to_string()),
        }
    }
}

/// A decoded backend response. Only the field matching `status` is
/// meaningful; the others are carried along untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: Status,
    pub answer: Option<String>,
    pub prompt: Option<String>,
    pub question: Option<String>,
    pub message: Option<String>,
}

impl Response {
    fn with_status(status: Status) -> Self {
        Self {
            status,
            answer: None,
            prompt: None,
            question: None,
            message: None,
        }
    }

    pub fn ok(answer: &str) -> Self {
        Self {
            answer: Some(answer.to_string()),
            ..Self::with_status(Status::Ok)
        }
    }

    pub fn needs_deeper(prompt: &str) -> Self {
        Self {
            prompt: Some(prompt.to_string()),
            ..Self::with_status(Status::NeedsDeeper)
        }
    }

    pub fn clarify(question: &str) -> Self {
        Self {
            question: Some(question.to_string()),
            ..Self::with_status(Status::Clarify)
        }
    }

    pub fn error(message: &str) -> Self {
        Self {
            message: Some(message.to_string()),
            ..Self::with_status(Status::Error)
        }
    }

    /// A response carrying only a status and no payload fields
    pub fn bare(status: Status) -> Self {
        Self::with_status(status)
    }

    /// Build a response from any JSON value.
    ///
    /// Non-object bodies (`null` included) and a missing status become
    /// `Unrecognized("")`. Payload fields count as absent when they are
    /// missing, `null`, `false`, `0` or `""`; any other scalar or container is
    /// shown as its JSON text.
    pub fn from_value(value: &Value) -> Self {
        let status = match value.get("status").and_then(Value::as_str) {
            Some(s) => Status::parse(s),
            None => Status::Unrecognized(String::new()),
        };

        Self {
            status,
            answer: text_field(value, "answer"),
            prompt: text_field(value, "prompt"),
            question: text_field(value, "question"),
            message: text_field(value, "message"),
        }
    }

    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_slice(body)?;
        Ok(Self::from_value(&value))
    }
}

fn text_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_serializes_null_domain() {
        let query = Query::new("hello", false, "auto");
        let body = serde_json::to_value(&query).unwrap();
        assert_eq!(
            body,
            json!({ "text": "hello", "dive_confirmed": false, "domain": null, "mode": "auto" })
        );
    }

    #[test]
    fn test_probe_body() {
        let body = serde_json::to_value(ProbeRequest::default()).unwrap();
        assert_eq!(body, json!({ "text": "test connection" }));
    }

    #[test]
    fn test_decode_each_status() {
        let ok = Response::from_slice(br#"{"status":"ok","answer":"Paris"}"#).unwrap();
        assert_eq!(ok, Response::ok("Paris"));

        let deeper =
            Response::from_slice(br#"{"status":"needs_deeper","prompt":"Dig?"}"#).unwrap();
        assert_eq!(deeper, Response::needs_deeper("Dig?"));

        let clarify =
            Response::from_slice(br#"{"status":"clarify","question":"Which?"}"#).unwrap();
        assert_eq!(clarify, Response::clarify("Which?"));

        let error = Response::from_slice(br#"{"status":"error","message":"boom"}"#).unwrap();
        assert_eq!(error, Response::error("boom"));
    }

    #[test]
    fn test_decode_is_lenient_about_fields() {
        let r = Response::from_slice(br#"{"status":"ok","answer":""}"#).unwrap();
        assert_eq!(r.answer, None);

        for falsy in ["null", "false", "0", "0.0"] {
            let body = format!(r#"{{"status":"ok","answer":{}}}"#, falsy);
            let r = Response::from_slice(body.as_bytes()).unwrap();
            assert_eq!(r.answer, None, "answer {} should be absent", falsy);
        }
    }

    #[test]
    fn test_non_string_fields_render_as_json_text() {
        let r = Response::from_slice(br#"{"status":"ok","answer":42}"#).unwrap();
        assert_eq!(r.status, Status::Ok);
        assert_eq!(r.answer.as_deref(), Some("42"));

        let r = Response::from_slice(br#"{"status":"error","message":true}"#).unwrap();
        assert_eq!(r.message.as_deref(), Some("true"));

        let r = Response::from_slice(br#"{"status":"clarify","question":["a","b"]}"#).unwrap();
        assert_eq!(r.question.as_deref(), Some(r#"["a","b"]"#));
    }

    #[test]
    fn test_decode_odd_shapes_are_unrecognized() {
        let r = Response::from_slice(b"[1, 2, 3]").unwrap();
        assert_eq!(r.status, Status::Unrecognized(String::new()));

        let r = Response::from_slice(b"null").unwrap();
        assert_eq!(r, Response::bare(Status::Unrecognized(String::new())));

        let r = Response::from_slice(br#"{"status":7}"#).unwrap();
        assert_eq!(r.status, Status::Unrecognized(String::new()));

        let r = Response::from_slice(br#"{"status":"maybe"}"#).unwrap();
        assert_eq!(r.status, Status::Unrecognized("maybe".to_string()));
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(Response::from_slice(b"<html>bad gateway</html>").is_err());
    }
}
