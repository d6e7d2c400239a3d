//! Uniform response envelope.
//!
//! Every success body is `{ "data": ... }` (or 204 with no body); every
//! failure body is `{ "code": <int>, "message": <string>, "context": <map|null> }`.
//! The message-to-code table is versioned and append-only: existing entries
//! must never be renumbered or removed.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::ValidationErrors;

/// Stable failure messages surfaced to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorMessage {
    Unauthorized,
    Forbidden,
    RequestValidationFailed,
    Conflict,
    TooManyRequests,
    InternalError,
}

impl ErrorMessage {
    /// The fixed numeric code for this message. Append-only.
    pub fn code(self) -> i32 {
        match self {
            ErrorMessage::RequestValidationFailed => 40001,
            ErrorMessage::Unauthorized => 40101,
            ErrorMessage::Forbidden => 40301,
            ErrorMessage::Conflict => 40901,
            ErrorMessage::TooManyRequests => 42901,
            ErrorMessage::InternalError => 50001,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorMessage::Unauthorized => "Unauthorized",
            ErrorMessage::Forbidden => "Forbidden",
            ErrorMessage::RequestValidationFailed => "RequestValidationFailed",
            ErrorMessage::Conflict => "Conflict",
            ErrorMessage::TooManyRequests => "TooManyRequests",
            ErrorMessage::InternalError => "InternalError",
        }
    }
}

/// Success payload wrapper: `{ "data": ... }`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Data<T> {
    pub data: T,
}

impl<T> Data<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Failure payload. `context` serializes as `null` when absent.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: i32,
    pub message: String,
    pub context: Option<Map<String, Value>>,
}

impl ErrorBody {
    pub fn new(message: ErrorMessage, context: Option<Map<String, Value>>) -> Self {
        Self {
            code: message.code(),
            message: message.as_str().to_string(),
            context,
        }
    }
}

/// Extract validation failures into the response context map.
///
/// One entry per failed field, keyed by the body's serialization name,
/// valued with the first failing rule keyword in declaration order.
pub fn validation_error_context(errors: &ValidationErrors) -> Map<String, Value> {
    let mut context = Map::new();
    for (field, failures) in errors.field_errors() {
        if let Some(first) = failures.first() {
            context.insert(field.to_string(), Value::String(first.code.to_string()));
        }
    }
    context
}
