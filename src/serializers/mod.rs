//! Wire representations.
//!
//! Read shapes are plain `Serialize` structs built from stored rows. Write
//! shapes are parsed field by field out of a [`Payload`] so that every problem
//! in a request body is reported at once, and so that each operation accepts
//! exactly the fields it is allowed to change.

pub mod chat;
pub mod message;
pub mod user;

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde_json::{Map, Value};

use crate::error::{ApiError, FieldErrors};

pub use chat::{ChatCreate, ChatRepresentation, ChatUpdate};
pub use message::{MessageCreate, MessageRepresentation, MessageUpdate};
pub use user::{UserCreate, UserRepresentation, UserUpdate};

const REQUIRED: &str = "This field is required.";
const NOT_NULL: &str = "This field may not be null.";
const UNKNOWN: &str = "Unknown field.";

/// JSON object request body
#[derive(Debug)]
pub struct JsonObject(pub Map<String, Value>);

#[axum::async_trait]
impl<S> FromRequest<S> for JsonObject
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(rejection_to_error)?;

        match value {
            Value::Object(map) => Ok(JsonObject(map)),
            _ => Err(ApiError::invalid_json("Expected a JSON object")),
        }
    }
}

/// Oversized bodies and non-JSON content types keep their own status
fn rejection_to_error(rejection: JsonRejection) -> ApiError {
    match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => ApiError::payload_too_large(rejection.body_text()),
        StatusCode::UNSUPPORTED_MEDIA_TYPE => ApiError::unsupported_media_type(rejection.body_text()),
        _ => ApiError::invalid_json(rejection.body_text()),
    }
}

/// Consumes fields from a request body while collecting per-field errors
#[derive(Debug)]
pub struct Payload {
    fields: Map<String, Value>,
    errors: FieldErrors,
}

impl Payload {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            errors: FieldErrors::new(),
        }
    }

    pub fn error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.entry(field.to_string()).or_insert_with(|| message.into());
    }

    fn take(&mut self, field: &str, required: bool) -> Option<Value> {
        match self.fields.remove(field) {
            None => {
                if required {
                    self.error(field, REQUIRED);
                }
                None
            }
            Some(Value::Null) => {
                self.error(field, NOT_NULL);
                None
            }
            Some(value) => Some(value),
        }
    }

    pub fn string(&mut self, field: &str, required: bool) -> Option<String> {
        match self.take(field, required)? {
            Value::String(s) => Some(s),
            _ => {
                self.error(field, "Not a valid string.");
                None
            }
        }
    }

    pub fn boolean(&mut self, field: &str) -> Option<bool> {
        match self.take(field, false)? {
            Value::Bool(b) => Some(b),
            _ => {
                self.error(field, "Must be a valid boolean.");
                None
            }
        }
    }

    /// Primary key reference: a positive integer, or a string holding one
    pub fn pk(&mut self, field: &str, required: bool) -> Option<i64> {
        let value = self.take(field, required)?;
        let parsed = match &value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        match parsed {
            Some(id) if id > 0 => Some(id),
            _ => {
                self.error(field, format!("Incorrect type. Expected pk value, received {}.", type_name(&value)));
                None
            }
        }
    }

    /// Reject a field that is part of the resource but not writable here
    pub fn reject(&mut self, field: &str, message: &str) {
        if self.fields.remove(field).is_some() {
            self.error(field, message);
        }
    }

    /// Fail on leftover (unknown) fields and on any error collected so far
    pub fn finish(mut self) -> Result<(), ApiError> {
        let unknown: Vec<String> = self.fields.keys().cloned().collect();
        for field in unknown {
            self.error(&field, UNKNOWN);
        }

        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation_error("Invalid input", self.errors))
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}
