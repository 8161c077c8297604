//! Typed views over the opaque `data.object` body of payment intent events.
//!
//! Extraction is lazy: the ingress only calls into this module once a handler has been
//! matched for the event kind, so bodies of unknown kinds are never inspected.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Message reported for failed payments that carry no gateway error.
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldExtractionError {
    #[error("required field `{field}` is missing")]
    MissingRequiredField { field: &'static str },
    #[error("field `{field}` is not {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("field `{field}` is out of range: {value}")]
    OutOfRange { field: &'static str, value: i64 },
}

/// Fields of a successful payment intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentOutcome {
    pub id: String,
    /// Amount in the smallest currency unit.
    pub amount: i64,
    pub currency: Option<String>,
    pub customer: Option<String>,
    pub payment_method: Option<String>,
    pub status: Option<String>,
    /// Seconds since the unix epoch.
    pub created: Option<i64>,
}

impl PaymentOutcome {
    /// Extracts the outcome from an event body.
    ///
    /// `id` and `amount` are required. `customer` and `payment_method` accept either an id
    /// string or an expanded object carrying an `id`.
    ///
    /// ```
    /// use payhook_core::PaymentOutcome;
    /// use serde_json::json;
    ///
    /// let body = json!({"id": "pi_1", "amount": 1000, "currency": "eur"});
    /// let outcome = PaymentOutcome::from_body(&body).unwrap();
    /// assert_eq!(outcome.amount, 1000);
    /// assert_eq!(outcome.currency.as_deref(), Some("eur"));
    /// ```
    pub fn from_body(body: &Value) -> Result<Self, FieldExtractionError> {
        let object = body_object(body)?;
        Ok(Self {
            id: required_str(object, "id")?,
            amount: required_i64(object, "amount")?,
            currency: optional_str(object, "currency")?,
            customer: optional_reference(object, "customer")?,
            payment_method: optional_reference(object, "payment_method")?,
            status: optional_str(object, "status")?,
            created: optional_i64(object, "created")?,
        })
    }
}

/// Fields of a failed payment intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentFailure {
    pub id: String,
    pub message: String,
    pub code: Option<String>,
}

impl PaymentFailure {
    pub fn from_body(body: &Value) -> Result<Self, FieldExtractionError> {
        let object = body_object(body)?;
        let id = required_str(object, "id")?;

        let (message, code) = match object.get("last_payment_error") {
            None | Some(Value::Null) => (None, None),
            Some(Value::Object(error)) => (
                nested_str(error, "message", "last_payment_error.message")?,
                nested_str(error, "code", "last_payment_error.code")?,
            ),
            Some(_) => {
                return Err(FieldExtractionError::WrongType {
                    field: "last_payment_error",
                    expected: "an object",
                });
            }
        };

        Ok(Self {
            id,
            message: message.unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string()),
            code,
        })
    }
}

/// What a handler observed for one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PaymentObservation {
    Succeeded(PaymentOutcome),
    Failed(PaymentFailure),
}

impl PaymentObservation {
    pub fn payment_id(&self) -> &str {
        match self {
            PaymentObservation::Succeeded(outcome) => &outcome.id,
            PaymentObservation::Failed(failure) => &failure.id,
        }
    }
}

fn body_object(body: &Value) -> Result<&Map<String, Value>, FieldExtractionError> {
    body.as_object().ok_or(FieldExtractionError::WrongType {
        field: "data.object",
        expected: "an object",
    })
}

fn present<'a>(object: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    object.get(field).filter(|value| !value.is_null())
}

fn required_str(
    object: &Map<String, Value>,
    field: &'static str,
) -> Result<String, FieldExtractionError> {
    optional_str(object, field)?.ok_or(FieldExtractionError::MissingRequiredField { field })
}

fn required_i64(
    object: &Map<String, Value>,
    field: &'static str,
) -> Result<i64, FieldExtractionError> {
    optional_i64(object, field)?.ok_or(FieldExtractionError::MissingRequiredField { field })
}

fn optional_str(
    object: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, FieldExtractionError> {
    nested_str(object, field, field)
}

fn nested_str(
    object: &Map<String, Value>,
    key: &str,
    field: &'static str,
) -> Result<Option<String>, FieldExtractionError> {
    match present(object, key) {
        None => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(_) => Err(FieldExtractionError::WrongType {
            field,
            expected: "a string",
        }),
    }
}

fn optional_i64(
    object: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<i64>, FieldExtractionError> {
    match present(object, field) {
        None => Ok(None),
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or(FieldExtractionError::WrongType {
                field,
                expected: "an integer",
            }),
    }
}

fn optional_reference(
    object: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, FieldExtractionError> {
    match present(object, field) {
        None => Ok(None),
        Some(Value::String(id)) => Ok(Some(id.clone())),
        Some(Value::Object(expanded)) => match present(expanded, "id") {
            Some(Value::String(id)) => Ok(Some(id.clone())),
            _ => Err(FieldExtractionError::WrongType {
                field,
                expected: "an id or an object with an id",
            }),
        },
        Some(_) => Err(FieldExtractionError::WrongType {
            field,
            expected: "an id or an object with an id",
        }),
    }
}
