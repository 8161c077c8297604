//! Decoding of verified payloads into the event envelope.
//!
//! Only the envelope is parsed here: the event-kind tag and the opaque `data.object`
//! body. Typed extraction of the body happens later, inside the handler matched for the
//! kind, so unknown kinds never fail to decode.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Payload bytes whose signature has been checked.
///
/// Only [`crate::SignatureVerifier`] can construct one.
#[derive(Debug, Clone, Copy)]
pub struct VerifiedPayload<'a> {
    bytes: &'a [u8],
}

impl<'a> VerifiedPayload<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid event envelope: {0}")]
    InvalidFormat(#[source] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    created: Option<i64>,
    #[serde(default)]
    livemode: Option<bool>,
    #[serde(default)]
    api_version: Option<String>,
    data: RawEventData,
}

#[derive(Debug, Deserialize)]
struct RawEventData {
    object: Map<String, Value>,
}

/// Event accepted from the gateway: kind tag plus opaque body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerifiedEvent {
    id: Option<String>,
    kind: String,
    created: Option<i64>,
    livemode: Option<bool>,
    api_version: Option<String>,
    body: Value,
}

impl VerifiedEvent {
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn created(&self) -> Option<i64> {
        self.created
    }

    pub fn livemode(&self) -> Option<bool> {
        self.livemode
    }

    pub fn api_version(&self) -> Option<&str> {
        self.api_version.as_deref()
    }

    /// The `data.object` of the envelope.
    pub fn body(&self) -> &Value {
        &self.body
    }
}

pub struct EventDecoder;

impl EventDecoder {
    pub fn decode(payload: VerifiedPayload<'_>) -> Result<VerifiedEvent, DecodeError> {
        let raw: RawEnvelope =
            serde_json::from_slice(payload.as_bytes()).map_err(DecodeError::InvalidFormat)?;
        Ok(VerifiedEvent {
            id: raw.id,
            kind: raw.kind,
            created: raw.created,
            livemode: raw.livemode,
            api_version: raw.api_version,
            body: Value::Object(raw.data.object),
        })
    }
}
