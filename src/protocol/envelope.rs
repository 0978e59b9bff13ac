//! Correlation envelope exchanged over the socket.
//!
//! ```text
//! {
//!   "uuid": "...",
//!   "type": 13,
//!   "message": {
//!     "rpc": "App.Module.Component.method",
//!     "request": {
//!       "metadata": { "stream": false, "register": "...", ... },
//!       "payload": { ... }
//!     }
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::OperationKind;

/// Generate a new correlation id.
///
/// UUIDv7: millisecond timestamp plus random bits. Unique enough for the
/// lifetime of a session, not meant as a security token.
pub fn generate_uuid() -> String {
    Uuid::now_v7().to_string()
}

/// Request metadata.
///
/// Known fields are typed; anything else the server adds is kept in
/// `extra` so it survives interceptors untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Whether the operation opens a stream.
    #[serde(default)]
    pub stream: bool,
    /// Connection registration id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub register: Option<String>,
    /// Correlation token of the subscription this frame refers to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription: Option<String>,
    /// Server side filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    /// Subject claim of the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller: Option<String>,
    /// Access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Server assigned listener id of a stream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listener: Option<Value>,
    /// Unrecognized fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Request body: metadata plus an arbitrary payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub payload: Value,
}

/// Message body: target path plus request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Dotted path, usually `app.module.component.method`.
    #[serde(default)]
    pub rpc: String,
    #[serde(default)]
    pub request: Request,
}

/// One correlated operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Correlation id.
    pub uuid: String,
    /// Operation kind.
    #[serde(rename = "type")]
    pub kind: OperationKind,
    /// Message body.
    #[serde(default)]
    pub message: Message,
}

impl Envelope {
    /// Build an envelope with a fresh correlation id.
    pub fn new(
        kind: OperationKind,
        rpc: impl Into<String>,
        metadata: Metadata,
        payload: Value,
    ) -> Self {
        Self::with_uuid(generate_uuid(), kind, rpc, metadata, payload)
    }

    /// Build an envelope with an explicit correlation id.
    pub fn with_uuid(
        uuid: impl Into<String>,
        kind: OperationKind,
        rpc: impl Into<String>,
        metadata: Metadata,
        payload: Value,
    ) -> Self {
        Self {
            uuid: uuid.into(),
            kind,
            message: Message {
                rpc: rpc.into(),
                request: Request { metadata, payload },
            },
        }
    }

    /// Build the reply to this envelope, keeping uuid and rpc.
    pub fn reply(&self, kind: OperationKind, metadata: Metadata, payload: Value) -> Self {
        Self::with_uuid(self.uuid.clone(), kind, self.message.rpc.clone(), metadata, payload)
    }

    #[inline]
    pub fn rpc(&self) -> &str {
        &self.message.rpc
    }

    #[inline]
    pub fn metadata(&self) -> &Metadata {
        &self.message.request.metadata
    }

    #[inline]
    pub fn payload(&self) -> &Value {
        &self.message.request.payload
    }

    /// Take the payload out of the envelope.
    pub fn into_payload(self) -> Value {
        self.message.request.payload
    }

    /// Whether this envelope has the given correlation id and kind.
    #[inline]
    pub fn matches(&self, uuid: &str, kind: OperationKind) -> bool {
        self.kind == kind && self.uuid == uuid
    }

    /// `(code, message)` when the payload is an error object.
    ///
    /// An error object carries both a `code` and a `message` key.
    pub fn error_shape(&self) -> Option<(String, String)> {
        let object = self.payload().as_object()?;
        let code = object.get("code")?;
        let message = object.get("message")?;
        Some((value_to_string(code), value_to_string(message)))
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
