//! Codec module - JSON text frames.
//!
//! Outbound frames are always JSON-encoded [`Envelope`]s. Inbound frames
//! are parsed leniently: anything that is valid JSON and looks like an
//! envelope becomes [`Inbound::Operation`], other JSON values (heartbeat
//! echoes, server notices) become [`Inbound::Raw`], and text that is not
//! JSON at all is passed through as a raw string.
//!
//! # Example
//!
//! ```
//! use onix_client::codec::{Inbound, JsonCodec};
//!
//! match JsonCodec::decode("1712345678901") {
//!     Inbound::Raw(value) => assert_eq!(value, 1712345678901u64),
//!     Inbound::Operation(_) => unreachable!(),
//! }
//!
//! match JsonCodec::decode("not json") {
//!     Inbound::Raw(value) => assert_eq!(value, "not json"),
//!     Inbound::Operation(_) => unreachable!(),
//! }
//! ```

use serde_json::Value;

use crate::error::Result;
use crate::protocol::{Envelope, OperationKind};

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// A correlated operation.
    Operation(Envelope),
    /// Anything else.
    Raw(Value),
}

impl Inbound {
    /// The envelope, if this frame is one.
    pub fn as_operation(&self) -> Option<&Envelope> {
        match self {
            Self::Operation(envelope) => Some(envelope),
            Self::Raw(_) => None,
        }
    }

    /// The envelope if it has the given correlation id and kind.
    pub fn reply_to(&self, uuid: &str, kind: OperationKind) -> Option<&Envelope> {
        self.as_operation().filter(|e| e.matches(uuid, kind))
    }
}

/// JSON codec for socket frames.
pub struct JsonCodec;

impl JsonCodec {
    /// Encode an envelope to a text frame.
    ///
    /// # Errors
    ///
    /// Returns error if the payload cannot be serialized.
    #[inline]
    pub fn encode(envelope: &Envelope) -> Result<String> {
        Ok(serde_json::to_string(envelope)?)
    }

    /// Decode a text frame. Never fails, see the module docs.
    pub fn decode(text: &str) -> Inbound {
        let value: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(_) => return Inbound::Raw(Value::String(text.to_string())),
        };

        let looks_like_envelope = value
            .as_object()
            .is_some_and(|o| o.contains_key("uuid") && o.contains_key("type"));
        if !looks_like_envelope {
            return Inbound::Raw(value);
        }

        match serde_json::from_value::<Envelope>(value.clone()) {
            Ok(envelope) => Inbound::Operation(envelope),
            Err(e) => {
                tracing::debug!("Frame is not a valid envelope: {}", e);
                Inbound::Raw(value)
            }
        }
    }
}
