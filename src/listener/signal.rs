//! Events carried by the client's listener registry.

use std::fmt;

use crate::codec::Inbound;

/// Namespace receiving every decoded inbound frame.
pub const REMOTE: &str = "remote";

/// Namespace of disconnect observers.
pub const DISCONNECT: &str = "disconnect";

/// Namespace of reconnect observers.
pub const RECONNECT: &str = "reconnect";

/// Why a connection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Closed on request (user `disconnect()` or a normal close frame).
    Closed,
    /// The socket closed with a non-normal code.
    Abnormal {
        /// WebSocket close code.
        code: u16,
        /// Close reason sent by the peer, may be empty.
        reason: String,
    },
    /// The transport reported an error.
    TransportError(String),
    /// The heartbeat ran out of attempts.
    HeartbeatTimeout,
    /// The schema could not be fetched.
    SchemaUnavailable(String),
    /// The server rejected the client registration.
    RegistrationFailed(String),
}

impl DisconnectReason {
    /// Whether a reconnect may follow this disconnect.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Closed | Self::RegistrationFailed(_))
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "connection closed"),
            Self::Abnormal { code, reason } if reason.is_empty() => {
                write!(f, "connection closed abnormally (code {})", code)
            }
            Self::Abnormal { code, reason } => {
                write!(f, "connection closed abnormally (code {}): {}", code, reason)
            }
            Self::TransportError(e) => write!(f, "transport error: {}", e),
            Self::HeartbeatTimeout => write!(f, "heartbeat timed out"),
            Self::SchemaUnavailable(e) => write!(f, "schema unavailable: {}", e),
            Self::RegistrationFailed(e) => write!(f, "registration failed: {}", e),
        }
    }
}

/// Payload broadcast through the client's registry.
#[derive(Debug, Clone)]
pub enum Signal {
    /// An inbound frame (namespace [`REMOTE`]).
    Remote(Inbound),
    /// The connection went down (namespace [`DISCONNECT`]).
    Disconnected(DisconnectReason),
    /// The reconnect delay elapsed (namespace [`RECONNECT`]).
    Reconnect(DisconnectReason),
}

impl Signal {
    /// The inbound frame, if this is a remote signal.
    pub fn as_remote(&self) -> Option<&Inbound> {
        match self {
            Self::Remote(inbound) => Some(inbound),
            _ => None,
        }
    }

    /// The disconnect reason of a disconnect or reconnect signal.
    pub fn reason(&self) -> Option<&DisconnectReason> {
        match self {
            Self::Disconnected(reason) | Self::Reconnect(reason) => Some(reason),
            Self::Remote(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_reasons() {
        assert!(!DisconnectReason::Closed.is_recoverable());
        assert!(!DisconnectReason::RegistrationFailed("x".into()).is_recoverable());
        assert!(DisconnectReason::HeartbeatTimeout.is_recoverable());
        assert!(DisconnectReason::Abnormal {
            code: 1006,
            reason: String::new()
        }
        .is_recoverable());
    }

    #[test]
    fn test_display() {
        let reason = DisconnectReason::Abnormal {
            code: 1006,
            reason: String::new(),
        };
        assert_eq!(reason.to_string(), "connection closed abnormally (code 1006)");
        assert_eq!(
            DisconnectReason::HeartbeatTimeout.to_string(),
            "heartbeat timed out"
        );
    }
}
