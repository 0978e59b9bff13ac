//! Operation kinds tagging every envelope.
//!
//! The numeric values are part of the wire format shared with deployed
//! servers. New kinds may only be appended.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::OnixError;

/// Kind of an operation, serialized as its integer ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum OperationKind {
    AppCreate = 0,
    AppCreateResponse = 1,
    AppPing = 2,
    AppPingResponse = 3,
    AppStart = 4,
    AppStartResponse = 5,
    AppStop = 6,
    AppStopResponse = 7,
    AppDestroy = 8,
    AppDestroyResponse = 9,
    AppGreet = 10,
    AppGreetResponse = 11,
    /// Server push frame for a stream.
    CallStream = 12,
    /// Client to server unary request (also used to open a stream).
    CallProcedure = 13,
    /// Reply to [`CallProcedure`](Self::CallProcedure).
    CallProcedureResponse = 14,
    /// Acknowledges a stream subscription, carries the server listener id.
    CallStreamSubscribed = 15,
    CallStreamUnsubscribe = 16,
    CallStreamUnsubscribeResponse = 17,
    RegisterClient = 18,
    RegisterClientResponse = 19,
    UnregisterClient = 20,
    UnregisterClientResponse = 21,
}

impl OperationKind {
    /// Highest known ordinal.
    pub const MAX: u8 = 21;

    /// Integer value on the wire.
    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Kind of the reply the server sends for this request kind, if any.
    pub fn response(self) -> Option<OperationKind> {
        use OperationKind::*;
        match self {
            AppCreate => Some(AppCreateResponse),
            AppPing => Some(AppPingResponse),
            AppStart => Some(AppStartResponse),
            AppStop => Some(AppStopResponse),
            AppDestroy => Some(AppDestroyResponse),
            AppGreet => Some(AppGreetResponse),
            CallProcedure => Some(CallProcedureResponse),
            CallStreamUnsubscribe => Some(CallStreamUnsubscribeResponse),
            RegisterClient => Some(RegisterClientResponse),
            UnregisterClient => Some(UnregisterClientResponse),
            _ => None,
        }
    }
}

impl TryFrom<u8> for OperationKind {
    type Error = OnixError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        use OperationKind::*;
        Ok(match value {
            0 => AppCreate,
            1 => AppCreateResponse,
            2 => AppPing,
            3 => AppPingResponse,
            4 => AppStart,
            5 => AppStartResponse,
            6 => AppStop,
            7 => AppStopResponse,
            8 => AppDestroy,
            9 => AppDestroyResponse,
            10 => AppGreet,
            11 => AppGreetResponse,
            12 => CallStream,
            13 => CallProcedure,
            14 => CallProcedureResponse,
            15 => CallStreamSubscribed,
            16 => CallStreamUnsubscribe,
            17 => CallStreamUnsubscribeResponse,
            18 => RegisterClient,
            19 => RegisterClientResponse,
            20 => UnregisterClient,
            21 => UnregisterClientResponse,
            other => {
                return Err(OnixError::Protocol(format!(
                    "unknown operation kind {}",
                    other
                )))
            }
        })
    }
}

impl From<OperationKind> for u8 {
    fn from(kind: OperationKind) -> u8 {
        kind as u8
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.as_u8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinals_are_stable() {
        assert_eq!(OperationKind::AppCreate.as_u8(), 0);
        assert_eq!(OperationKind::AppGreetResponse.as_u8(), 11);
        assert_eq!(OperationKind::CallStream.as_u8(), 12);
        assert_eq!(OperationKind::CallProcedure.as_u8(), 13);
        assert_eq!(OperationKind::CallProcedureResponse.as_u8(), 14);
        assert_eq!(OperationKind::CallStreamSubscribed.as_u8(), 15);
        assert_eq!(OperationKind::CallStreamUnsubscribe.as_u8(), 16);
        assert_eq!(OperationKind::CallStreamUnsubscribeResponse.as_u8(), 17);
        assert_eq!(OperationKind::RegisterClient.as_u8(), 18);
        assert_eq!(OperationKind::RegisterClientResponse.as_u8(), 19);
        assert_eq!(OperationKind::UnregisterClientResponse.as_u8(), OperationKind::MAX);
    }

    #[test]
    fn test_try_from_covers_every_ordinal() {
        for n in 0..=OperationKind::MAX {
            let kind = OperationKind::try_from(n).unwrap();
            assert_eq!(u8::from(kind), n);
        }
        assert!(OperationKind::try_from(OperationKind::MAX + 1).is_err());
    }

    #[test]
    fn test_serde_uses_integers() {
        let json = serde_json::to_string(&OperationKind::CallProcedure).unwrap();
        assert_eq!(json, "13");

        let kind: OperationKind = serde_json::from_str("15").unwrap();
        assert_eq!(kind, OperationKind::CallStreamSubscribed);

        assert!(serde_json::from_str::<OperationKind>("99").is_err());
    }

    #[test]
    fn test_response_pairs() {
        assert_eq!(
            OperationKind::CallProcedure.response(),
            Some(OperationKind::CallProcedureResponse)
        );
        assert_eq!(
            OperationKind::RegisterClient.response(),
            Some(OperationKind::RegisterClientResponse)
        );
        assert_eq!(OperationKind::CallStream.response(), None);
    }
}
