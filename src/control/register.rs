//! Client registration handshake.
//!
//! Right after the socket becomes writable the client announces itself
//! with a `REGISTER_CLIENT` operation. The server answers with
//! `REGISTER_CLIENT_RESPONSE`; an error object (`{ code, message }`) in the
//! payload rejects the registration.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{OnixError, Result};
use crate::invoker::Invoker;
use crate::protocol::{generate_uuid, Envelope, Metadata, OperationKind};

/// RPC path of the registration operation.
pub const REGISTER_RPC: &str = "register";

/// Identity of the client on the current connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRegistration {
    pub uuid: String,
}

/// Run the registration handshake.
///
/// The registration id is the `uuid` of the response payload when the
/// server sends one, otherwise the id the client proposed.
pub(crate) async fn register(invoker: &Invoker) -> Result<ClientRegistration> {
    let uuid = generate_uuid();
    let envelope = Envelope::with_uuid(
        uuid.clone(),
        OperationKind::RegisterClient,
        REGISTER_RPC,
        Metadata {
            stream: false,
            register: Some(uuid.clone()),
            ..Metadata::default()
        },
        json!({}),
    );

    let response = invoker
        .request(envelope)
        .await?;

    if let Some((code, message)) = response.error_shape() {
        return Err(OnixError::RegistrationRejected { code, message });
    }

    let uuid = response
        .payload()
        .get("uuid")
        .and_then(Value::as_str)
        .map_or(uuid, str::to_string);

    Ok(ClientRegistration { uuid })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{deliver, invoker, RecordingTransport};

    #[tokio::test]
    async fn test_register_request_shape() {
        let transport = RecordingTransport::new();
        let invoker = invoker(transport.clone());

        let handshake = tokio::spawn({
            let invoker = invoker.clone();
            async move { register(&invoker).await }
        });

        let request = transport.nth_envelope(0).await;
        assert_eq!(request.kind, OperationKind::RegisterClient);
        assert_eq!(request.rpc(), REGISTER_RPC);
        assert_eq!(request.metadata().register.as_deref(), Some(request.uuid.as_str()));
        assert_eq!(request.payload(), &json!({}));

        deliver(
            &invoker,
            request.reply(OperationKind::RegisterClientResponse, Metadata::default(), json!({})),
        );

        let registration = handshake.await.unwrap().unwrap();
        assert_eq!(registration.uuid, request.uuid);
    }

    #[tokio::test]
    async fn test_register_uses_server_uuid() {
        let transport = RecordingTransport::new();
        let invoker = invoker(transport.clone());

        let handshake = tokio::spawn({
            let invoker = invoker.clone();
            async move { register(&invoker).await }
        });

        let request = transport.nth_envelope(0).await;
        deliver(
            &invoker,
            request.reply(
                OperationKind::RegisterClientResponse,
                Metadata::default(),
                json!({ "uuid": "server-assigned" }),
            ),
        );

        assert_eq!(handshake.await.unwrap().unwrap().uuid, "server-assigned");
    }

    #[tokio::test]
    async fn test_register_rejected() {
        let transport = RecordingTransport::new();
        let invoker = invoker(transport.clone());

        let handshake = tokio::spawn({
            let invoker = invoker.clone();
            async move { register(&invoker).await }
        });

        let request = transport.nth_envelope(0).await;
        deliver(
            &invoker,
            request.reply(
                OperationKind::RegisterClientResponse,
                Metadata::default(),
                json!({ "code": 403, "message": "forbidden" }),
            ),
        );

        match handshake.await.unwrap() {
            Err(OnixError::RegistrationRejected { code, message }) => {
                assert_eq!(code, "403");
                assert_eq!(message, "forbidden");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }
}
