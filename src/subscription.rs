//! Live stream subscriptions.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;
use crate::invoker::Invoker;
use crate::listener::{ListenerId, REMOTE};
use crate::protocol::{Envelope, Metadata, OperationKind};

/// Handle to a server stream.
///
/// The stream keeps delivering data until [`unsubscribe`](Self::unsubscribe)
/// completes or the connection drops. Dropping the handle does not stop
/// the stream.
pub struct Subscription {
    invoker: Arc<Invoker>,
    listener: ListenerId,
    server_listener: Option<Value>,
    endpoint: String,
    operation: Envelope,
}

impl Subscription {
    pub(crate) fn new(
        invoker: Arc<Invoker>,
        listener: ListenerId,
        server_listener: Option<Value>,
        endpoint: String,
        operation: Envelope,
    ) -> Self {
        Self {
            invoker,
            listener,
            server_listener,
            endpoint,
            operation,
        }
    }

    /// Id of the local stream listener in the `remote` namespace.
    pub fn listener_id(&self) -> ListenerId {
        self.listener
    }

    /// Listener id assigned by the server.
    pub fn server_listener(&self) -> Option<&Value> {
        self.server_listener.as_ref()
    }

    /// Dotted endpoint of the stream.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The request that opened the stream.
    pub fn operation(&self) -> &Envelope {
        &self.operation
    }

    /// Whether the stream listener is still registered.
    pub fn is_active(&self) -> bool {
        self.invoker.listeners().contains(REMOTE, self.listener)
    }

    /// Ask the server to stop the stream and wait for its acknowledgement.
    ///
    /// The local stream listener is removed whatever the outcome, so no
    /// more data is delivered after this returns.
    pub async fn unsubscribe(self) -> Result<()> {
        let metadata = Metadata {
            stream: false,
            register: self.invoker.registration().map(|r| r.uuid),
            listener: self.server_listener.clone(),
            subscription: Some(self.operation.uuid.clone()),
            ..Metadata::default()
        };

        let result = match serde_json::to_value(&self.operation) {
            Ok(payload) => {
                let envelope = Envelope::new(
                    OperationKind::CallStreamUnsubscribe,
                    format!("{}.unsubscribe", self.endpoint),
                    metadata,
                    payload,
                );
                self.invoker
                    .request(envelope)
                    .await
                    .map(|_| ())
            }
            Err(e) => Err(e.into()),
        };

        self.invoker.listeners().remove(REMOTE, self.listener);
        if let Err(e) = &result {
            tracing::warn!("Unsubscribe from {} failed: {}", self.endpoint, e);
        }
        result
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("listener", &self.listener)
            .field("server_listener", &self.server_listener)
            .field("endpoint", &self.endpoint)
            .field("uuid", &self.operation.uuid)
            .finish()
    }
}
