//! Correlated calls and stream subscriptions over the shared socket.
//!
//! The invoker is shared by the connection manager (registration,
//! heartbeat) and every method reference. It owns no socket state of its
//! own: it registers a listener in the [`REMOTE`] namespace, sends a frame
//! through the transport, and waits for the listener to pick out the
//! matching reply.
//!
//! Pending waits end in one of three ways: the reply arrives, the call
//! timeout expires (`Timeout`), or the namespace is purged on disconnect,
//! which drops the listener and with it the reply channel (`ConnectionLost`).

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::sync::oneshot;

use crate::codec::JsonCodec;
use crate::config::millis;
use crate::control::ClientRegistration;
use crate::error::{OnixError, Result};
use crate::interceptor::InterceptorChain;
use crate::listener::{ListenerGuard, ListenerRegistry, Signal, REMOTE};
use crate::protocol::{Envelope, Metadata, OperationKind};
use crate::storage::Credentials;
use crate::subscription::Subscription;
use crate::transport::Transport;

/// A reply being waited for.
///
/// Dropping it removes the listener.
pub(crate) struct Pending<T> {
    rx: oneshot::Receiver<T>,
    guard: ListenerGuard<Signal>,
}

impl<T> Pending<T> {
    /// Wait for the reply, bounded by `timeout` when given. The listener
    /// is removed whatever the outcome.
    pub(crate) async fn wait(self, timeout: Option<Duration>, context: &str) -> Result<T> {
        let (value, _guard) = self.wait_and_keep(timeout, context).await?;
        Ok(value)
    }

    /// Like [`wait`](Self::wait), but hands back the listener guard on
    /// success so the caller can keep the listener alive.
    pub(crate) async fn wait_and_keep(
        self,
        timeout: Option<Duration>,
        context: &str,
    ) -> Result<(T, ListenerGuard<Signal>)> {
        let Pending { rx, guard } = self;
        let outcome = match timeout {
            Some(limit) => tokio::time::timeout(limit, rx).await.map_err(|_| OnixError::Timeout {
                timeout_ms: millis(limit),
                context: context.to_string(),
            })?,
            None => rx.await,
        };
        let value = outcome.map_err(|_| OnixError::ConnectionLost)?;
        Ok((value, guard))
    }
}

/// Shared call context.
pub(crate) struct Invoker {
    transport: Arc<dyn Transport>,
    listeners: Arc<ListenerRegistry<Signal>>,
    registration: RwLock<Option<ClientRegistration>>,
    credentials: Credentials,
    interceptors: InterceptorChain,
    call_timeout: Option<Duration>,
}

impl Invoker {
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        listeners: Arc<ListenerRegistry<Signal>>,
        credentials: Credentials,
        interceptors: InterceptorChain,
        call_timeout: Option<Duration>,
    ) -> Self {
        Self {
            transport,
            listeners,
            registration: RwLock::new(None),
            credentials,
            interceptors,
            call_timeout,
        }
    }

    pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub(crate) fn listeners(&self) -> &Arc<ListenerRegistry<Signal>> {
        &self.listeners
    }

    pub(crate) fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub(crate) fn registration(&self) -> Option<ClientRegistration> {
        self.registration.read().clone()
    }

    pub(crate) fn set_registration(&self, registration: Option<ClientRegistration>) {
        *self.registration.write() = registration;
    }

    /// Register a one-shot listener in [`REMOTE`].
    ///
    /// `select` is run on every signal; the first `Some` completes the wait.
    pub(crate) fn expect<T, F>(&self, select: F) -> Pending<T>
    where
        T: Send + 'static,
        F: Fn(&Signal) -> Option<T> + Send + Sync + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let tx = Mutex::new(Some(tx));
        let id = self.listeners.add(REMOTE, move |signal| {
            if let Some(value) = select(signal) {
                if let Some(tx) = tx.lock().take() {
                    let _ = tx.send(value);
                }
            }
        });

        Pending {
            rx,
            guard: ListenerGuard::new(self.listeners.clone(), REMOTE, id),
        }
    }

    /// Send one envelope.
    pub(crate) async fn send(&self, envelope: &Envelope) -> Result<()> {
        let frame = JsonCodec::encode(envelope)?;
        tracing::debug!("-> {} {} {}", envelope.kind, envelope.rpc(), envelope.uuid);
        self.transport.send(frame).await
    }

    /// Send `envelope` and wait for the reply with the same uuid. The reply
    /// kind is the response kind paired with the request kind.
    pub(crate) async fn request(&self, envelope: Envelope) -> Result<Envelope> {
        let reply = envelope.kind.response().ok_or_else(|| {
            OnixError::Protocol(format!("{} has no response operation", envelope.kind))
        })?;
        let uuid = envelope.uuid.clone();
        let pending = self.expect(move |signal| {
            signal.as_remote()?.reply_to(&uuid, reply).cloned()
        });

        self.send(&envelope).await?;
        pending
            .wait(self.call_timeout, &format!("{} {}", reply, envelope.rpc()))
            .await
    }

    /// Metadata shared by calls and stream requests.
    fn call_metadata(&self, filter: Option<Value>, stream: bool) -> Result<Metadata> {
        let registration = self.registration().ok_or(OnixError::NotConnected)?;
        Ok(Metadata {
            stream,
            register: Some(registration.uuid),
            filter,
            caller: Some(self.credentials.subject()?),
            token: self.credentials.token()?,
            ..Metadata::default()
        })
    }

    /// Unary call: resolves with the response payload.
    pub(crate) async fn call(&self, rpc: &str, payload: Value, filter: Option<Value>) -> Result<Value> {
        let envelope = Envelope::new(
            OperationKind::CallProcedure,
            rpc,
            self.call_metadata(filter, false)?,
            payload,
        );
        let envelope = self.interceptors.before(envelope).await?;

        let response = self
            .request(envelope)
            .await?;
        let response = self.interceptors.after(response).await?;
        Ok(response.into_payload())
    }

    /// Open a stream. `on_data` receives every pushed payload until the
    /// returned subscription is unsubscribed.
    pub(crate) async fn stream<F>(
        self: &Arc<Self>,
        rpc: &str,
        on_data: F,
        filter: Option<Value>,
    ) -> Result<Subscription>
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let envelope = Envelope::new(
            OperationKind::CallProcedure,
            rpc,
            self.call_metadata(filter, true)?,
            Value::Null,
        );

        let uuid = envelope.uuid.clone();
        let pending = self.expect(move |signal| {
            let envelope = signal.as_remote()?.as_operation()?;
            if envelope.uuid != uuid {
                return None;
            }
            match envelope.kind {
                OperationKind::CallStream => {
                    on_data(envelope.payload());
                    None
                }
                OperationKind::CallStreamSubscribed => Some(envelope.metadata().listener.clone()),
                _ => None,
            }
        });

        self.send(&envelope).await?;
        let (server_listener, guard) = pending
            .wait_and_keep(self.call_timeout, &format!("stream {}", rpc))
            .await?;
        let local = guard.disarm();

        Ok(Subscription::new(
            self.clone(),
            local,
            server_listener,
            rpc.to_string(),
            envelope,
        ))
    }
}
