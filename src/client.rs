//! Client builder and connection manager.
//!
//! The [`ClientBuilder`] collects configuration and adapters; the
//! [`Client`] owns the single socket and drives its lifecycle:
//!
//! ```text
//! Idle ─init()─► Connecting ─open─► Registering ─ack─► Ready
//!                    ▲                                   │ close / error / heartbeat
//!                    │                                   ▼
//!                    └─── init() ◄── ReconnectWait ◄── Disconnected
//!
//! disconnect() or normal close ─► Closed
//! ```
//!
//! # Example
//!
//! ```ignore
//! use onix_client::Client;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::builder()
//!         .host("http://localhost")
//!         .port(3000)
//!         .auto_reconnect(true)
//!         .build()?;
//!
//!     client.on_disconnect(|reason| eprintln!("disconnected: {}", reason));
//!     client.init().await?;
//!
//!     let greet = client
//!         .app_reference("App")?
//!         .module("Mod")
//!         .component("Comp")
//!         .method("greet");
//!     let reply = greet.call(json!({ "name": "x" }), None).await?;
//!     println!("{}", reply);
//!
//!     client.disconnect().await?;
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::codec::JsonCodec;
use crate::config::{millis, ClientConfig};
use crate::control::{self, ClientRegistration, HeartbeatConfig, HeartbeatResult, Schema};
use crate::error::{OnixError, Result};
use crate::fetch::{claims_request_url, Fetcher, HttpFetcher};
use crate::interceptor::{Interceptor, InterceptorChain};
use crate::invoker::Invoker;
use crate::listener::{
    DisconnectReason, ListenerId, ListenerRegistry, Signal, DISCONNECT, RECONNECT, REMOTE,
};
use crate::reference::AppReference;
use crate::storage::{Claims, Credentials, KeyValueStore, MemoryStore};
use crate::transport::{Transport, TransportEvent, WsTransport, CLOSE_ABNORMAL, CLOSE_NORMAL};

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Built, `init()` not called yet.
    Idle,
    /// Fetching the schema or opening the socket.
    Connecting,
    /// Socket open, registration in flight.
    Registering,
    /// Registered; calls and streams can be made.
    Ready,
    /// The connection dropped; observers are being notified.
    Disconnected,
    /// Waiting for the reconnect interval before notifying reconnect observers.
    ReconnectWait,
    /// Closed on request. Terminal until `init()` is called again.
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Registering => "registering",
            Self::Ready => "ready",
            Self::Disconnected => "disconnected",
            Self::ReconnectWait => "reconnect-wait",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Builder for configuring and creating a client.
pub struct ClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    fetcher: Option<Arc<dyn Fetcher>>,
    store: Option<Arc<dyn KeyValueStore>>,
    interceptors: InterceptorChain,
}

impl ClientBuilder {
    /// Create a builder with the default configuration.
    pub fn new() -> Self {
        Self::from_config(ClientConfig::default())
    }

    /// Create a builder from an existing configuration.
    pub fn from_config(config: ClientConfig) -> Self {
        Self {
            config,
            transport: None,
            fetcher: None,
            store: None,
            interceptors: InterceptorChain::new(),
        }
    }

    /// Server host, optionally with an `http://` or `https://` prefix.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Server port. Port 443 connects with `wss`.
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Storage key prefix.
    ///
    /// Default: `onixjs:sdk`
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.prefix = prefix.into();
        self
    }

    /// Delay between heartbeat pings.
    ///
    /// Default: 5 seconds
    pub fn ping_interval(mut self, interval: Duration) -> Self {
        self.config.intervals.ping = millis(interval);
        self
    }

    /// Wait per heartbeat attempt.
    ///
    /// Default: 1 second
    pub fn ping_timeout(mut self, timeout: Duration) -> Self {
        self.config.intervals.timeout = millis(timeout);
        self
    }

    /// Missed heartbeat attempts tolerated before disconnecting.
    ///
    /// Default: 3
    pub fn ping_attempts(mut self, attempts: u32) -> Self {
        self.config.attempts.ping = attempts;
        self
    }

    /// Delay between a disconnect and the reconnect notification.
    ///
    /// Default: 5 seconds
    pub fn reconnect_interval(mut self, interval: Duration) -> Self {
        self.config.intervals.reconnect = millis(interval);
        self
    }

    /// Poll interval while waiting for the socket to become writable.
    ///
    /// Default: 100 ms
    pub fn ready_poll_interval(mut self, interval: Duration) -> Self {
        self.config.intervals.ready_poll = millis(interval);
        self
    }

    /// Timeout for calls, subscriptions and registration. `None` waits forever.
    ///
    /// Default: 30 seconds
    pub fn call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.intervals.call = timeout.map_or(0, millis);
        self
    }

    /// Endpoint returning OIDC claims for the stored access token.
    pub fn claims_url(mut self, url: impl Into<String>) -> Self {
        self.config.claims_url = Some(url.into());
        self
    }

    /// Run `init()` again whenever reconnect observers fire.
    ///
    /// Default: false
    pub fn auto_reconnect(mut self, enabled: bool) -> Self {
        self.config.auto_reconnect = enabled;
        self
    }

    /// Use a custom socket adapter instead of [`WsTransport`].
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use a custom fetcher instead of [`HttpFetcher`].
    pub fn fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Use a custom key-value store instead of [`MemoryStore`].
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Append an interceptor to the chain.
    pub fn interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Build the client. No connection is made until [`Client::init`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if the host is empty.
    pub fn build(self) -> Result<Client> {
        if self.config.host.trim().is_empty() {
            return Err(OnixError::InvalidState("host must not be empty".into()));
        }

        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(WsTransport::new()));
        let fetcher = self.fetcher.unwrap_or_else(|| Arc::new(HttpFetcher::new()));
        let store = self.store.unwrap_or_else(|| Arc::new(MemoryStore::new()));

        let listeners = Arc::new(ListenerRegistry::new());
        let credentials = Credentials::new(store, self.config.prefix.clone());
        let invoker = Arc::new(Invoker::new(
            transport,
            listeners,
            credentials,
            self.interceptors,
            self.config.call_timeout(),
        ));

        let inner = Arc::new(Inner {
            config: self.config,
            fetcher,
            invoker,
            state: Mutex::new(ConnectionState::Idle),
            connection: Mutex::new(None),
            pending_init: Mutex::new(None),
            lifecycle: tokio::sync::Mutex::new(()),
            schema: RwLock::new(None),
            references: Mutex::new(HashMap::new()),
        });

        if inner.config.auto_reconnect {
            install_auto_reconnect(&inner);
        }

        Ok(Client { inner })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Reconnect observer that re-runs `init()`.
fn install_auto_reconnect(inner: &Arc<Inner>) {
    let weak: Weak<Inner> = Arc::downgrade(inner);
    inner.invoker.listeners().add(RECONNECT, move |_signal| {
        let Some(inner) = weak.upgrade() else {
            return;
        };
        tokio::spawn(async move {
            tracing::info!("Reconnecting to {}", inner.config.socket_url());
            let client = Client { inner };
            if let Err(e) = client.init().await {
                tracing::error!("Reconnect failed: {}", e);
            }
        });
    });
}

/// A client connected (or connectable) to one server.
///
/// Cheap to clone; clones share the connection.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

struct Inner {
    config: ClientConfig,
    fetcher: Arc<dyn Fetcher>,
    invoker: Arc<Invoker>,
    state: Mutex<ConnectionState>,
    /// Cancellation token of the live connection.
    connection: Mutex<Option<CancellationToken>>,
    /// Completes the `init()` call waiting for READY.
    pending_init: Mutex<Option<oneshot::Sender<Result<()>>>>,
    /// Held while the transport is opened and by teardown closes.
    lifecycle: tokio::sync::Mutex<()>,
    schema: RwLock<Option<Schema>>,
    references: Mutex<HashMap<String, AppReference>>,
}

impl Client {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Build a client with default adapters from `config`.
    pub fn new(config: ClientConfig) -> Result<Self> {
        ClientBuilder::from_config(config).build()
    }

    /// Fetch the schema, resolve the caller's claims, open the socket and
    /// register.
    ///
    /// Resolves once the client is [`Ready`](ConnectionState::Ready).
    ///
    /// # Errors
    ///
    /// - `InvalidState` if a connection is already being made or is ready
    /// - `SchemaUnavailable` if the schema cannot be fetched; disconnect
    ///   observers are notified as well
    /// - `RegistrationRejected` if the server refuses the client
    /// - `ConnectionLost` if the socket drops before the client is ready
    pub async fn init(&self) -> Result<()> {
        let inner = &self.inner;
        {
            let mut state = inner.state.lock();
            if matches!(
                *state,
                ConnectionState::Connecting | ConnectionState::Registering | ConnectionState::Ready
            ) {
                return Err(OnixError::InvalidState(format!(
                    "init() called while {}",
                    *state
                )));
            }
            *state = ConnectionState::Connecting;
        }

        let url = inner.config.schema_url();
        let schema = match inner.fetch_schema(&url).await {
            Ok(schema) => schema,
            Err(e) => {
                tracing::error!("Unable to get host schema from {}: {}", url, e);
                let reason = e.to_string();
                inner.disconnected(DisconnectReason::SchemaUnavailable(reason.clone()), true);
                return Err(OnixError::SchemaUnavailable { url, reason });
            }
        };
        *inner.schema.write() = Some(schema);

        // Calls carry the subject of these claims as `caller`.
        if let Err(e) = self.claims(None).await {
            tracing::warn!("Unable to resolve claims, calling anonymously: {}", e);
        }

        inner.connect().await
    }

    /// Close the connection on request.
    ///
    /// Disconnect observers are notified; no reconnect follows.
    pub async fn disconnect(&self) -> Result<()> {
        self.inner.disconnected(DisconnectReason::Closed, false);
        self.inner.close_transport().await
    }

    /// Observe disconnects.
    pub fn on_disconnect<F>(&self, handler: F) -> ListenerId
    where
        F: Fn(&DisconnectReason) + Send + Sync + 'static,
    {
        self.inner.invoker.listeners().add(DISCONNECT, move |signal| {
            if let Some(reason) = signal.reason() {
                handler(reason);
            }
        })
    }

    /// Observe the end of the reconnect interval. Typically calls `init()`.
    pub fn on_reconnect<F>(&self, handler: F) -> ListenerId
    where
        F: Fn(&DisconnectReason) + Send + Sync + 'static,
    {
        self.inner.invoker.listeners().add(RECONNECT, move |signal| {
            if let Some(reason) = signal.reason() {
                handler(reason);
            }
        })
    }

    /// Reference to an application declared in the schema.
    ///
    /// References are cached until the next disconnect.
    ///
    /// # Errors
    ///
    /// Returns `UnknownApplication` if the schema does not list `name`.
    pub fn app_reference(&self, name: &str) -> Result<AppReference> {
        if let Some(reference) = self.inner.references.lock().get(name) {
            return Ok(reference.clone());
        }

        let schema = self
            .inner
            .schema
            .read()
            .as_ref()
            .and_then(|schema| schema.app(name).cloned())
            .ok_or_else(|| OnixError::UnknownApplication(name.to_string()))?;

        let reference = AppReference::new(name, schema, self.inner.invoker.clone());
        Ok(self
            .inner
            .references
            .lock()
            .entry(name.to_string())
            .or_insert(reference)
            .clone())
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state.lock()
    }

    /// Registration of the live connection.
    pub fn registration(&self) -> Option<ClientRegistration> {
        self.inner.invoker.registration()
    }

    /// Schema fetched by the last `init()`.
    pub fn schema(&self) -> Option<Schema> {
        self.inner.schema.read().clone()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// The listener registry shared by the connection and every reference.
    pub fn listeners(&self) -> &Arc<ListenerRegistry<Signal>> {
        self.inner.invoker.listeners()
    }

    /// Stored access token.
    pub fn token(&self) -> Result<Option<String>> {
        self.inner.invoker.credentials().token()
    }

    pub fn set_token(&self, token: &str) -> Result<()> {
        self.inner.invoker.credentials().set_token(token)
    }

    /// Claims of the current user.
    ///
    /// Persisted claims win. Otherwise, with an access token and a claims
    /// URL configured, the claims are fetched and persisted. Anonymous
    /// claims are returned when neither is available.
    pub async fn claims(&self, organization: Option<&str>) -> Result<Claims> {
        let credentials = self.inner.invoker.credentials();
        if let Some(claims) = credentials.stored_claims()? {
            return Ok(claims);
        }

        if let (Some(token), Some(base)) = (credentials.token()?, self.inner.config.claims_url.as_deref())
        {
            let url = claims_request_url(base, &token, organization)?;
            let value = self.inner.fetcher.get(&url).await?;
            let claims: Claims = serde_json::from_value(value)?;
            credentials.set_claims(&claims)?;
            return Ok(claims);
        }

        Ok(Claims::anonymous())
    }

    pub fn set_claims(&self, claims: &Claims) -> Result<()> {
        self.inner.invoker.credentials().set_claims(claims)
    }

    /// Forget the stored token and claims.
    pub fn logout(&self) -> Result<()> {
        self.inner.invoker.credentials().logout()
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("url", &self.inner.config.socket_url())
            .field("state", &self.state())
            .finish()
    }
}

impl Inner {
    async fn fetch_schema(&self, url: &str) -> Result<Schema> {
        let document = self.fetcher.get(url).await?;
        Schema::from_value(&document)
    }

    fn heartbeat_config(&self) -> HeartbeatConfig {
        HeartbeatConfig {
            interval: self.config.ping_interval(),
            timeout: self.config.ping_timeout(),
            attempts: self.config.attempts.ping,
        }
    }

    /// Open the socket and wait until the handshake finishes.
    async fn connect(self: &Arc<Self>) -> Result<()> {
        let url = self.config.socket_url();
        let lifecycle = self.lifecycle.lock().await;
        let events = match self.invoker.transport().connect(&url).await {
            Ok(events) => events,
            Err(e) => {
                tracing::error!("Unable to connect to {}: {}", url, e);
                self.disconnected(DisconnectReason::TransportError(e.to_string()), true);
                return Err(e);
            }
        };

        let token = CancellationToken::new();
        let (ready_tx, ready_rx) = oneshot::channel();
        let still_connecting = {
            let state = self.state.lock();
            if *state == ConnectionState::Connecting {
                if let Some(previous) = self.connection.lock().replace(token.clone()) {
                    previous.cancel();
                }
                *self.pending_init.lock() = Some(ready_tx);
                true
            } else {
                false
            }
        };
        if !still_connecting {
            // Closed while the socket was opening.
            if let Err(e) = self.invoker.transport().close().await {
                tracing::debug!("Close of abandoned connection failed: {}", e);
            }
            return Err(OnixError::ConnectionLost);
        }
        drop(lifecycle);

        tracing::info!("Connected to {}", url);
        tokio::spawn(pump(self.clone(), events, token));

        ready_rx.await.unwrap_or(Err(OnixError::ConnectionLost))
    }

    /// Move to `next` if `token` is still the live connection.
    fn advance(&self, token: &CancellationToken, next: ConnectionState) -> bool {
        let mut state = self.state.lock();
        if token.is_cancelled() {
            return false;
        }
        *state = next;
        true
    }

    fn resolve_init(&self, result: Result<()>) {
        if let Some(tx) = self.pending_init.lock().take() {
            let _ = tx.send(result);
        }
    }

    /// Tear down the live connection and notify observers.
    ///
    /// Returns `false` when there was nothing to tear down.
    fn disconnected(self: &Arc<Self>, reason: DisconnectReason, recoverable: bool) -> bool {
        {
            let mut state = self.state.lock();
            match *state {
                ConnectionState::Closed => return false,
                ConnectionState::Idle if !recoverable => {
                    *state = ConnectionState::Closed;
                    return false;
                }
                ConnectionState::Disconnected | ConnectionState::ReconnectWait => {
                    if !recoverable {
                        *state = ConnectionState::Closed;
                    }
                    return false;
                }
                _ => {}
            }
            *state = if recoverable {
                ConnectionState::Disconnected
            } else {
                ConnectionState::Closed
            };
            if let Some(token) = self.connection.lock().take() {
                token.cancel();
            }
        }

        tracing::warn!("Disconnected: {}", reason);
        self.invoker.set_registration(None);

        // Local state is gone before observers run, so an observer may
        // start a new `init()` right away.
        let listeners = self.invoker.listeners();
        listeners.remove_namespace_listeners(REMOTE);
        self.references.lock().clear();
        self.resolve_init(Err(OnixError::ConnectionLost));
        listeners.broadcast(DISCONNECT, &Signal::Disconnected(reason.clone()));

        if recoverable {
            {
                let mut state = self.state.lock();
                if *state != ConnectionState::Disconnected {
                    return true;
                }
                *state = ConnectionState::ReconnectWait;
            }

            let inner = self.clone();
            let delay = self.config.reconnect_interval();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if *inner.state.lock() != ConnectionState::ReconnectWait {
                    return;
                }
                tracing::info!("Notifying reconnect observers");
                inner
                    .invoker
                    .listeners()
                    .broadcast(RECONNECT, &Signal::Reconnect(reason));
            });
        }
        true
    }

    /// Failure scoped to the connection identified by `token`.
    fn connection_lost(self: &Arc<Self>, token: &CancellationToken, reason: DisconnectReason) -> bool {
        if token.is_cancelled() {
            return false;
        }
        self.disconnected(reason, true)
    }

    /// The peer closed normally: close without notifying observers.
    fn closed(&self, token: &CancellationToken) {
        {
            let mut state = self.state.lock();
            if token.is_cancelled() {
                return;
            }
            *state = ConnectionState::Closed;
            token.cancel();
            self.connection.lock().take();
        }
        self.invoker.set_registration(None);
        self.invoker.listeners().remove_namespace_listeners(REMOTE);
        self.references.lock().clear();
        self.resolve_init(Err(OnixError::ConnectionLost));
    }

    /// The server rejected the registration: terminal.
    fn registration_failed(self: &Arc<Self>, token: &CancellationToken, error: OnixError) {
        {
            let mut state = self.state.lock();
            if token.is_cancelled() {
                return;
            }
            *state = ConnectionState::Closed;
            token.cancel();
            self.connection.lock().take();
        }

        let reason = DisconnectReason::RegistrationFailed(error.to_string());
        tracing::error!("{}", reason);
        self.invoker.set_registration(None);
        let listeners = self.invoker.listeners();
        listeners.remove_namespace_listeners(REMOTE);
        self.references.lock().clear();
        self.resolve_init(Err(error));

        let inner = self.clone();
        tokio::spawn(async move {
            if let Err(e) = inner.close_transport().await {
                tracing::debug!("Close after rejected registration failed: {}", e);
            }
        });
        listeners.broadcast(DISCONNECT, &Signal::Disconnected(reason));
    }

    /// Close the transport after a teardown.
    ///
    /// Skipped when a newer connection was opened in the meantime, since
    /// closing would shut that one instead.
    async fn close_transport(&self) -> Result<()> {
        let _lifecycle = self.lifecycle.lock().await;
        if self.connection.lock().is_some() {
            tracing::debug!("Transport already reconnected, close skipped");
            return Ok(());
        }
        self.invoker.transport().close().await
    }
}

/// Route transport events until the connection ends.
async fn pump(
    inner: Arc<Inner>,
    mut events: mpsc::UnboundedReceiver<TransportEvent>,
    token: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            event = events.recv() => event,
            () = token.cancelled() => return,
        };

        match event {
            Some(TransportEvent::Open) => {
                tokio::spawn(handshake(inner.clone(), token.clone()));
            }
            Some(TransportEvent::Message(text)) => {
                let inbound = JsonCodec::decode(&text);
                tracing::trace!("<- {:?}", inbound);
                inner
                    .invoker
                    .listeners()
                    .broadcast(REMOTE, &Signal::Remote(inbound));
            }
            Some(TransportEvent::Close { code, .. }) if code == CLOSE_NORMAL => {
                tracing::info!("Connection closed");
                inner.closed(&token);
                return;
            }
            Some(TransportEvent::Close { code, reason }) => {
                inner.connection_lost(&token, DisconnectReason::Abnormal { code, reason });
                return;
            }
            Some(TransportEvent::Error(e)) => {
                tracing::error!("Transport error: {}", e);
                inner.connection_lost(&token, DisconnectReason::TransportError(e));
                return;
            }
            None => {
                inner.connection_lost(
                    &token,
                    DisconnectReason::Abnormal {
                        code: CLOSE_ABNORMAL,
                        reason: "event stream ended".into(),
                    },
                );
                return;
            }
        }
    }
}

/// Wait for a writable socket, start the heartbeat and register.
async fn handshake(inner: Arc<Inner>, token: CancellationToken) {
    let poll = inner.config.ready_poll_interval();
    while !inner.invoker.transport().is_ready() {
        tokio::select! {
            _ = tokio::time::sleep(poll) => {}
            () = token.cancelled() => return,
        }
    }

    tokio::spawn(heartbeat(inner.clone(), token.clone()));

    if !inner.advance(&token, ConnectionState::Registering) {
        return;
    }

    let result = tokio::select! {
        result = control::register(&inner.invoker) => result,
        () = token.cancelled() => return,
    };

    match result {
        Ok(registration) => {
            tracing::info!("Client registered as {}", registration.uuid);
            inner.invoker.set_registration(Some(registration));
            if inner.advance(&token, ConnectionState::Ready) {
                inner.resolve_init(Ok(()));
            } else {
                inner.invoker.set_registration(None);
            }
        }
        Err(e @ OnixError::RegistrationRejected { .. }) => {
            inner.registration_failed(&token, e);
        }
        Err(e) => {
            tracing::error!("Client registration failed: {}", e);
            inner.connection_lost(
                &token,
                DisconnectReason::TransportError(format!("registration failed: {}", e)),
            );
        }
    }
}

async fn heartbeat(inner: Arc<Inner>, token: CancellationToken) {
    let result =
        control::run_heartbeat(inner.invoker.clone(), inner.heartbeat_config(), token.clone())
            .await;

    if result == HeartbeatResult::TimedOut {
        tracing::warn!("Heartbeat timed out, forcing disconnect");
        if inner.connection_lost(&token, DisconnectReason::HeartbeatTimeout) {
            if let Err(e) = inner.close_transport().await {
                tracing::debug!("Close after heartbeat timeout failed: {}", e);
            }
        }
    }
}
