//! Transport module - the socket the client multiplexes over.
//!
//! [`Transport`] is the seam between the connection manager and the
//! network. A transport delivers everything that happens on the socket as
//! [`TransportEvent`]s on the channel returned by [`Transport::connect`],
//! and accepts outbound text frames through [`Transport::send`].
//!
//! [`WsTransport`] is the default implementation over `tokio-tungstenite`.

mod websocket;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;

pub use websocket::WsTransport;

/// WebSocket close code for a normal closure.
pub const CLOSE_NORMAL: u16 = 1000;

/// Close code reported when the peer sent a close frame without a code.
pub const CLOSE_NO_STATUS: u16 = 1005;

/// Close code reported when the socket ended without a close frame.
pub const CLOSE_ABNORMAL: u16 = 1006;

/// Something that happened on the socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The socket is open.
    Open,
    /// A text frame arrived.
    Message(String),
    /// The socket closed. Always the last event of a connection.
    Close {
        /// WebSocket close code.
        code: u16,
        /// Close reason, may be empty.
        reason: String,
    },
    /// The socket failed. Followed by nothing or by a `Close`.
    Error(String),
}

/// A bidirectional text-frame socket.
///
/// One transport instance serves one client. `connect` may be called again
/// after the previous connection ended; implementations drop the previous
/// connection state when it is.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open a connection to `url` and return its event stream.
    async fn connect(&self, url: &str) -> Result<mpsc::UnboundedReceiver<TransportEvent>>;

    /// Send one text frame.
    async fn send(&self, frame: String) -> Result<()>;

    /// Close the connection. Closing an idle transport is a no-op.
    async fn close(&self) -> Result<()>;

    /// Whether the socket is open and writable.
    fn is_ready(&self) -> bool;
}
