//! Error types for onix-client.

use thiserror::Error;

/// Main error type for all client operations.
#[derive(Debug, Error)]
pub enum OnixError {
    /// I/O error (file-backed storage).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP error from the schema/claims fetcher.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// WebSocket error from the socket adapter.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// The server schema could not be fetched during `init()`.
    #[error("Unable to get host schema from {url}: {reason}")]
    SchemaUnavailable {
        /// Schema URL that was requested.
        url: String,
        /// Why the fetch failed.
        reason: String,
    },

    /// The schema document does not have the expected shape.
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// The server answered the client registration with an error payload.
    #[error("Client registration rejected ({code}): {message}")]
    RegistrationRejected {
        /// Error code sent by the server.
        code: String,
        /// Error message sent by the server.
        message: String,
    },

    /// The requested application is not part of the fetched schema.
    #[error("Application {0} doesn't exist on the server environment")]
    UnknownApplication(String),

    /// The method does not exist or is declared with another call kind.
    #[error("Unable to call {0}, RPC doesn't exist on server")]
    MethodUnavailable(String),

    /// No correlated response arrived in time.
    #[error("Timed out after {timeout_ms}ms: {context}")]
    Timeout {
        /// How long we waited.
        timeout_ms: u64,
        /// What we were waiting for.
        context: String,
    },

    /// The connection dropped while an operation was pending.
    #[error("Connection lost")]
    ConnectionLost,

    /// The socket adapter failed to open, write or close.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The transport has no open connection.
    #[error("Not connected")]
    NotConnected,

    /// Operation not allowed in the current connection state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Protocol error (unknown operation kind, malformed envelope, etc.).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// An interceptor refused or failed to transform an envelope.
    #[error("Interceptor error: {0}")]
    Interceptor(String),

    /// Key-value storage failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type alias using OnixError.
pub type Result<T> = std::result::Result<T, OnixError>;
