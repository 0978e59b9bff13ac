//! Client configuration.
//!
//! [`ClientConfig`] is plain data: it can be built in code through
//! [`ClientBuilder`](crate::ClientBuilder) or deserialized from any serde
//! format. All intervals are expressed in milliseconds.
//!
//! # Example
//!
//! ```
//! use onix_client::ClientConfig;
//!
//! let config: ClientConfig =
//!     serde_json::from_str(r#"{ "host": "https://api.example.com", "port": 443 }"#).unwrap();
//!
//! assert_eq!(config.socket_url(), "wss://api.example.com:443");
//! assert_eq!(config.intervals.ping, 5000);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default storage key prefix.
pub const DEFAULT_PREFIX: &str = "onixjs:sdk";

/// Well-known path where the server publishes its schema.
pub const SCHEMA_PATH: &str = "/.well-known/onixjs-schema";

/// Default heartbeat interval in milliseconds.
pub const DEFAULT_PING_INTERVAL: u64 = 5000;

/// Default heartbeat echo timeout (per attempt) in milliseconds.
pub const DEFAULT_PING_TIMEOUT: u64 = 1000;

/// Default delay before reconnect observers are notified, in milliseconds.
pub const DEFAULT_RECONNECT_INTERVAL: u64 = 5000;

/// Default socket readiness poll interval in milliseconds.
pub const DEFAULT_READY_POLL_INTERVAL: u64 = 100;

/// Default timeout for correlated calls in milliseconds.
pub const DEFAULT_CALL_TIMEOUT: u64 = 30_000;

/// Default number of missed heartbeat cycles before disconnecting.
pub const DEFAULT_PING_ATTEMPTS: u32 = 3;

/// Timer settings, all in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Intervals {
    /// Time between heartbeat pings.
    pub ping: u64,
    /// Time waited for a ping echo per attempt.
    pub timeout: u64,
    /// Delay between a disconnect and the reconnect notification.
    pub reconnect: u64,
    /// Poll interval while waiting for the socket to become writable.
    pub ready_poll: u64,
    /// Timeout for calls, subscriptions and registration. `0` disables it.
    pub call: u64,
}

impl Default for Intervals {
    fn default() -> Self {
        Self {
            ping: DEFAULT_PING_INTERVAL,
            timeout: DEFAULT_PING_TIMEOUT,
            reconnect: DEFAULT_RECONNECT_INTERVAL,
            ready_poll: DEFAULT_READY_POLL_INTERVAL,
            call: DEFAULT_CALL_TIMEOUT,
        }
    }
}

/// Retry budgets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attempts {
    /// Missed heartbeat cycles tolerated before a forced disconnect.
    pub ping: u32,
}

impl Default for Attempts {
    fn default() -> Self {
        Self {
            ping: DEFAULT_PING_ATTEMPTS,
        }
    }
}

/// Complete client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server host, optionally with an `http://` or `https://` prefix.
    pub host: String,
    /// Server port. Port 443 selects `wss`.
    pub port: u16,
    /// Prefix for every key written to the key-value store.
    pub prefix: String,
    /// Timer settings.
    pub intervals: Intervals,
    /// Retry budgets.
    pub attempts: Attempts,
    /// Endpoint returning OIDC claims for an access token.
    pub claims_url: Option<String>,
    /// Re-run `init()` automatically when reconnect observers fire.
    pub auto_reconnect: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 80,
            prefix: DEFAULT_PREFIX.to_string(),
            intervals: Intervals::default(),
            attempts: Attempts::default(),
            claims_url: None,
            auto_reconnect: false,
        }
    }
}

impl ClientConfig {
    /// Create a config for the given host and port with default timers.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// URL of the published schema document.
    pub fn schema_url(&self) -> String {
        format!("{}:{}{}", self.host, self.port, SCHEMA_PATH)
    }

    /// WebSocket URL derived from host and port.
    pub fn socket_url(&self) -> String {
        let scheme = if self.port == 443 { "wss" } else { "ws" };
        format!("{}://{}:{}", scheme, strip_http_scheme(&self.host), self.port)
    }

    /// Heartbeat interval.
    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.intervals.ping)
    }

    /// Per-attempt heartbeat echo timeout.
    pub fn ping_timeout(&self) -> Duration {
        Duration::from_millis(self.intervals.timeout)
    }

    /// Delay before reconnect observers fire.
    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.intervals.reconnect)
    }

    /// Socket readiness poll interval.
    pub fn ready_poll_interval(&self) -> Duration {
        Duration::from_millis(self.intervals.ready_poll)
    }

    /// Call timeout, `None` when disabled.
    pub fn call_timeout(&self) -> Option<Duration> {
        match self.intervals.call {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

/// Whole milliseconds of `duration`, saturating at `u64::MAX`.
pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn strip_http_scheme(host: &str) -> &str {
    host.strip_prefix("https://")
        .or_else(|| host.strip_prefix("http://"))
        .unwrap_or(host)
}
