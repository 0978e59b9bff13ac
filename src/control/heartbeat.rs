//! Heartbeat ping/echo liveness monitoring.
//!
//! Every `interval` the client sends a millisecond timestamp as a bare
//! text frame and waits for the server to echo it back. The echo must
//! match the token exactly, either as a JSON string or as a number. Each
//! unanswered `timeout` counts as one missed attempt; once `attempts`
//! misses accumulate for the same ping the connection is considered dead.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_json::Value;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::codec::Inbound;
use crate::error::OnixError;
use crate::invoker::Invoker;

/// Outcome of the heartbeat loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeartbeatResult {
    /// The server stopped echoing within the attempt budget.
    TimedOut,
    /// The heartbeat was cancelled externally.
    Cancelled,
}

/// Heartbeat timing.
#[derive(Debug, Clone, Copy)]
pub struct HeartbeatConfig {
    /// Delay between the previous echo and the next ping.
    pub interval: Duration,
    /// Wait per attempt.
    pub timeout: Duration,
    /// Attempts before giving up.
    pub attempts: u32,
}

/// Millisecond timestamp used as the ping token.
pub(crate) fn ping_token() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
        .to_string()
}

/// Whether `value` is the echo of `token`.
pub(crate) fn is_echo(value: &Value, token: &str) -> bool {
    match value {
        Value::String(s) => s == token,
        Value::Number(n) => n.to_string() == token,
        _ => false,
    }
}

/// Run heartbeat pings until cancelled or timed out.
pub(crate) async fn run_heartbeat(
    invoker: Arc<Invoker>,
    config: HeartbeatConfig,
    cancel: CancellationToken,
) -> HeartbeatResult {
    let attempts = config.attempts.max(1);

    loop {
        tokio::select! {
            _ = time::sleep(config.interval) => {}
            () = cancel.cancelled() => return HeartbeatResult::Cancelled,
        }

        let token = ping_token();
        let echo = {
            let token = token.clone();
            invoker.expect(move |signal| match signal.as_remote()? {
                Inbound::Raw(value) if is_echo(value, &token) => Some(()),
                _ => None,
            })
        };

        if let Err(e) = invoker.transport().send(token.clone()).await {
            tracing::warn!("Heartbeat ping failed: {}", e);
        }

        let mut missed: u32 = 0;
        let mut echo = Box::pin(echo.wait(None, "heartbeat"));
        loop {
            tokio::select! {
                result = &mut echo => match result {
                    Ok(()) => break,
                    // Listener purged: the connection is going down anyway.
                    Err(OnixError::ConnectionLost) => return HeartbeatResult::Cancelled,
                    Err(e) => {
                        tracing::error!("Heartbeat wait failed: {}", e);
                        return HeartbeatResult::Cancelled;
                    }
                },
                _ = time::sleep(config.timeout) => {
                    missed += 1;
                    tracing::warn!("Heartbeat echo missing ({}/{})", missed, attempts);
                    if missed >= attempts {
                        return HeartbeatResult::TimedOut;
                    }
                }
                () = cancel.cancelled() => return HeartbeatResult::Cancelled,
            }
        }
        tracing::trace!("Heartbeat echo {}", token);
    }
}
