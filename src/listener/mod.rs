//! Listener registry and the signals the client routes through it.
//!
//! Three namespaces are used by the client:
//!
//! - [`REMOTE`] - every decoded inbound frame, consumed by pending calls
//!   and stream subscriptions
//! - [`DISCONNECT`] - user disconnect observers
//! - [`RECONNECT`] - user reconnect observers

mod registry;
mod signal;

pub use registry::{Listener, ListenerGuard, ListenerId, ListenerRegistry};
pub use signal::{DisconnectReason, Signal, DISCONNECT, RECONNECT, REMOTE};
