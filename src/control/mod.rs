//! Control module - schema, registration handshake and heartbeat.
//!
//! These are the pieces of the connection lifecycle that talk to the
//! server on the client's own behalf rather than on behalf of a method
//! reference:
//!
//! 1. [`Schema`] is fetched before the socket is opened
//! 2. [`ClientRegistration`] is negotiated once the socket is writable
//! 3. the heartbeat runs for as long as the connection lives

mod heartbeat;
mod register;
mod schema;

pub use heartbeat::{HeartbeatConfig, HeartbeatResult};
pub use register::{ClientRegistration, REGISTER_RPC};
pub use schema::{AppSchema, MethodKind, Schema};

pub(crate) use heartbeat::run_heartbeat;
pub(crate) use register::register;
