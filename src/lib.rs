//! # onix-client
//!
//! Rust client SDK for OnixJS remote procedures and streams.
//!
//! One WebSocket connection carries every call and stream subscription of
//! the client. Frames are JSON envelopes correlated by uuid; inbound frames
//! are broadcast through a namespaced listener registry where each pending
//! call or stream picks out the replies addressed to it.
//!
//! ## Architecture
//!
//! - **Bootstrap** (HTTP): the server schema is fetched from
//!   `/.well-known/onixjs-schema` before connecting
//! - **Connection** (WebSocket): register, heartbeat, calls, streams
//! - **References**: `App -> Module -> Component -> Method` addressing,
//!   validated against the schema
//!
//! ## Example
//!
//! ```ignore
//! use onix_client::Client;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::builder().host("localhost").port(3000).build()?;
//!     client.init().await?;
//!
//!     let todos = client.app_reference("TodoApp")?
//!         .module("TodoModule")
//!         .component("TodoComponent");
//!
//!     let subscription = todos
//!         .method("listen")
//!         .stream(|todo| println!("new todo: {}", todo), None)
//!         .await?;
//!
//!     todos.method("addTodo").call(json!({ "text": "ship it" }), None).await?;
//!
//!     subscription.unsubscribe().await?;
//!     client.disconnect().await?;
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod config;
pub mod control;
pub mod error;
pub mod fetch;
pub mod interceptor;
pub mod listener;
pub mod protocol;
pub mod reference;
pub mod storage;
pub mod transport;

mod client;
mod invoker;
mod subscription;
mod writer;

#[cfg(test)]
mod testing;

pub use client::{Client, ClientBuilder, ConnectionState};
pub use config::ClientConfig;
pub use error::{OnixError, Result};
pub use listener::{DisconnectReason, Signal};
pub use reference::{AppReference, ComponentReference, MethodReference, ModuleReference};
pub use storage::Claims;
pub use subscription::Subscription;
