//! Call a greeting method and follow a stream on an OnixJS server.
//!
//! ```text
//! ONIX_HOST=http://localhost ONIX_PORT=3000 RUST_LOG=onix_client=debug \
//!     cargo run --example greet
//! ```

use std::time::Duration;

use onix_client::{Client, OnixError};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), OnixError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let host = std::env::var("ONIX_HOST").unwrap_or_else(|_| "http://localhost".to_string());
    let port = std::env::var("ONIX_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    let client = Client::builder()
        .host(host)
        .port(port)
        .auto_reconnect(true)
        .build()?;

    client.on_disconnect(|reason| tracing::warn!("disconnected: {}", reason));
    client.init().await?;

    let component = client
        .app_reference("TodoApp")?
        .module("TodoModule")
        .component("TodoComponent");

    let reply = component
        .method("greet")
        .call(json!({ "name": "onix" }), None)
        .await?;
    tracing::info!("greet -> {}", reply);

    let subscription = component
        .method("todos")
        .stream(|todo| tracing::info!("todo: {}", todo), None)
        .await?;

    tokio::time::sleep(Duration::from_secs(10)).await;

    subscription.unsubscribe().await?;
    client.disconnect().await
}
