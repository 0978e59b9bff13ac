//! WebSocket transport over `tokio-tungstenite`.
//!
//! # Example
//!
//! ```ignore
//! use onix_client::transport::{Transport, TransportEvent, WsTransport};
//!
//! let transport = WsTransport::new();
//! let mut events = transport.connect("ws://localhost:3000").await?;
//! transport.send("hello".to_string()).await?;
//! while let Some(event) = events.recv().await {
//!     if let TransportEvent::Message(text) = event {
//!         println!("{}", text);
//!     }
//! }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use super::{Transport, TransportEvent, CLOSE_ABNORMAL, CLOSE_NO_STATUS};
use crate::error::{OnixError, Result};
use crate::writer::{spawn_writer_task, WriterHandle, DEFAULT_CHANNEL_CAPACITY};

struct Connection {
    writer: WriterHandle,
    reader: JoinHandle<()>,
}

/// Default [`Transport`] implementation.
pub struct WsTransport {
    connection: Mutex<Option<Connection>>,
    ready: Arc<AtomicBool>,
}

impl WsTransport {
    pub fn new() -> Self {
        Self {
            connection: Mutex::new(None),
            ready: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl Default for WsTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn connect(&self, url: &str) -> Result<mpsc::UnboundedReceiver<TransportEvent>> {
        let previous = self.connection.lock().take();
        if let Some(previous) = previous {
            previous.reader.abort();
        }

        tracing::debug!("Connecting to {}", url);
        let (ws, _) = connect_async(url).await?;
        let (sink, stream) = ws.split();
        let (writer, _writer_task) = spawn_writer_task(sink, DEFAULT_CHANNEL_CAPACITY);

        let (tx, rx) = mpsc::unbounded_channel();
        self.ready.store(true, Ordering::Release);
        let _ = tx.send(TransportEvent::Open);

        let reader = tokio::spawn(read_loop(stream, tx, self.ready.clone()));
        *self.connection.lock() = Some(Connection { writer, reader });
        Ok(rx)
    }

    async fn send(&self, frame: String) -> Result<()> {
        let writer = self
            .connection
            .lock()
            .as_ref()
            .map(|c| c.writer.clone())
            .ok_or(OnixError::NotConnected)?;
        writer.send(frame).await
    }

    async fn close(&self) -> Result<()> {
        let connection = self.connection.lock().take();
        self.ready.store(false, Ordering::Release);
        if let Some(connection) = connection {
            // The writer may already be gone if the peer closed first.
            if let Err(e) = connection.writer.close().await {
                tracing::debug!("Close frame not sent: {}", e);
            }
            connection.reader.abort();
        }
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
            && self
                .connection
                .lock()
                .as_ref()
                .is_some_and(|c| !c.writer.is_closed())
    }
}

async fn read_loop<S>(mut stream: S, tx: mpsc::UnboundedSender<TransportEvent>, ready: Arc<AtomicBool>)
where
    S: futures::Stream<Item = std::result::Result<Message, tokio_tungstenite::tungstenite::Error>>
        + Unpin,
{
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => {
                let _ = tx.send(TransportEvent::Message(text.as_str().to_string()));
            }
            Ok(Message::Binary(data)) => {
                let text = String::from_utf8_lossy(&data).into_owned();
                let _ = tx.send(TransportEvent::Message(text));
            }
            Ok(Message::Close(frame)) => {
                ready.store(false, Ordering::Release);
                let (code, reason) = match frame {
                    Some(frame) => (u16::from(frame.code), frame.reason.as_str().to_string()),
                    None => (CLOSE_NO_STATUS, String::new()),
                };
                let _ = tx.send(TransportEvent::Close { code, reason });
                return;
            }
            Ok(_) => {}
            Err(e) => {
                ready.store(false, Ordering::Release);
                tracing::error!("WebSocket read error: {}", e);
                let _ = tx.send(TransportEvent::Error(e.to_string()));
                let _ = tx.send(TransportEvent::Close {
                    code: CLOSE_ABNORMAL,
                    reason: String::new(),
                });
                return;
            }
        }
    }

    ready.store(false, Ordering::Release);
    let _ = tx.send(TransportEvent::Close {
        code: CLOSE_ABNORMAL,
        reason: String::new(),
    });
}
