//! Dedicated writer task for outbound socket frames.
//!
//! The write half of the socket is owned by one task that receives frames
//! via an mpsc channel, so senders never contend on a lock around the sink.
//! Frames that are already queued when the task wakes up are fed as one
//! batch and flushed once.
//!
//! # Architecture
//!
//! ```text
//! call()      ─┐
//! heartbeat   ─┼─► mpsc::Sender<OutboundFrame> ─► Writer Task ─► WebSocket sink
//! register    ─┘
//! ```

use futures::{Sink, SinkExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;

use crate::error::{OnixError, Result};

/// Default channel capacity.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Maximum frames to batch before a flush.
const MAX_BATCH_SIZE: usize = 64;

/// A frame queued for the socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    /// A text frame.
    Text(String),
    /// A normal close frame. The writer stops after sending it.
    Close,
}

impl OutboundFrame {
    fn into_message(self) -> Message {
        match self {
            Self::Text(text) => Message::text(text),
            Self::Close => Message::Close(Some(CloseFrame {
                code: CloseCode::Normal,
                reason: "".into(),
            })),
        }
    }
}

/// Handle for sending frames to the writer task.
///
/// Cheaply cloneable.
#[derive(Clone)]
pub struct WriterHandle {
    tx: mpsc::Sender<OutboundFrame>,
}

impl WriterHandle {
    /// Queue a text frame.
    pub async fn send(&self, text: String) -> Result<()> {
        self.tx
            .send(OutboundFrame::Text(text))
            .await
            .map_err(|_| OnixError::NotConnected)
    }

    /// Queue a close frame.
    pub async fn close(&self) -> Result<()> {
        self.tx
            .send(OutboundFrame::Close)
            .await
            .map_err(|_| OnixError::NotConnected)
    }

    /// Whether the writer task has stopped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Spawn the writer task over `sink`.
///
/// Returns the handle and the task; the task ends after a close frame,
/// when every handle is dropped, or on the first write error.
pub fn spawn_writer_task<S>(sink: S, capacity: usize) -> (WriterHandle, JoinHandle<Result<()>>)
where
    S: Sink<Message> + Unpin + Send + 'static,
    S::Error: std::fmt::Display,
{
    let (tx, rx) = mpsc::channel(capacity);
    let task = tokio::spawn(writer_loop(rx, sink));
    (WriterHandle { tx }, task)
}

async fn writer_loop<S>(mut rx: mpsc::Receiver<OutboundFrame>, mut sink: S) -> Result<()>
where
    S: Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    loop {
        let first = match rx.recv().await {
            Some(frame) => frame,
            None => return Ok(()),
        };

        let mut batch = Vec::with_capacity(MAX_BATCH_SIZE);
        batch.push(first);
        while batch.len() < MAX_BATCH_SIZE {
            match rx.try_recv() {
                Ok(frame) => batch.push(frame),
                Err(_) => break,
            }
        }

        let mut closing = false;
        for frame in batch {
            closing = frame == OutboundFrame::Close;
            sink.feed(frame.into_message()).await.map_err(write_error)?;
            if closing {
                break;
            }
        }
        sink.flush().await.map_err(write_error)?;

        if closing {
            tracing::debug!("Writer sent close frame");
            return Ok(());
        }
    }
}

fn write_error<E: std::fmt::Display>(e: E) -> OnixError {
    OnixError::Transport(format!("socket write failed: {}", e))
}
