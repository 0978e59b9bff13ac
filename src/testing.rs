//! Test doubles shared by unit tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::codec::{Inbound, JsonCodec};
use crate::control::ClientRegistration;
use crate::error::Result;
use crate::interceptor::InterceptorChain;
use crate::invoker::Invoker;
use crate::listener::{ListenerRegistry, Signal, REMOTE};
use crate::protocol::Envelope;
use crate::storage::{Credentials, MemoryStore};
use crate::transport::{Transport, TransportEvent};

/// Transport that records every frame it is asked to send.
#[derive(Default)]
pub(crate) struct RecordingTransport {
    sent: Mutex<Vec<String>>,
    events: Mutex<Option<mpsc::UnboundedSender<TransportEvent>>>,
    ready: AtomicBool,
}

impl RecordingTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }

    /// Wait until at least `n` frames were sent and return the `n`th envelope.
    pub(crate) async fn nth_envelope(&self, n: usize) -> Envelope {
        loop {
            let frame = self.sent.lock().get(n).cloned();
            if let Some(frame) = frame {
                match JsonCodec::decode(&frame) {
                    Inbound::Operation(envelope) => return envelope,
                    Inbound::Raw(value) => panic!("frame {} is not an envelope: {}", n, value),
                }
            }
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn connect(&self, _url: &str) -> Result<mpsc::UnboundedReceiver<TransportEvent>> {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(TransportEvent::Open);
        *self.events.lock() = Some(tx);
        self.ready.store(true, Ordering::SeqCst);
        Ok(rx)
    }

    async fn send(&self, frame: String) -> Result<()> {
        self.sent.lock().push(frame);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.ready.store(false, Ordering::SeqCst);
        self.events.lock().take();
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

/// Registered invoker over `transport` with a one second call timeout.
pub(crate) fn invoker(transport: Arc<RecordingTransport>) -> Arc<Invoker> {
    intercepted_invoker(transport, InterceptorChain::new())
}

/// Like [`invoker`], with an interceptor chain.
pub(crate) fn intercepted_invoker(
    transport: Arc<RecordingTransport>,
    interceptors: InterceptorChain,
) -> Arc<Invoker> {
    let invoker = Invoker::new(
        transport,
        Arc::new(ListenerRegistry::new()),
        Credentials::new(Arc::new(MemoryStore::new()), "test"),
        interceptors,
        Some(Duration::from_secs(1)),
    );
    invoker.set_registration(Some(ClientRegistration {
        uuid: "reg-1".into(),
    }));
    Arc::new(invoker)
}

/// Feed an inbound envelope to the `remote` namespace.
pub(crate) fn deliver(invoker: &Invoker, envelope: Envelope) {
    invoker
        .listeners()
        .broadcast(REMOTE, &Signal::Remote(Inbound::Operation(envelope)));
}
