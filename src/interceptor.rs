//! Hooks that rewrite envelopes around a call.
//!
//! Interceptors are registered on the [`ClientBuilder`](crate::ClientBuilder)
//! and shared by every method reference of that client. `before` hooks see
//! outgoing call requests in registration order; `after` hooks see call
//! responses in reverse order. Stream subscriptions bypass the chain.
//!
//! # Example
//!
//! ```ignore
//! use async_trait::async_trait;
//! use onix_client::interceptor::Interceptor;
//! use onix_client::protocol::Envelope;
//! use onix_client::error::Result;
//!
//! struct Tenant(String);
//!
//! #[async_trait]
//! impl Interceptor for Tenant {
//!     async fn before(&self, mut envelope: Envelope) -> Result<Envelope> {
//!         envelope
//!             .message
//!             .request
//!             .metadata
//!             .extra
//!             .insert("tenant".into(), self.0.clone().into());
//!         Ok(envelope)
//!     }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::protocol::Envelope;

/// Envelope rewrite hook. Both methods pass the envelope through by default.
#[async_trait]
pub trait Interceptor: Send + Sync {
    /// Rewrite an outgoing request before it is sent.
    async fn before(&self, envelope: Envelope) -> Result<Envelope> {
        Ok(envelope)
    }

    /// Rewrite a response before its payload is handed to the caller.
    async fn after(&self, envelope: Envelope) -> Result<Envelope> {
        Ok(envelope)
    }
}

/// Ordered list of interceptors.
#[derive(Clone, Default)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, interceptor: Arc<dyn Interceptor>) {
        self.interceptors.push(interceptor);
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Run every `before` hook in registration order.
    pub async fn before(&self, mut envelope: Envelope) -> Result<Envelope> {
        for interceptor in &self.interceptors {
            envelope = interceptor.before(envelope).await?;
        }
        Ok(envelope)
    }

    /// Run every `after` hook in reverse registration order.
    pub async fn after(&self, mut envelope: Envelope) -> Result<Envelope> {
        for interceptor in self.interceptors.iter().rev() {
            envelope = interceptor.after(envelope).await?;
        }
        Ok(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OnixError;
    use crate::protocol::{Metadata, OperationKind};
    use serde_json::{json, Value};

    /// Appends its tag to a `trail` array in the payload.
    struct Tag(&'static str);

    fn push_tag(mut envelope: Envelope, tag: &str) -> Envelope {
        let payload = &mut envelope.message.request.payload;
        if !payload.is_array() {
            *payload = json!([]);
        }
        if let Value::Array(items) = payload {
            items.push(json!(tag));
        }
        envelope
    }

    #[async_trait]
    impl Interceptor for Tag {
        async fn before(&self, envelope: Envelope) -> Result<Envelope> {
            Ok(push_tag(envelope, self.0))
        }

        async fn after(&self, envelope: Envelope) -> Result<Envelope> {
            Ok(push_tag(envelope, self.0))
        }
    }

    struct Deny;

    #[async_trait]
    impl Interceptor for Deny {
        async fn before(&self, _envelope: Envelope) -> Result<Envelope> {
            Err(OnixError::Interceptor("denied".into()))
        }
    }

    fn envelope() -> Envelope {
        Envelope::new(
            OperationKind::CallProcedure,
            "A.B.C.d",
            Metadata::default(),
            Value::Null,
        )
    }

    #[tokio::test]
    async fn test_empty_chain_passes_through() {
        let chain = InterceptorChain::new();
        let original = envelope();
        assert_eq!(chain.before(original.clone()).await.unwrap(), original);
        assert_eq!(chain.after(original.clone()).await.unwrap(), original);
    }

    #[tokio::test]
    async fn test_order() {
        let mut chain = InterceptorChain::new();
        chain.push(Arc::new(Tag("first")));
        chain.push(Arc::new(Tag("second")));

        let out = chain.before(envelope()).await.unwrap();
        assert_eq!(out.payload(), &json!(["first", "second"]));

        let back = chain.after(envelope()).await.unwrap();
        assert_eq!(back.payload(), &json!(["second", "first"]));
    }

    #[tokio::test]
    async fn test_error_stops_chain() {
        let mut chain = InterceptorChain::new();
        chain.push(Arc::new(Deny));
        chain.push(Arc::new(Tag("never")));

        assert!(matches!(
            chain.before(envelope()).await,
            Err(OnixError::Interceptor(_))
        ));
        // Deny keeps the default pass-through for responses.
        assert_eq!(chain.after(envelope()).await.unwrap().payload(), &json!(["never"]));
    }
}
