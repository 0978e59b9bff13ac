//! Protocol module - operation kinds and the correlation envelope.
//!
//! Every frame sent or received over the socket is one JSON-encoded
//! [`Envelope`], tagged with an [`OperationKind`] and correlated by its
//! `uuid`.

mod envelope;
mod operation;

pub use envelope::{generate_uuid, Envelope, Message, Metadata, Request};
pub use operation::OperationKind;
