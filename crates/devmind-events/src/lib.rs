//! # devmind-events
//!
//! Wire types for the DevMind real-time channel.
//!
//! Every message exchanged over the WebSocket is a JSON envelope
//! `{"type": "<tag>", "data": {...}}`. Two enums cover the two directions:
//!
//! - **[`envelope::ServerMessage`]**: server → client. One variant per
//!   envelope type, each carrying its own typed payload, serialized via a
//!   single tagged-enum encode path.
//! - **[`client::ClientRequest`]**: client → server. Parsed from inbound
//!   frames with malformed/unknown frames surfaced as [`client::FrameError`]
//!   so the handler can reply with an `error` envelope.
//!
//! Payload structs and status enums live in [`payloads`]. Envelope
//! timestamps are assigned at construction (send) time, not at the
//! originating business event time.

#![deny(unsafe_code)]

pub mod client;
pub mod envelope;
pub mod payloads;

pub use client::{ClientRequest, FrameError};
pub use envelope::ServerMessage;
pub use payloads::{
    IntegrationStatus, IntegrationUpdate, QueryStatus, QueryUpdate, RegistryStats,
};
