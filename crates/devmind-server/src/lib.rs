//! # devmind-server
//!
//! Axum HTTP + WebSocket server for DevMind Live: the connection
//! registry, the fan-out broadcaster, the client protocol handler, and
//! the HTTP trigger surface external collaborators use to originate
//! notifications.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `websocket` | Registry, broadcaster, per-connection read/write loops |
//! | `notify` | Typed notification entry points with project routing |
//! | `http` | Router: `/ws/live` upgrade, trigger endpoints, stats, health |
//! | `state` | Shared application state handed to every handler |
//! | `metrics` | Prometheus recorder and metric name constants |
//!
//! ## Data Flow
//!
//! Trigger endpoint → [`notify::Notifier`] builds a typed envelope →
//! [`websocket::Broadcaster`] resolves the audience via
//! [`websocket::ConnectionRegistry`] and pushes the serialized envelope to
//! each live connection, evicting any connection that fails to receive.

#![deny(unsafe_code)]

pub mod http;
pub mod metrics;
pub mod notify;
pub mod state;
pub mod websocket;

pub use state::AppState;
