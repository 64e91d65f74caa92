//! Error types shared across the DevMind crates.

use thiserror::Error;

/// Errors produced by the foundation types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// An identifier string failed to parse as a UUID.
    #[error("invalid {kind} id: {value:?}")]
    InvalidId {
        /// Which id kind was being parsed ("connection", "project", ...).
        kind: &'static str,
        /// The rejected input.
        value: String,
    },
}
