//! Inbound frame parsing — [`ClientRequest`] and [`FrameError`].
//!
//! Client frames use the same `{"type", "data"}` envelope as server
//! messages. Parsing is two-step (raw envelope first, then tag dispatch)
//! so an unknown `type` can be named in the error reply instead of
//! collapsing into a generic deserialization failure.

use devmind_core::ids::ProjectId;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// A recognized client → server request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientRequest {
    /// Subscribe to one project's notifications.
    SubscribeProject {
        /// The validated project id.
        project_id: ProjectId,
    },
    /// Subscribe to system-wide notifications.
    SubscribeGeneral,
    /// Liveness probe; answered with `pong`.
    Ping,
    /// Request the registry stats aggregate.
    GetStats,
}

/// Why an inbound frame was rejected.
///
/// The display strings are the wire `error` messages clients see, so
/// they are part of the protocol surface.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// The frame was not a JSON envelope at all.
    #[error("Invalid JSON format")]
    Malformed,
    /// The envelope's `type` is not one we recognize.
    #[error("Unknown message type: {0}")]
    UnknownType(String),
    /// `subscribe_project` without a parseable `project_id`.
    #[error("Invalid project ID format")]
    InvalidProjectId,
}

/// Raw `{"type", "data"}` envelope, before tag dispatch.
#[derive(Deserialize)]
struct RawFrame {
    #[serde(rename = "type")]
    frame_type: String,
    #[serde(default)]
    data: Value,
}

impl ClientRequest {
    /// Parse one inbound text frame.
    ///
    /// A missing `data` object is treated as empty, matching clients
    /// that send bare `{"type": "ping"}` frames.
    pub fn parse(text: &str) -> Result<Self, FrameError> {
        let frame: RawFrame = serde_json::from_str(text).map_err(|_| FrameError::Malformed)?;

        match frame.frame_type.as_str() {
            "subscribe_project" => {
                let project_id = frame
                    .data
                    .get("project_id")
                    .and_then(Value::as_str)
                    .and_then(|raw| raw.parse().ok())
                    .ok_or(FrameError::InvalidProjectId)?;
                Ok(Self::SubscribeProject { project_id })
            }
            "subscribe_general" => Ok(Self::SubscribeGeneral),
            "ping" => Ok(Self::Ping),
            "get_stats" => Ok(Self::GetStats),
            other => Err(FrameError::UnknownType(other.to_owned())),
        }
    }
}
