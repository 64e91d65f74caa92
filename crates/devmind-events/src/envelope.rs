//! The [`ServerMessage`] enum — every envelope the server can push.
//!
//! One variant per wire `type`, each carrying its own typed payload.
//! Serialization goes through a single tagged-enum encode path producing
//! `{"type": "<tag>", "data": {...}}`. Clients rely on exact type strings
//! and field names.

use chrono::{SecondsFormat, Utc};
use devmind_core::ids::{ConnectionId, ProjectId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::payloads::{IntegrationUpdate, QueryUpdate, RegistryStats};

/// A query update with its send-time timestamp.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryUpdateEvent {
    /// The update payload.
    #[serde(flatten)]
    pub update: QueryUpdate,
    /// When the envelope was built, ISO 8601.
    pub timestamp: String,
}

/// An integration update with its send-time timestamp.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntegrationUpdateEvent {
    /// The update payload.
    #[serde(flatten)]
    pub update: IntegrationUpdate,
    /// When the envelope was built, ISO 8601.
    pub timestamp: String,
}

/// A server → client envelope.
///
/// Control types (`connection_established`, `subscription_confirmed`,
/// `pong`, `stats`, `error`) are replies to a single connection;
/// notification types (`query_update`, `integration_update`,
/// `new_insight`, `activity_update`) are broadcast. Envelopes are
/// transient: if nobody is subscribed when one is sent, it is gone.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    /// Greeting sent immediately after registration.
    #[serde(rename = "connection_established")]
    ConnectionEstablished {
        /// The id assigned to this connection.
        connection_id: ConnectionId,
        /// Human-readable greeting.
        message: String,
        /// Current server time, ISO 8601.
        server_time: String,
    },

    /// Acknowledges a subscribe request.
    ///
    /// Project subscriptions carry `project_id`; general subscriptions
    /// carry `subscription_type: "general"`.
    #[serde(rename = "subscription_confirmed")]
    SubscriptionConfirmed {
        /// Project subscribed to, for project subscriptions.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        project_id: Option<ProjectId>,
        /// `"general"` for general subscriptions.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subscription_type: Option<String>,
        /// Human-readable confirmation.
        message: String,
    },

    /// Reply to a `ping` frame.
    #[serde(rename = "pong")]
    Pong {
        /// Current server time, ISO 8601.
        timestamp: String,
    },

    /// Reply to a `get_stats` frame.
    #[serde(rename = "stats")]
    Stats(RegistryStats),

    /// Non-fatal per-request error reply.
    #[serde(rename = "error")]
    Error {
        /// What went wrong.
        message: String,
    },

    /// Query processing progress (general broadcast).
    #[serde(rename = "query_update")]
    QueryUpdate(QueryUpdateEvent),

    /// Integration status change (general broadcast).
    #[serde(rename = "integration_update")]
    IntegrationUpdate(IntegrationUpdateEvent),

    /// New insight, routed by the payload's `project_id` when present.
    #[serde(rename = "new_insight")]
    NewInsight(Map<String, Value>),

    /// Activity feed entry, routed like `new_insight`.
    #[serde(rename = "activity_update")]
    ActivityUpdate(Map<String, Value>),
}

impl ServerMessage {
    /// Current server time in the wire timestamp format.
    fn now() -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    /// Build the post-registration greeting.
    #[must_use]
    pub fn connection_established(connection_id: ConnectionId) -> Self {
        Self::ConnectionEstablished {
            connection_id,
            message: "Connected to DevMind real-time updates!".into(),
            server_time: Self::now(),
        }
    }

    /// Build a project subscription confirmation.
    #[must_use]
    pub fn project_subscription_confirmed(project_id: ProjectId) -> Self {
        Self::SubscriptionConfirmed {
            project_id: Some(project_id),
            subscription_type: None,
            message: format!("Subscribed to project {project_id} updates"),
        }
    }

    /// Build a general subscription confirmation.
    #[must_use]
    pub fn general_subscription_confirmed() -> Self {
        Self::SubscriptionConfirmed {
            project_id: None,
            subscription_type: Some("general".into()),
            message: "Subscribed to system-wide updates".into(),
        }
    }

    /// Build a `pong` reply stamped with the current time.
    #[must_use]
    pub fn pong() -> Self {
        Self::Pong {
            timestamp: Self::now(),
        }
    }

    /// Build an `error` reply.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Build a `query_update` envelope, stamping the send time.
    #[must_use]
    pub fn query_update(update: QueryUpdate) -> Self {
        Self::QueryUpdate(QueryUpdateEvent {
            update,
            timestamp: Self::now(),
        })
    }

    /// Build an `integration_update` envelope, stamping the send time.
    #[must_use]
    pub fn integration_update(update: IntegrationUpdate) -> Self {
        Self::IntegrationUpdate(IntegrationUpdateEvent {
            update,
            timestamp: Self::now(),
        })
    }

    /// Build a `new_insight` envelope from a free-form payload,
    /// stamping the send time into the payload.
    #[must_use]
    pub fn new_insight(mut payload: Map<String, Value>) -> Self {
        let _ = payload.insert("timestamp".into(), Value::String(Self::now()));
        Self::NewInsight(payload)
    }

    /// Build an `activity_update` envelope from a free-form payload,
    /// stamping the send time into the payload.
    #[must_use]
    pub fn activity_update(mut payload: Map<String, Value>) -> Self {
        let _ = payload.insert("timestamp".into(), Value::String(Self::now()));
        Self::ActivityUpdate(payload)
    }

    /// The wire `type` tag.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::ConnectionEstablished { .. } => "connection_established",
            Self::SubscriptionConfirmed { .. } => "subscription_confirmed",
            Self::Pong { .. } => "pong",
            Self::Stats(_) => "stats",
            Self::Error { .. } => "error",
            Self::QueryUpdate(_) => "query_update",
            Self::IntegrationUpdate(_) => "integration_update",
            Self::NewInsight(_) => "new_insight",
            Self::ActivityUpdate(_) => "activity_update",
        }
    }
}
