//! Typed notification payloads and the registry stats aggregate.
//!
//! These structs double as the HTTP trigger request bodies, so field
//! names and nullability match the original wire format exactly:
//! optional fields serialize as explicit `null`, not omitted keys.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use devmind_core::ids::{IntegrationId, QueryId};
use serde::{Deserialize, Serialize};

/// Processing state of a query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    /// The query is still being processed.
    Processing,
    /// Processing finished successfully.
    Completed,
    /// Processing failed.
    Error,
}

/// Health state of an external integration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationStatus {
    /// Connected and syncing.
    Active,
    /// Configured but not syncing.
    Inactive,
    /// Last sync attempt failed.
    Error,
    /// Initial sync has not completed yet.
    Pending,
}

/// Progress update for an in-flight query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryUpdate {
    /// The query being reported on.
    pub query_id: QueryId,
    /// Current processing state.
    pub status: QueryStatus,
    /// Completion percentage, 0–100.
    pub progress: u8,
    /// Optional human-readable status line.
    #[serde(default)]
    pub message: Option<String>,
    /// Partial response text accumulated so far.
    #[serde(default)]
    pub partial_response: Option<String>,
}

/// Status change for an external integration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntegrationUpdate {
    /// The integration being reported on.
    pub integration_id: IntegrationId,
    /// New status.
    pub status: IntegrationStatus,
    /// Optional human-readable detail.
    #[serde(default)]
    pub message: Option<String>,
    /// When the integration last synced, if ever.
    #[serde(default)]
    pub last_sync: Option<DateTime<Utc>>,
}

/// Read-only aggregate of registry state, served on `get_stats` frames
/// and `GET /ws/stats`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    /// Live connections.
    pub total_connections: usize,
    /// Connections holding a general subscription.
    pub general_subscriptions: usize,
    /// Subscriber count per project id.
    pub project_subscriptions: BTreeMap<String, usize>,
}
