//! Envelope fan-out to connected clients.
//!
//! Delivery is fire-and-forget and at-most-once per live connection per
//! call: no acknowledgment, no retry, no ordering across calls beyond
//! issue order. A connection that fails to accept a frame is evicted
//! from the registry (self-healing) and the failure is never surfaced to
//! the caller.

use std::sync::Arc;

use devmind_core::ids::{ConnectionId, ProjectId};
use devmind_events::ServerMessage;
use metrics::counter;
use tracing::{debug, warn};

use super::registry::ConnectionRegistry;
use crate::metrics::{WS_BROADCASTS_TOTAL, WS_DELIVERY_DROPS_TOTAL};

/// Delivers serialized envelopes to one, many, or all connections.
#[derive(Clone)]
pub struct Broadcaster {
    registry: Arc<ConnectionRegistry>,
}

impl Broadcaster {
    /// Create a broadcaster over a shared registry.
    #[must_use]
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// The registry this broadcaster resolves audiences from.
    #[must_use]
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Serialize an envelope once for the whole sweep.
    fn encode(message: &ServerMessage) -> Option<Arc<String>> {
        match serde_json::to_string(message) {
            Ok(json) => Some(Arc::new(json)),
            Err(e) => {
                warn!(envelope = message.tag(), error = %e, "failed to serialize envelope");
                None
            }
        }
    }

    /// Deliver an envelope to a single connection.
    ///
    /// An absent id is a silent no-op (the caller lost the race with a
    /// disconnect). A failed send evicts the connection.
    pub async fn send_to_one(&self, id: &ConnectionId, message: &ServerMessage) {
        self.send_to_set(std::slice::from_ref(id), message).await;
    }

    /// Deliver an envelope to every id in the set.
    ///
    /// Targets are independent: failures are collected and the failed
    /// connections unregistered after the full sweep, so one dead client
    /// never aborts delivery to the rest.
    pub async fn send_to_set(&self, ids: &[ConnectionId], message: &ServerMessage) {
        let Some(json) = Self::encode(message) else {
            return;
        };

        let mut failed = Vec::new();
        for id in ids {
            // Absent ids lost the race with a disconnect; skip silently.
            if let Some(tx) = self.registry.sender(id).await {
                if tx.try_send(Arc::clone(&json)).is_err() {
                    failed.push(*id);
                }
            }
        }

        for id in &failed {
            counter!(WS_DELIVERY_DROPS_TOTAL).increment(1);
            warn!(conn_id = %id, envelope = message.tag(), "delivery failed, evicting connection");
            self.registry.unregister(id).await;
        }
    }

    /// Broadcast an envelope to every general subscriber.
    pub async fn broadcast_general(&self, message: &ServerMessage) {
        let audience = self.registry.resolve_general().await;
        counter!(WS_BROADCASTS_TOTAL, "kind" => "general").increment(1);
        debug!(
            envelope = message.tag(),
            recipients = audience.len(),
            "broadcast general"
        );
        self.send_to_set(&audience, message).await;
    }

    /// Broadcast an envelope to one project's subscribers.
    pub async fn broadcast_project(&self, project_id: &ProjectId, message: &ServerMessage) {
        let audience = self.registry.resolve_project(project_id).await;
        counter!(WS_BROADCASTS_TOTAL, "kind" => "project").increment(1);
        debug!(
            envelope = message.tag(),
            project_id = %project_id,
            recipients = audience.len(),
            "broadcast project"
        );
        self.send_to_set(&audience, message).await;
    }
}
