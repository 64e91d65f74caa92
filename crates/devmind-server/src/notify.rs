//! Typed notification entry points.
//!
//! External collaborators (query engine, integration syncer, insight and
//! activity producers) call these to originate a notification without
//! knowing anything about connections or subscriptions. All four are
//! fire-and-forget: they confirm the broadcast was attempted, nothing
//! more.

use devmind_core::ids::ProjectId;
use devmind_events::{IntegrationUpdate, QueryUpdate, ServerMessage};
use metrics::counter;
use serde_json::{Map, Value};
use tracing::debug;

use crate::metrics::TRIGGER_REQUESTS_TOTAL;
use crate::websocket::Broadcaster;

/// Builds typed envelopes and routes them through the broadcaster.
#[derive(Clone)]
pub struct Notifier {
    broadcaster: Broadcaster,
}

impl Notifier {
    /// Create a notifier over a broadcaster.
    #[must_use]
    pub fn new(broadcaster: Broadcaster) -> Self {
        Self { broadcaster }
    }

    /// Broadcast query processing progress to general subscribers.
    ///
    /// Query progress is not project-scoped in this design.
    pub async fn query_update(&self, update: QueryUpdate) {
        counter!(TRIGGER_REQUESTS_TOTAL, "kind" => "query_update").increment(1);
        self.broadcaster
            .broadcast_general(&ServerMessage::query_update(update))
            .await;
    }

    /// Broadcast an integration status change to general subscribers.
    pub async fn integration_update(&self, update: IntegrationUpdate) {
        counter!(TRIGGER_REQUESTS_TOTAL, "kind" => "integration_update").increment(1);
        self.broadcaster
            .broadcast_general(&ServerMessage::integration_update(update))
            .await;
    }

    /// Broadcast a new insight.
    ///
    /// Routed to the payload's project when `project_id` parses; a
    /// missing or malformed `project_id` falls back to the general
    /// audience; a notification is never silently dropped.
    pub async fn new_insight(&self, payload: Map<String, Value>) {
        counter!(TRIGGER_REQUESTS_TOTAL, "kind" => "insight").increment(1);
        let route = project_route(&payload);
        let message = ServerMessage::new_insight(payload);
        self.dispatch(route, &message).await;
    }

    /// Broadcast an activity feed entry; routed like [`new_insight`](Self::new_insight).
    pub async fn activity_update(&self, payload: Map<String, Value>) {
        counter!(TRIGGER_REQUESTS_TOTAL, "kind" => "activity").increment(1);
        let route = project_route(&payload);
        let message = ServerMessage::activity_update(payload);
        self.dispatch(route, &message).await;
    }

    async fn dispatch(&self, route: Option<ProjectId>, message: &ServerMessage) {
        match route {
            Some(project_id) => {
                self.broadcaster
                    .broadcast_project(&project_id, message)
                    .await;
            }
            None => {
                debug!(envelope = message.tag(), "no project route, broadcasting general");
                self.broadcaster.broadcast_general(message).await;
            }
        }
    }
}

/// Extract a parseable `project_id` from a free-form payload.
fn project_route(payload: &Map<String, Value>) -> Option<ProjectId> {
    payload
        .get("project_id")
        .and_then(Value::as_str)
        .and_then(|raw| raw.parse().ok())
}
