//! The connection registry — source of truth for live connections and
//! their subscriptions.
//!
//! All mutation goes through registry operations; nothing else touches
//! the maps. Audience resolution returns snapshots so a broadcast sweep
//! never iterates live maps while connections come and go.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use devmind_core::ids::{ConnectionId, ProjectId};
use devmind_events::payloads::RegistryStats;
use metrics::gauge;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info};

use super::connection::ClientConnection;
use crate::metrics::WS_CONNECTIONS_ACTIVE;

#[derive(Default)]
struct RegistryInner {
    /// Live connections indexed by id.
    connections: HashMap<ConnectionId, ClientConnection>,
    /// Connections subscribed to system-wide updates.
    general: HashSet<ConnectionId>,
    /// Connections subscribed per project.
    projects: HashMap<ProjectId, HashSet<ConnectionId>>,
}

/// Tracks live connections and their subscriptions.
///
/// Invariant: every id present in a subscription set is present in the
/// connection map. The reverse does not hold: a connection may have no
/// subscriptions.
pub struct ConnectionRegistry {
    inner: RwLock<RegistryInner>,
    /// Atomic counter tracking live connections (avoids read-locking for
    /// count queries).
    active_count: AtomicUsize,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner::default()),
            active_count: AtomicUsize::new(0),
        }
    }

    /// Register a new connection, returning its freshly generated id.
    ///
    /// `outbound` is the sending half of the connection's frame channel;
    /// the caller keeps the receiving half in the writer task.
    pub async fn register(&self, outbound: mpsc::Sender<Arc<String>>) -> ConnectionId {
        let id = ConnectionId::generate();
        let connection = ClientConnection::new(id, outbound);
        {
            let mut inner = self.inner.write().await;
            let _ = inner.connections.insert(id, connection);
        }
        let _ = self.active_count.fetch_add(1, Ordering::Relaxed);
        gauge!(WS_CONNECTIONS_ACTIVE).increment(1.0);
        info!(conn_id = %id, "websocket connected");
        id
    }

    /// Remove a connection and scrub it from every subscription set.
    ///
    /// Idempotent: unregistering an absent id is a no-op.
    pub async fn unregister(&self, id: &ConnectionId) {
        let mut inner = self.inner.write().await;
        if inner.connections.remove(id).is_none() {
            return;
        }
        let _ = inner.general.remove(id);
        inner.projects.retain(|_, subscribers| {
            let _ = subscribers.remove(id);
            !subscribers.is_empty()
        });
        drop(inner);

        let _ = self.active_count.fetch_sub(1, Ordering::Relaxed);
        gauge!(WS_CONNECTIONS_ACTIVE).decrement(1.0);
        info!(conn_id = %id, "websocket disconnected");
    }

    /// Subscribe a connection to system-wide updates.
    ///
    /// Set semantics: re-subscribing is a no-op. Unknown ids are ignored
    /// to keep subscription sets a subset of the connection map.
    pub async fn subscribe_general(&self, id: &ConnectionId) {
        let mut inner = self.inner.write().await;
        if !inner.connections.contains_key(id) {
            return;
        }
        if inner.general.insert(*id) {
            debug!(conn_id = %id, "subscribed to general updates");
        }
    }

    /// Subscribe a connection to one project's updates, creating the
    /// project's subscriber set on first use.
    pub async fn subscribe_project(&self, id: &ConnectionId, project_id: ProjectId) {
        let mut inner = self.inner.write().await;
        if !inner.connections.contains_key(id) {
            return;
        }
        if inner.projects.entry(project_id).or_default().insert(*id) {
            debug!(conn_id = %id, project_id = %project_id, "subscribed to project updates");
        }
    }

    /// Snapshot of the general subscriber set.
    pub async fn resolve_general(&self) -> Vec<ConnectionId> {
        let inner = self.inner.read().await;
        inner.general.iter().copied().collect()
    }

    /// Snapshot of one project's subscriber set; empty when the project
    /// has no subscribers.
    pub async fn resolve_project(&self, project_id: &ProjectId) -> Vec<ConnectionId> {
        let inner = self.inner.read().await;
        inner
            .projects
            .get(project_id)
            .map(|subscribers| subscribers.iter().copied().collect())
            .unwrap_or_default()
    }

    /// A clone of the outbound sender for one connection, if still live.
    pub async fn sender(&self, id: &ConnectionId) -> Option<mpsc::Sender<Arc<String>>> {
        let inner = self.inner.read().await;
        inner.connections.get(id).map(ClientConnection::sender)
    }

    /// Number of live connections.
    pub fn connection_count(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }

    /// Read-only aggregate for observability.
    pub async fn stats(&self) -> RegistryStats {
        let inner = self.inner.read().await;
        RegistryStats {
            total_connections: inner.connections.len(),
            general_subscriptions: inner.general.len(),
            project_subscriptions: inner
                .projects
                .iter()
                .map(|(project_id, subscribers)| (project_id.to_string(), subscribers.len()))
                .collect(),
        }
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn register_one(registry: &ConnectionRegistry) -> ConnectionId {
        let (tx, mut rx) = mpsc::channel(8);
        // Keep the receiver alive in a drain task; these tests only
        // exercise registry bookkeeping.
        drop(tokio::spawn(async move {
            while rx.recv().await.is_some() {}
        }));
        registry.register(tx).await
    }

    #[tokio::test]
    async fn register_returns_distinct_ids() {
        let registry = ConnectionRegistry::new();
        let mut ids = Vec::new();
        for _ in 0..20 {
            ids.push(register_one(&registry).await);
        }
        let mut deduped = ids.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(deduped.len(), ids.len());
        assert_eq!(registry.connection_count(), 20);
    }

    #[tokio::test]
    async fn unregister_scrubs_every_subscription() {
        let registry = ConnectionRegistry::new();
        let id = register_one(&registry).await;
        let p1 = ProjectId::generate();
        let p2 = ProjectId::generate();

        registry.subscribe_general(&id).await;
        registry.subscribe_project(&id, p1).await;
        registry.subscribe_project(&id, p2).await;

        registry.unregister(&id).await;

        assert!(registry.resolve_general().await.is_empty());
        assert!(registry.resolve_project(&p1).await.is_empty());
        assert!(registry.resolve_project(&p2).await.is_empty());
        assert_eq!(registry.connection_count(), 0);
    }

    #[tokio::test]
    async fn unregister_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let id = register_one(&registry).await;
        registry.subscribe_general(&id).await;

        registry.unregister(&id).await;
        registry.unregister(&id).await;

        assert_eq!(registry.connection_count(), 0);
        assert_eq!(registry.stats().await, RegistryStats::default());
    }

    #[tokio::test]
    async fn unregister_unknown_id_is_a_noop() {
        let registry = ConnectionRegistry::new();
        registry.unregister(&ConnectionId::generate()).await;
        assert_eq!(registry.connection_count(), 0);
    }

    #[tokio::test]
    async fn resubscribing_is_a_noop() {
        let registry = ConnectionRegistry::new();
        let id = register_one(&registry).await;

        registry.subscribe_general(&id).await;
        registry.subscribe_general(&id).await;

        assert_eq!(registry.resolve_general().await.len(), 1);
        assert_eq!(registry.stats().await.general_subscriptions, 1);
    }

    #[tokio::test]
    async fn subscribe_unknown_id_is_rejected() {
        let registry = ConnectionRegistry::new();
        let ghost = ConnectionId::generate();
        let project = ProjectId::generate();

        registry.subscribe_general(&ghost).await;
        registry.subscribe_project(&ghost, project).await;

        assert!(registry.resolve_general().await.is_empty());
        assert!(registry.resolve_project(&project).await.is_empty());
        assert!(registry.stats().await.project_subscriptions.is_empty());
    }

    #[tokio::test]
    async fn resolve_project_without_subscribers_is_empty() {
        let registry = ConnectionRegistry::new();
        assert!(
            registry
                .resolve_project(&ProjectId::generate())
                .await
                .is_empty()
        );
    }

    #[tokio::test]
    async fn project_sets_are_independent() {
        let registry = ConnectionRegistry::new();
        let a = register_one(&registry).await;
        let b = register_one(&registry).await;
        let p1 = ProjectId::generate();
        let p2 = ProjectId::generate();

        registry.subscribe_project(&a, p1).await;
        registry.subscribe_project(&b, p2).await;

        assert_eq!(registry.resolve_project(&p1).await, vec![a]);
        assert_eq!(registry.resolve_project(&p2).await, vec![b]);
    }

    #[tokio::test]
    async fn stats_reports_counts_per_project() {
        let registry = ConnectionRegistry::new();
        let a = register_one(&registry).await;
        let b = register_one(&registry).await;
        let project = ProjectId::generate();

        registry.subscribe_general(&a).await;
        registry.subscribe_project(&a, project).await;
        registry.subscribe_project(&b, project).await;

        let stats = registry.stats().await;
        assert_eq!(stats.total_connections, 2);
        assert_eq!(stats.general_subscriptions, 1);
        assert_eq!(
            stats.project_subscriptions.get(&project.to_string()),
            Some(&2)
        );
    }

    #[tokio::test]
    async fn empty_project_sets_are_dropped_on_unregister() {
        let registry = ConnectionRegistry::new();
        let id = register_one(&registry).await;
        let project = ProjectId::generate();
        registry.subscribe_project(&id, project).await;

        registry.unregister(&id).await;

        assert!(registry.stats().await.project_subscriptions.is_empty());
    }

    #[tokio::test]
    async fn sender_lookup_follows_registration() {
        let registry = ConnectionRegistry::new();
        let id = register_one(&registry).await;
        assert!(registry.sender(&id).await.is_some());

        registry.unregister(&id).await;
        assert!(registry.sender(&id).await.is_none());
    }
}
