//! Shared application state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use devmind_settings::DevMindSettings;
use metrics_exporter_prometheus::PrometheusHandle;

use crate::notify::Notifier;
use crate::websocket::{Broadcaster, ConnectionRegistry};

/// Everything the HTTP and WebSocket handlers need, cloned per request.
///
/// Constructed once at startup and passed by shared ownership. There is
/// no hidden global; tests build as many independent states as they like.
#[derive(Clone)]
pub struct AppState {
    /// Source of truth for connections and subscriptions.
    pub registry: Arc<ConnectionRegistry>,
    /// Envelope fan-out over the registry.
    pub broadcaster: Broadcaster,
    /// Typed notification entry points for the trigger endpoints.
    pub notifier: Notifier,
    /// Server settings snapshot.
    pub settings: Arc<DevMindSettings>,
    /// Renders `/metrics`; absent when no recorder was installed (tests).
    pub metrics: Option<PrometheusHandle>,
    /// Process start time, reported by `/health`.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Build the state graph: registry → broadcaster → notifier.
    #[must_use]
    pub fn new(settings: Arc<DevMindSettings>) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let broadcaster = Broadcaster::new(Arc::clone(&registry));
        let notifier = Notifier::new(broadcaster.clone());
        Self {
            registry,
            broadcaster,
            notifier,
            settings,
            metrics: None,
            started_at: Utc::now(),
        }
    }

    /// Attach the Prometheus handle installed at startup.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
