//! Per-connection outbound handle.

use std::sync::Arc;

use devmind_core::ids::ConnectionId;
use tokio::sync::mpsc;

/// One live connection as the registry sees it: the assigned id plus the
/// sending half of the connection's outbound frame channel.
///
/// The receiving half is owned by the connection's writer task, which
/// drains frames onto the socket. When that task ends (socket closed,
/// write error, write timeout) the channel closes and every subsequent
/// [`send`](Self::send) fails, which is how delivery failures surface.
#[derive(Clone, Debug)]
pub struct ClientConnection {
    /// The id assigned at registration.
    pub id: ConnectionId,
    outbound: mpsc::Sender<Arc<String>>,
}

impl ClientConnection {
    /// Wrap a freshly registered connection.
    #[must_use]
    pub fn new(id: ConnectionId, outbound: mpsc::Sender<Arc<String>>) -> Self {
        Self { id, outbound }
    }

    /// Hand a serialized frame to the connection's writer task.
    ///
    /// Returns `false` when the channel is closed (writer task gone) or
    /// full (client stalled past the buffer); both are delivery
    /// failures and the caller evicts the connection.
    pub fn send(&self, frame: Arc<String>) -> bool {
        self.outbound.try_send(frame).is_ok()
    }

    /// A clone of the outbound sender.
    #[must_use]
    pub fn sender(&self) -> mpsc::Sender<Arc<String>> {
        self.outbound.clone()
    }
}
