//! WebSocket upgrade and per-connection read/write loops.
//!
//! A connection lives in exactly two states: registered (accepted,
//! reachable by broadcasts) and closed (unregistered, id never reused).
//! The transition is terminal and fires on transport close or error.
//!
//! Frame dispatch replies on the same connection through the
//! broadcaster, so a reply that cannot be delivered follows the normal
//! eviction path.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use devmind_core::ids::ConnectionId;
use devmind_events::{ClientRequest, ServerMessage};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use metrics::counter;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::metrics::{WS_CONNECTIONS_TOTAL, WS_DISCONNECTIONS_TOTAL};
use crate::state::AppState;

/// `GET /ws/live` — upgrade to the real-time channel.
pub async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Drive one connection from registration to teardown.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (sink, stream) = socket.split();

    let (tx, rx) = mpsc::channel(state.settings.websocket.channel_capacity);
    let id = state.registry.register(tx).await;
    counter!(WS_CONNECTIONS_TOTAL).increment(1);

    let write_timeout = Duration::from_secs(state.settings.websocket.send_timeout_secs);
    let writer = tokio::spawn(write_loop(sink, rx, write_timeout, id));

    // Greet before processing any inbound frame.
    state
        .broadcaster
        .send_to_one(&id, &ServerMessage::connection_established(id))
        .await;

    read_loop(stream, &state, &id).await;

    // Terminal: transport closed or errored.
    state.registry.unregister(&id).await;
    counter!(WS_DISCONNECTIONS_TOTAL).increment(1);
    writer.abort();
}

/// Process inbound frames until the transport closes or errors.
async fn read_loop(mut stream: SplitStream<WebSocket>, state: &AppState, id: &ConnectionId) {
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => handle_frame(state, id, text.as_str()).await,
            Ok(Message::Close(_)) => {
                debug!(conn_id = %id, "client sent close frame");
                break;
            }
            // Control frames are answered at the protocol layer; binary
            // frames are not part of this protocol.
            Ok(Message::Ping(_) | Message::Pong(_) | Message::Binary(_)) => {}
            Err(e) => {
                debug!(conn_id = %id, error = %e, "websocket receive error");
                break;
            }
        }
    }
}

/// Dispatch one inbound frame, always replying to the originating
/// connection. Rejected frames alter no state.
async fn handle_frame(state: &AppState, id: &ConnectionId, text: &str) {
    let reply = match ClientRequest::parse(text) {
        Ok(ClientRequest::SubscribeProject { project_id }) => {
            state.registry.subscribe_project(id, project_id).await;
            ServerMessage::project_subscription_confirmed(project_id)
        }
        Ok(ClientRequest::SubscribeGeneral) => {
            state.registry.subscribe_general(id).await;
            ServerMessage::general_subscription_confirmed()
        }
        Ok(ClientRequest::Ping) => ServerMessage::pong(),
        Ok(ClientRequest::GetStats) => ServerMessage::Stats(state.registry.stats().await),
        Err(e) => {
            debug!(conn_id = %id, error = %e, "rejected inbound frame");
            ServerMessage::error(e.to_string())
        }
    };
    state.broadcaster.send_to_one(id, &reply).await;
}

/// Drain the outbound channel onto the socket.
///
/// Ends on write error, write timeout, or channel close (teardown).
/// Ending drops the receiver, so later sends to this connection fail
/// and evict it, so a stalled client cannot wedge a broadcast sweep.
async fn write_loop(
    mut sink: SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<Arc<String>>,
    write_timeout: Duration,
    id: ConnectionId,
) {
    while let Some(frame) = rx.recv().await {
        let send = sink.send(Message::Text(frame.as_str().to_owned().into()));
        match tokio::time::timeout(write_timeout, send).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                debug!(conn_id = %id, error = %e, "websocket write failed");
                break;
            }
            Err(_) => {
                warn!(conn_id = %id, timeout = ?write_timeout, "websocket write timed out");
                break;
            }
        }
    }
}
