//! End-to-end tests over a real bound server: WebSocket subscribe flows,
//! HTTP trigger fan-out, stats, and error replies.

#![allow(missing_docs)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use devmind_server::http::router;
use devmind_server::state::AppState;
use devmind_settings::DevMindSettings;
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_server() -> SocketAddr {
    let state = AppState::new(Arc::new(DevMindSettings::default()));
    let app = router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    drop(tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    }));
    addr
}

async fn connect(addr: SocketAddr) -> WsClient {
    let (ws, _response) = connect_async(format!("ws://{addr}/ws/live"))
        .await
        .expect("websocket connect");
    ws
}

/// Receive the next text frame as JSON, with a timeout so a missing
/// frame fails the test instead of hanging it.
async fn recv_json(ws: &mut WsClient) -> Value {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .expect("websocket error");
        if message.is_text() {
            return serde_json::from_str(message.to_text().expect("text frame"))
                .expect("frame is JSON");
        }
    }
}

/// Assert no frame arrives within a grace period.
async fn assert_silent(ws: &mut WsClient) {
    let result = tokio::time::timeout(Duration::from_millis(300), ws.next()).await;
    assert!(result.is_err(), "expected no frame, got {result:?}");
}

async fn send_json(ws: &mut WsClient, value: &Value) {
    ws.send(Message::text(value.to_string()))
        .await
        .expect("send frame");
}

async fn subscribe_general(ws: &mut WsClient) {
    send_json(ws, &json!({"type": "subscribe_general", "data": {}})).await;
    let reply = recv_json(ws).await;
    assert_eq!(reply["type"], "subscription_confirmed");
    assert_eq!(reply["data"]["subscription_type"], "general");
}

async fn fetch_stats(addr: SocketAddr) -> Value {
    reqwest::get(format!("http://{addr}/ws/stats"))
        .await
        .expect("stats request")
        .json()
        .await
        .expect("stats body")
}

#[tokio::test]
async fn connection_established_arrives_first() {
    let addr = spawn_server().await;
    let mut ws = connect(addr).await;

    let greeting = recv_json(&mut ws).await;
    assert_eq!(greeting["type"], "connection_established");
    assert!(greeting["data"]["connection_id"].is_string());
    assert!(greeting["data"]["server_time"].is_string());
}

#[tokio::test]
async fn query_update_reaches_general_subscriber() {
    let addr = spawn_server().await;
    let mut ws = connect(addr).await;
    let _greeting = recv_json(&mut ws).await;
    subscribe_general(&mut ws).await;

    let query_id = uuid::Uuid::new_v4().to_string();
    let response = reqwest::Client::new()
        .post(format!("http://{addr}/ws/trigger/query_update"))
        .json(&json!({
            "query_id": query_id,
            "status": "completed",
            "progress": 100,
        }))
        .send()
        .await
        .expect("trigger request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("trigger body");
    assert_eq!(body["message"], "Query update sent");

    let update = recv_json(&mut ws).await;
    assert_eq!(update["type"], "query_update");
    assert_eq!(update["data"]["query_id"], query_id);
    assert_eq!(update["data"]["progress"], 100);
    assert_eq!(update["data"]["status"], "completed");
    assert!(update["data"]["timestamp"].is_string());
}

#[tokio::test]
async fn insight_routes_to_project_subscriber_only() {
    let addr = spawn_server().await;
    let project = uuid::Uuid::new_v4().to_string();

    let mut c1 = connect(addr).await;
    let _ = recv_json(&mut c1).await;
    send_json(
        &mut c1,
        &json!({"type": "subscribe_project", "data": {"project_id": project}}),
    )
    .await;
    let confirmation = recv_json(&mut c1).await;
    assert_eq!(confirmation["type"], "subscription_confirmed");
    assert_eq!(confirmation["data"]["project_id"], project);

    let mut c2 = connect(addr).await;
    let _ = recv_json(&mut c2).await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/ws/trigger/insight"))
        .json(&json!({"project_id": project, "title": "X"}))
        .send()
        .await
        .expect("trigger request");
    let body: Value = response.json().await.expect("trigger body");
    assert_eq!(body["message"], "Insight notification sent");

    let insight = recv_json(&mut c1).await;
    assert_eq!(insight["type"], "new_insight");
    assert_eq!(insight["data"]["title"], "X");
    assert_eq!(insight["data"]["project_id"], project);

    assert_silent(&mut c2).await;
}

#[tokio::test]
async fn insight_without_project_falls_back_to_general() {
    let addr = spawn_server().await;
    let mut ws = connect(addr).await;
    let _ = recv_json(&mut ws).await;
    subscribe_general(&mut ws).await;

    let _ = reqwest::Client::new()
        .post(format!("http://{addr}/ws/trigger/insight"))
        .json(&json!({"title": "general insight"}))
        .send()
        .await
        .expect("trigger request");

    let insight = recv_json(&mut ws).await;
    assert_eq!(insight["type"], "new_insight");
    assert_eq!(insight["data"]["title"], "general insight");
}

#[tokio::test]
async fn dropped_connection_disappears_from_stats() {
    let addr = spawn_server().await;
    let mut ws = connect(addr).await;
    let _ = recv_json(&mut ws).await;
    subscribe_general(&mut ws).await;
    drop(ws);

    // Let the server observe the close, then push a broadcast through.
    tokio::time::sleep(Duration::from_millis(200)).await;
    let _ = reqwest::Client::new()
        .post(format!("http://{addr}/ws/trigger/integration_update"))
        .json(&json!({
            "integration_id": uuid::Uuid::new_v4().to_string(),
            "status": "active",
        }))
        .send()
        .await
        .expect("trigger request");

    let stats = fetch_stats(addr).await;
    assert_eq!(stats["total_connections"], 0);
    assert_eq!(stats["general_subscriptions"], 0);
}

#[tokio::test]
async fn get_stats_frame_reports_connection() {
    let addr = spawn_server().await;
    let mut ws = connect(addr).await;
    let _ = recv_json(&mut ws).await;

    send_json(&mut ws, &json!({"type": "get_stats", "data": {}})).await;
    let reply = recv_json(&mut ws).await;
    assert_eq!(reply["type"], "stats");
    assert_eq!(reply["data"]["total_connections"], 1);
}

#[tokio::test]
async fn ping_yields_pong() {
    let addr = spawn_server().await;
    let mut ws = connect(addr).await;
    let _ = recv_json(&mut ws).await;

    send_json(&mut ws, &json!({"type": "ping"})).await;
    let reply = recv_json(&mut ws).await;
    assert_eq!(reply["type"], "pong");
    assert!(reply["data"]["timestamp"].is_string());
}

#[tokio::test]
async fn unknown_frame_type_yields_error_and_no_state_change() {
    let addr = spawn_server().await;
    let mut ws = connect(addr).await;
    let _ = recv_json(&mut ws).await;

    send_json(&mut ws, &json!({"type": "bogus"})).await;
    let reply = recv_json(&mut ws).await;
    assert_eq!(reply["type"], "error");
    assert_eq!(reply["data"]["message"], "Unknown message type: bogus");

    // Connection survives and the registry is unchanged.
    send_json(&mut ws, &json!({"type": "get_stats"})).await;
    let stats = recv_json(&mut ws).await;
    assert_eq!(stats["data"]["total_connections"], 1);
    assert_eq!(stats["data"]["general_subscriptions"], 0);
}

#[tokio::test]
async fn malformed_frame_yields_error_and_connection_survives() {
    let addr = spawn_server().await;
    let mut ws = connect(addr).await;
    let _ = recv_json(&mut ws).await;

    ws.send(Message::text("{ not json"))
        .await
        .expect("send frame");
    let reply = recv_json(&mut ws).await;
    assert_eq!(reply["type"], "error");
    assert_eq!(reply["data"]["message"], "Invalid JSON format");

    send_json(&mut ws, &json!({"type": "ping"})).await;
    assert_eq!(recv_json(&mut ws).await["type"], "pong");
}

#[tokio::test]
async fn invalid_project_id_yields_error_without_subscribing() {
    let addr = spawn_server().await;
    let mut ws = connect(addr).await;
    let _ = recv_json(&mut ws).await;

    send_json(
        &mut ws,
        &json!({"type": "subscribe_project", "data": {"project_id": "nope"}}),
    )
    .await;
    let reply = recv_json(&mut ws).await;
    assert_eq!(reply["type"], "error");
    assert_eq!(reply["data"]["message"], "Invalid project ID format");

    send_json(&mut ws, &json!({"type": "get_stats"})).await;
    let stats = recv_json(&mut ws).await;
    assert!(
        stats["data"]["project_subscriptions"]
            .as_object()
            .expect("object")
            .is_empty()
    );
}

#[tokio::test]
async fn health_and_root_endpoints_respond() {
    let addr = spawn_server().await;

    let root: Value = reqwest::get(format!("http://{addr}/"))
        .await
        .expect("root request")
        .json()
        .await
        .expect("root body");
    assert_eq!(root["name"], "DevMind Live");

    let health: Value = reqwest::get(format!("http://{addr}/health"))
        .await
        .expect("health request")
        .json()
        .await
        .expect("health body");
    assert_eq!(health["status"], "healthy");
}
