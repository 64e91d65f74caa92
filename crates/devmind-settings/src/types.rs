//! Settings schema with compiled defaults.

use serde::{Deserialize, Serialize};

/// Root settings for the DevMind Live server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DevMindSettings {
    /// HTTP/WebSocket bind settings.
    pub server: ServerSettings,
    /// Cross-origin request policy.
    pub cors: CorsSettings,
    /// Per-connection delivery tuning.
    pub websocket: WebSocketSettings,
}

impl Default for DevMindSettings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            cors: CorsSettings::default(),
            websocket: WebSocketSettings::default(),
        }
    }
}

/// Bind address settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Interface to bind.
    pub host: String,
    /// TCP port to bind.
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
        }
    }
}

/// Cross-origin request policy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsSettings {
    /// Origins allowed to call the HTTP surface. `"*"` allows any origin.
    pub allowed_origins: Vec<String>,
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:3000".into(),
                "http://localhost:3001".into(),
            ],
        }
    }
}

/// Per-connection delivery tuning.
///
/// A connection whose outbound channel is full (stalled client) or whose
/// socket write exceeds the timeout is treated as dead and evicted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSocketSettings {
    /// Outbound frames buffered per connection before sends fail.
    pub channel_capacity: usize,
    /// Seconds a single socket write may take before the connection is
    /// considered stalled.
    pub send_timeout_secs: u64,
}

impl Default for WebSocketSettings {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
            send_timeout_secs: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let settings = DevMindSettings::default();
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.port, 8000);
        assert_eq!(settings.websocket.channel_capacity, 64);
        assert_eq!(settings.websocket.send_timeout_secs, 5);
        assert_eq!(settings.cors.allowed_origins.len(), 2);
    }

    #[test]
    fn partial_json_fills_missing_sections_with_defaults() {
        let settings: DevMindSettings =
            serde_json::from_str(r#"{"server": {"port": 9001}}"#).unwrap();
        assert_eq!(settings.server.port, 9001);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.websocket.channel_capacity, 64);
    }
}
