mod client;
mod config;
mod topic;

pub use client::MqttClient;
#[cfg(test)]
pub use client::MockMqttClient;
pub use client::RumqttcClient;
pub use config::MqttConfig;
pub use config::DEFAULT_BASE_TOPIC;
pub use config::DEFAULT_DISCOVERY_PREFIX;
use serde_json::Value;
pub use topic::device_slug;
pub use topic::Topics;

/// Body of an outgoing message: switch states are plain text, everything
/// else is JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Text(String),
    Json(Value),
}

impl Payload {
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Payload::Text(text) => text.into_bytes(),
            Payload::Json(value) => value.to_string().into_bytes(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("MQTT client not connected. Call connect() first.")]
    NotConnected,

    #[error("MQTT request failed: {0}")]
    Client(#[from] rumqttc::ClientError),
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_payload_bytes() {
        assert_eq!(Payload::Text("ON".to_string()).into_bytes(), b"ON");
        assert_eq!(
            Payload::Json(json!({"state": "OFF"})).into_bytes(),
            br#"{"state":"OFF"}"#
        );
    }
}
