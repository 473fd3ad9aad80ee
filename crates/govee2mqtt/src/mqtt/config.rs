use super::Topics;

/// Default topic prefix for state and command topics
pub const DEFAULT_BASE_TOPIC: &str = "govee2mqtt";

/// Default Home Assistant discovery prefix
pub const DEFAULT_DISCOVERY_PREFIX: &str = "homeassistant";

/// Connection and topic settings for the MQTT broker
#[derive(Debug, Clone)]
pub struct MqttConfig {
    /// MQTT broker hostname or IP address
    pub host: String,

    /// MQTT broker port
    pub port: u16,

    /// MQTT client ID
    pub client_id: String,

    /// Optional username for authentication
    pub username: Option<String>,

    /// Optional password for authentication
    pub password: Option<String>,

    /// Prefix for state and command topics
    pub base_topic: String,

    /// Prefix for Home Assistant discovery topics
    pub discovery_prefix: String,
}

impl MqttConfig {
    pub fn topics(&self) -> Topics {
        Topics::new(&self.base_topic, &self.discovery_prefix)
    }
}
