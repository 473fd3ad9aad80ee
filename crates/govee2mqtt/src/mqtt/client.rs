use std::time::Duration;

use async_trait::async_trait;
use rumqttc::AsyncClient;
use rumqttc::ClientError;
use rumqttc::ConnectReturnCode;
use rumqttc::ConnectionError;
use rumqttc::Event;
use rumqttc::EventLoop;
use rumqttc::MqttOptions;
use rumqttc::Packet;
use rumqttc::Publish;
use rumqttc::QoS;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::BusError;
use super::MqttConfig;
use super::Topics;
use crate::engine::CommandSender;
use crate::engine::QueuedCommand;

/// Requests rumqttc buffers while the event loop cannot send them
const REQUEST_QUEUE_CAPACITY: usize = 10;

/// Trait for MQTT client operations
///
/// This trait allows for mocking the MQTT client for testing purposes
#[async_trait]
pub trait MqttClient: Send + Sync {
    /// Connect to the MQTT broker
    async fn connect(&mut self) -> Result<(), BusError>;

    /// Publish a message to an MQTT topic
    async fn publish(&mut self, topic: &str, payload: &[u8], retain: bool)
        -> Result<(), BusError>;

    /// Disconnect from the MQTT broker
    async fn disconnect(&mut self) -> Result<(), BusError>;
}

/// A message recorded by [`MockMqttClient`]
#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub struct Published {
    pub topic: String,
    pub payload: Vec<u8>,
    pub retain: bool,
}

#[cfg(test)]
impl Published {
    pub fn text(&self) -> &str {
        std::str::from_utf8(&self.payload).unwrap()
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.payload).unwrap()
    }
}

/// Mock MQTT client for testing
///
/// Clones share the published log, so a test can keep one handle while the
/// engine owns another.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct MockMqttClient {
    pub published: std::sync::Arc<std::sync::Mutex<Vec<Published>>>,
    pub is_connected: bool,
}

#[cfg(test)]
#[async_trait]
impl MqttClient for MockMqttClient {
    async fn connect(&mut self) -> Result<(), BusError> {
        self.is_connected = true;
        Ok(())
    }

    async fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        retain: bool,
    ) -> Result<(), BusError> {
        if !self.is_connected {
            return Err(BusError::NotConnected);
        }
        self.published.lock().unwrap().push(Published {
            topic: topic.to_string(),
            payload: payload.to_vec(),
            retain,
        });
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), BusError> {
        self.is_connected = false;
        Ok(())
    }
}

#[cfg(test)]
impl MockMqttClient {
    /// Create a mock that is already connected
    pub fn connected() -> Self {
        Self {
            is_connected: true,
            ..Self::default()
        }
    }

    /// Everything published so far
    pub fn published(&self) -> Vec<Published> {
        self.published.lock().unwrap().clone()
    }

    /// Messages published to `topic`, oldest first
    pub fn published_to(&self, topic: &str) -> Vec<Published> {
        self.published()
            .into_iter()
            .filter(|p| p.topic == topic)
            .collect()
    }
}

/// Real MQTT client implementation using rumqttc
///
/// Inbound messages on command topics are decoded in the event loop task
/// and forwarded to the engine's command queue. Publishing never waits: while
/// the broker is unreachable the request queue fills up and further messages
/// are dropped until the connection recovers.
pub struct RumqttcClient {
    /// MQTT connection options (stored for lazy initialization)
    mqtt_options: MqttOptions,

    topics: Topics,

    commands: CommandSender,

    /// AsyncClient (created in connect())
    client: Option<AsyncClient>,

    /// Background event loop task handle
    event_loop_task: Option<JoinHandle<()>>,

    /// Publishes dropped since the request queue last had room
    dropped: u64,
}

impl RumqttcClient {
    /// Create a new RumqttcClient from configuration
    pub fn new(config: &MqttConfig, commands: CommandSender) -> Self {
        let mut mqtt_options =
            MqttOptions::new(config.client_id.clone(), config.host.clone(), config.port);

        mqtt_options.set_keep_alive(Duration::from_secs(30));

        if let Some(username) = &config.username {
            let password = config.password.clone().unwrap_or_default();
            mqtt_options.set_credentials(username, password);
        }

        Self {
            mqtt_options,
            topics: config.topics(),
            commands,
            client: None,
            event_loop_task: None,
            dropped: 0,
        }
    }

    fn client(&self) -> Result<&AsyncClient, BusError> {
        self.client.as_ref().ok_or(BusError::NotConnected)
    }
}

/// Turn an inbound publish into a queued command, if it is on a command topic.
fn decode_command(topics: &Topics, publish: &Publish) -> Option<QueuedCommand> {
    let (slug, entity) = topics.parse_command(&publish.topic)?;
    Some(QueuedCommand {
        device_slug: slug.to_string(),
        entity_kind: entity.to_string(),
        raw_payload: String::from_utf8_lossy(&publish.payload).into_owned(),
    })
}

async fn run_event_loop(
    mut event_loop: EventLoop,
    client: AsyncClient,
    topics: Topics,
    commands: CommandSender,
) {
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                if ack.code == ConnectReturnCode::Success {
                    info!("Connected to MQTT broker");
                    // The session is not persistent, so subscribe on every connect
                    let filter = topics.command_filter();
                    if let Err(e) = client.try_subscribe(&filter, QoS::AtLeastOnce) {
                        error!("Failed to subscribe to {}: {}", filter, e);
                    }
                } else {
                    error!("MQTT connection refused: {:?}", ack.code);
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let Some(command) = decode_command(&topics, &publish) else {
                    debug!("Ignoring message on {}", publish.topic);
                    continue;
                };

                // Send to channel; if receiver dropped, exit
                if commands.send(command).is_err() {
                    break;
                }
            }
            Ok(_) => {
                // Ignore other events (puback, suback, etc.)
            }
            Err(ConnectionError::ConnectionRefused(code)) => {
                error!("MQTT connection refused: {:?}", code);
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
            Err(e) => {
                warn!("MQTT event loop error: {}", e);
                // Sleep briefly before retrying
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
    info!("MQTT event loop task exiting");
}

#[async_trait]
impl MqttClient for RumqttcClient {
    async fn connect(&mut self) -> Result<(), BusError> {
        let (client, event_loop) =
            AsyncClient::new(self.mqtt_options.clone(), REQUEST_QUEUE_CAPACITY);

        let task = tokio::spawn(run_event_loop(
            event_loop,
            client.clone(),
            self.topics.clone(),
            self.commands.clone(),
        ));

        self.client = Some(client);
        self.event_loop_task = Some(task);

        Ok(())
    }

    async fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        retain: bool,
    ) -> Result<(), BusError> {
        let result = self
            .client()?
            .try_publish(topic, QoS::AtLeastOnce, retain, payload);
        match result {
            Ok(()) => {
                if self.dropped > 0 {
                    info!(
                        "MQTT publishing resumed after dropping {} messages",
                        self.dropped
                    );
                    self.dropped = 0;
                }
                Ok(())
            }
            Err(ClientError::TryRequest(_)) => {
                if self.dropped == 0 {
                    warn!("MQTT request queue is full, dropping messages until the broker is back");
                }
                self.dropped += 1;
                debug!("Dropped publish to {}", topic);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn disconnect(&mut self) -> Result<(), BusError> {
        self.client()?.try_disconnect()?;
        info!("Disconnected from MQTT broker");
        Ok(())
    }
}

impl Drop for RumqttcClient {
    fn drop(&mut self) {
        if let Some(task) = self.event_loop_task.take() {
            task.abort();
        }
    }
}
