use std::collections::HashMap;
use std::time::Duration;

use serde_json::Map;
use serde_json::Value;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::message::CommandReceiver;
use super::message::QueuedCommand;
use super::state::BridgeState;
use crate::govee::ApiError;
use crate::govee::CapabilityCommand;
use crate::govee::Device;
use crate::govee::DeviceState;
use crate::govee::GoveeApi;
use crate::hass::classify::is_light;
use crate::hass::classify::is_switch;
use crate::hass::discovery::device_announcements;
use crate::hass::light;
use crate::hass::sensor::sensor_state;
use crate::hass::switch;
use crate::hass::EntityKind;
use crate::mqtt::device_slug;
use crate::mqtt::BusError;
use crate::mqtt::MqttClient;
use crate::mqtt::Payload;
use crate::mqtt::Topics;

/// Default time for one full pass over all devices
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(120);

/// Minimum pause between two device polls
const MIN_PACE: Duration = Duration::from_secs(1);

/// Why an inbound command was dropped. Never fatal.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("invalid JSON payload for light command: {0:?}")]
    MalformedCommandPayload(String),

    #[error("received command for unknown device {0}")]
    UnknownDevice(String),

    #[error("unsupported command entity: {0}")]
    UnsupportedEntity(String),
}

/// Failure of a poll pass; propagates to the caller of [`Engine::run`].
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Bus(#[from] BusError),

    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Poll until shutdown is requested
    Continuous,
    /// Stop after one full pass
    Once,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    Completed,
    Interrupted,
}

/// The poll/dispatch loop
///
/// Each pass walks the device list. Before every device it drains the
/// command queue, then polls the device, publishes its state and paces
/// itself so a full pass takes roughly the poll interval. This is the only
/// consumer of the command queue and the only caller of the API and bus.
pub struct Engine<A, B> {
    api: A,
    bus: B,
    topics: Topics,

    /// Devices in polling order
    devices: Vec<Device>,

    /// slug -> index into `devices`
    slugs: HashMap<String, usize>,

    commands: CommandReceiver,
    poll_interval: Duration,
    continue_on_error: bool,

    /// Set to `true` to stop at the next suspension point
    shutdown: watch::Receiver<bool>,

    status: watch::Sender<BridgeState>,
}

impl<A: GoveeApi, B: MqttClient> Engine<A, B> {
    pub fn new(
        api: A,
        bus: B,
        topics: Topics,
        devices: Vec<Device>,
        commands: CommandReceiver,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let slugs = devices
            .iter()
            .enumerate()
            .map(|(i, d)| (device_slug(&d.device_id), i))
            .collect();
        let (status, _) = watch::channel(BridgeState::new(&devices));

        Self {
            api,
            bus,
            topics,
            devices,
            slugs,
            commands,
            poll_interval: DEFAULT_POLL_INTERVAL,
            continue_on_error: false,
            shutdown,
            status,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Log a failed pass and keep going instead of returning the error.
    pub fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    /// Subscribe to the status snapshot.
    pub fn status(&self) -> watch::Receiver<BridgeState> {
        self.status.subscribe()
    }

    /// Publish retained discovery messages for every device.
    pub async fn publish_discovery(&mut self) -> Result<usize, EngineError> {
        let announcements: Vec<_> = self
            .devices
            .iter()
            .flat_map(|d| device_announcements(d, &self.topics))
            .collect();

        for announcement in &announcements {
            let payload = Payload::Json(serde_json::to_value(&announcement.message)?);
            self.publish(&announcement.topic, payload).await?;
        }

        info!(
            "Published {} discovery messages for {} devices",
            announcements.len(),
            self.devices.len()
        );
        Ok(announcements.len())
    }

    /// Run passes until shutdown, or once in [`RunMode::Once`].
    pub async fn run(&mut self, mode: RunMode) -> Result<(), EngineError> {
        info!(
            "Polling {} devices every {}s",
            self.devices.len(),
            self.poll_interval.as_secs()
        );

        loop {
            let started = Instant::now();

            match self.run_pass().await {
                Ok(PassOutcome::Completed) => {}
                Ok(PassOutcome::Interrupted) => break,
                Err(e) if self.continue_on_error => error!("Poll pass failed: {}", e),
                Err(e) => return Err(e),
            }

            if mode == RunMode::Once {
                break;
            }

            let remaining = self.poll_interval.saturating_sub(started.elapsed());
            if self.sleep_or_shutdown(remaining).await {
                break;
            }
        }

        Ok(())
    }

    /// One pass over the device list.
    pub async fn run_pass(&mut self) -> Result<PassOutcome, EngineError> {
        if self.devices.is_empty() {
            self.drain_commands().await?;
            return Ok(PassOutcome::Completed);
        }

        let pace = self.pace();
        for index in 0..self.devices.len() {
            if self.shutdown_requested() {
                return Ok(PassOutcome::Interrupted);
            }

            self.drain_commands().await?;

            let device = self.devices[index].clone();
            let state = self.api.get_device_state(&device).await?;
            self.publish_state(&device, &state).await?;

            if self.sleep_or_shutdown(pace).await {
                return Ok(PassOutcome::Interrupted);
            }
        }

        Ok(PassOutcome::Completed)
    }

    /// Handle every queued command, in arrival order.
    pub async fn drain_commands(&mut self) -> Result<usize, EngineError> {
        let mut handled = 0;
        while let Ok(command) = self.commands.try_recv() {
            self.handle_command(command).await?;
            handled += 1;
        }
        Ok(handled)
    }

    /// Disconnect from the bus.
    pub async fn shutdown(&mut self) -> Result<(), EngineError> {
        info!("Shutting down");
        self.bus.disconnect().await?;
        Ok(())
    }

    fn pace(&self) -> Duration {
        let count = u32::try_from(self.devices.len().max(1)).unwrap_or(u32::MAX);
        (self.poll_interval / count).max(MIN_PACE)
    }

    fn shutdown_requested(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Sleep for `duration`; returns `true` if shutdown was requested.
    async fn sleep_or_shutdown(&mut self, duration: Duration) -> bool {
        if self.shutdown_requested() {
            return true;
        }

        let deadline = Instant::now() + duration;
        let shutdown = &mut self.shutdown;
        let stopped = tokio::select! {
            _ = tokio::time::sleep_until(deadline) => return false,
            stopped = async { shutdown.wait_for(|stop| *stop).await.is_ok() } => stopped,
        };

        if !stopped {
            // Nobody can request shutdown any more
            tokio::time::sleep_until(deadline).await;
        }
        stopped
    }

    /// Apply one command, then re-fetch and publish the device's state.
    ///
    /// Undecodable commands are logged and dropped. Capability writes are
    /// issued in order and stop at the first API error.
    async fn handle_command(&mut self, command: QueuedCommand) -> Result<(), EngineError> {
        let (device, capabilities) = match self.decode_command(&command) {
            Ok(decoded) => decoded,
            Err(e @ CommandError::UnsupportedEntity(_)) => {
                debug!("Dropping command: {}", e);
                return Ok(());
            }
            Err(e) => {
                warn!("Dropping command: {}", e);
                return Ok(());
            }
        };

        debug!(
            "Applying {} {} command(s) to {}",
            capabilities.len(),
            command.entity_kind,
            device.name
        );
        for capability in &capabilities {
            self.api.control_device(&device, capability).await?;
        }

        let state = self.api.get_device_state(&device).await?;
        self.publish_state(&device, &state).await
    }

    fn decode_command(
        &self,
        command: &QueuedCommand,
    ) -> Result<(Device, Vec<CapabilityCommand>), CommandError> {
        let device = self
            .slugs
            .get(&command.device_slug)
            .map(|&i| &self.devices[i])
            .ok_or_else(|| CommandError::UnknownDevice(command.device_slug.clone()))?;

        let capabilities = match command.entity_kind.parse::<EntityKind>() {
            Ok(EntityKind::Light) => {
                light::decode_command(&parse_light_payload(&command.raw_payload)?)
            }
            Ok(EntityKind::Switch) => switch::decode_command(&command.raw_payload),
            _ => return Err(CommandError::UnsupportedEntity(command.entity_kind.clone())),
        };

        Ok((device.clone(), capabilities))
    }

    /// Publish the light or switch state and the sensor state of a device.
    ///
    /// Empty light and sensor payloads and a missing switch state are not
    /// published.
    async fn publish_state(
        &mut self,
        device: &Device,
        state: &DeviceState,
    ) -> Result<(), EngineError> {
        let slug = device_slug(&device.device_id);

        let mut light_state = None;
        let mut switch_state = None;
        if is_light(device) {
            let light = light::light_state(state);
            if !light.is_empty() {
                let payload = Payload::Json(serde_json::to_value(&light)?);
                self.publish(&self.topics.state(&slug, EntityKind::Light), payload)
                    .await?;
                light_state = Some(light);
            }
        } else if is_switch(device) {
            if let Some(power) = switch::switch_state(state) {
                let payload = Payload::Text(power.to_string());
                self.publish(&self.topics.state(&slug, EntityKind::Switch), payload)
                    .await?;
                switch_state = Some(power);
            }
        }

        let sensors = sensor_state(state);
        let sensors = if sensors.is_empty() {
            None
        } else {
            let payload = Payload::Json(Value::Object(sensors.clone()));
            self.publish(&self.topics.state(&slug, EntityKind::Sensor), payload)
                .await?;
            Some(sensors)
        };

        self.status.send_modify(|status| {
            if let Some(entry) = status.devices.get_mut(&slug) {
                entry.light = light_state.or(entry.light.take());
                entry.switch = switch_state.or(entry.switch);
                entry.sensors = sensors.or(entry.sensors.take());
            }
        });

        Ok(())
    }

    async fn publish(&mut self, topic: &str, payload: Payload) -> Result<(), EngineError> {
        self.bus.publish(topic, &payload.into_bytes(), true).await?;
        Ok(())
    }
}

/// An empty light payload is an empty command; anything else must be a
/// JSON object.
fn parse_light_payload(raw: &str) -> Result<Map<String, Value>, CommandError> {
    if raw.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str(raw) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(CommandError::MalformedCommandPayload(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::engine::command_channel;
    use crate::engine::CommandSender;
    use crate::govee::Capability;
    use crate::govee::CapabilityKind;
    use crate::hass::Power;
    use crate::hass::BRIGHTNESS;
    use crate::hass::POWER_SWITCH;
    use crate::mqtt::MockMqttClient;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        State(String),
        Control(String, CapabilityCommand),
    }

    #[derive(Debug, Clone, Default)]
    struct MockApi {
        calls: Arc<Mutex<Vec<Call>>>,
        states: HashMap<String, DeviceState>,
        /// Fail control calls for this capability instance
        fail_instance: Option<String>,
    }

    impl MockApi {
        fn with_state(mut self, state: DeviceState) -> Self {
            self.states.insert(state.device_id.clone(), state);
            self
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn controls(&self) -> Vec<CapabilityCommand> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    Call::Control(_, cmd) => Some(cmd),
                    Call::State(_) => None,
                })
                .collect()
        }

        fn polls(&self) -> usize {
            self.calls()
                .iter()
                .filter(|c| matches!(c, Call::State(_)))
                .count()
        }
    }

    #[async_trait]
    impl GoveeApi for MockApi {
        async fn list_devices(&self) -> Result<Vec<Device>, ApiError> {
            Ok(Vec::new())
        }

        async fn get_device_state(&self, device: &Device) -> Result<DeviceState, ApiError> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::State(device.device_id.clone()));
            Ok(self
                .states
                .get(&device.device_id)
                .cloned()
                .unwrap_or_else(|| DeviceState {
                    sku: device.sku.clone(),
                    device_id: device.device_id.clone(),
                    capabilities: Vec::new(),
                }))
        }

        async fn control_device(
            &self,
            device: &Device,
            command: &CapabilityCommand,
        ) -> Result<(), ApiError> {
            if self.fail_instance.as_deref() == Some(command.instance.as_str()) {
                return Err(ApiError::Status {
                    status: 400,
                    body: "bad request".to_string(),
                });
            }
            self.calls
                .lock()
                .unwrap()
                .push(Call::Control(device.device_id.clone(), command.clone()));
            Ok(())
        }
    }

    struct Harness {
        engine: Engine<MockApi, MockMqttClient>,
        api: MockApi,
        bus: MockMqttClient,
        commands: CommandSender,
        shutdown: watch::Sender<bool>,
    }

    fn harness(api: MockApi, devices: Vec<Device>) -> Harness {
        let bus = MockMqttClient::connected();
        let (commands, rx) = command_channel();
        let (shutdown, shutdown_rx) = watch::channel(false);
        let engine = Engine::new(
            api.clone(),
            bus.clone(),
            Topics::new("govee2mqtt", "homeassistant"),
            devices,
            rx,
            shutdown_rx,
        )
        .with_poll_interval(Duration::from_secs(10));

        Harness {
            engine,
            api,
            bus,
            commands,
            shutdown,
        }
    }

    fn lamp() -> Device {
        Device {
            sku: "H6072".to_string(),
            device_id: "AA:BB".to_string(),
            name: "Lamp".to_string(),
            device_type: None,
            capabilities: vec![
                Capability::new(CapabilityKind::OnOff, POWER_SWITCH),
                Capability::new(CapabilityKind::Range, BRIGHTNESS),
            ],
        }
    }

    fn plug() -> Device {
        Device {
            sku: "H5080".to_string(),
            device_id: "CC:DD".to_string(),
            name: "Plug".to_string(),
            device_type: None,
            capabilities: vec![Capability::new(CapabilityKind::OnOff, POWER_SWITCH)],
        }
    }

    fn thermometer() -> Device {
        Device {
            sku: "H5179".to_string(),
            device_id: "EE:FF".to_string(),
            name: "Thermometer".to_string(),
            device_type: None,
            capabilities: vec![
                Capability::new(CapabilityKind::Property, "temperature"),
                Capability::new(CapabilityKind::Property, "motion"),
            ],
        }
    }

    fn queue(commands: &CommandSender, slug: &str, entity: &str, payload: &str) {
        commands
            .send(QueuedCommand {
                device_slug: slug.to_string(),
                entity_kind: entity.to_string(),
                raw_payload: payload.to_string(),
            })
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_commands_issued_in_queue_order() {
        let mut h = harness(MockApi::default(), vec![lamp()]);
        queue(&h.commands, "aabb", "light", r#"{"brightness": 255}"#);
        queue(&h.commands, "aabb", "light", r#"{"state": "OFF"}"#);

        h.engine.run_pass().await.unwrap();

        let brightness = CapabilityCommand::new(CapabilityKind::Range, BRIGHTNESS, 100);
        let power_off = CapabilityCommand::new(CapabilityKind::OnOff, POWER_SWITCH, 0);
        assert_eq!(
            h.api.calls(),
            vec![
                Call::Control("AA:BB".to_string(), brightness),
                Call::State("AA:BB".to_string()),
                Call::Control("AA:BB".to_string(), power_off),
                Call::State("AA:BB".to_string()),
                Call::State("AA:BB".to_string()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_commands_drained_before_each_device() {
        let mut h = harness(MockApi::default(), vec![lamp(), plug()]);
        queue(&h.commands, "ccdd", "switch", "ON");

        h.engine.run_pass().await.unwrap();

        // The plug command is applied before the lamp is polled
        assert_eq!(
            h.api.calls()[..2],
            [
                Call::Control(
                    "CC:DD".to_string(),
                    CapabilityCommand::new(CapabilityKind::OnOff, POWER_SWITCH, 1)
                ),
                Call::State("CC:DD".to_string()),
            ]
        );
        assert_eq!(h.api.polls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bad_commands_are_dropped() {
        let mut h = harness(MockApi::default(), vec![lamp()]);
        queue(&h.commands, "0000", "light", r#"{"state": "ON"}"#);
        queue(&h.commands, "aabb", "climate", "heat");
        queue(&h.commands, "aabb", "light", "not json");
        queue(&h.commands, "aabb", "light", "[1, 2]");

        assert_eq!(h.engine.drain_commands().await.unwrap(), 4);
        assert!(h.api.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_light_payload_refreshes_state() {
        let mut h = harness(MockApi::default(), vec![lamp()]);
        queue(&h.commands, "aabb", "light", "");

        h.engine.drain_commands().await.unwrap();
        assert_eq!(h.api.calls(), vec![Call::State("AA:BB".to_string())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_control_stops_issuance() {
        let api = MockApi {
            fail_instance: Some(BRIGHTNESS.to_string()),
            ..MockApi::default()
        };
        let mut h = harness(api, vec![lamp()]);
        queue(
            &h.commands,
            "aabb",
            "light",
            r#"{"state": "ON", "brightness": 128, "color_temp": 250}"#,
        );

        let result = h.engine.run_pass().await;
        assert!(matches!(
            result,
            Err(EngineError::Api(ApiError::Status { status: 400, .. }))
        ));
        assert_eq!(
            h.api.controls(),
            vec![CapabilityCommand::new(
                CapabilityKind::OnOff,
                POWER_SWITCH,
                1
            )]
        );
        assert_eq!(h.api.polls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_publish_formats() {
        let api = MockApi::default()
            .with_state(DeviceState {
                sku: "H6072".to_string(),
                device_id: "AA:BB".to_string(),
                capabilities: vec![
                    Capability::new(CapabilityKind::OnOff, POWER_SWITCH).with_value(json!(1)),
                    Capability::new(CapabilityKind::Range, BRIGHTNESS).with_value(json!(100)),
                ],
            })
            .with_state(DeviceState {
                sku: "H5080".to_string(),
                device_id: "CC:DD".to_string(),
                capabilities: vec![
                    Capability::new(CapabilityKind::OnOff, POWER_SWITCH).with_value(json!(0))
                ],
            })
            .with_state(DeviceState {
                sku: "H5179".to_string(),
                device_id: "EE:FF".to_string(),
                capabilities: vec![
                    Capability::new(CapabilityKind::Property, "temperature")
                        .with_value(json!(21.5)),
                    Capability::new(CapabilityKind::Property, "motion").with_value(json!(0)),
                ],
            });
        let mut h = harness(api, vec![lamp(), plug(), thermometer()]);

        h.engine.run(RunMode::Once).await.unwrap();

        let light = h.bus.published_to("govee2mqtt/aabb/light/state");
        assert_eq!(light.len(), 1);
        assert!(light[0].retain);
        assert_eq!(light[0].json(), json!({"state": "ON", "brightness": 255}));

        let switch = h.bus.published_to("govee2mqtt/ccdd/switch/state");
        assert_eq!(switch[0].text(), "OFF");

        let sensor = h.bus.published_to("govee2mqtt/eeff/sensor/state");
        assert_eq!(sensor[0].json(), json!({"temperature": 21.5}));

        // Nothing else: no sensor state for the lamp, no light state for the plug
        assert_eq!(h.bus.published().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_state_is_not_published() {
        let mut h = harness(MockApi::default(), vec![lamp(), plug()]);
        h.engine.run_pass().await.unwrap();
        assert!(h.bus.published().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pass_paces_devices() {
        let mut h = harness(MockApi::default(), vec![lamp(), plug(), thermometer()]);
        h.engine = h.engine.with_poll_interval(Duration::from_secs(6));

        let started = Instant::now();
        h.engine.run(RunMode::Once).await.unwrap();
        assert_eq!(started.elapsed().as_secs(), 6);

        // Never faster than one device per second
        h.engine = h.engine.with_poll_interval(Duration::from_secs(1));
        let started = Instant::now();
        h.engine.run_pass().await.unwrap();
        assert_eq!(started.elapsed().as_secs(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_until_shutdown() {
        let h = harness(MockApi::default(), vec![lamp()]);
        let mut engine = h.engine;
        let task = tokio::spawn(async move { engine.run(RunMode::Continuous).await });

        tokio::time::sleep(Duration::from_secs(25)).await;
        h.shutdown.send(true).unwrap();
        task.await.unwrap().unwrap();

        // Passes start at 0s, 10s and 20s
        assert_eq!(h.api.polls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_continue_on_error() {
        let api = MockApi {
            fail_instance: Some(POWER_SWITCH.to_string()),
            ..MockApi::default()
        };
        let h = harness(api, vec![plug()]);
        let mut engine = h.engine.with_continue_on_error(true);
        queue(&h.commands, "ccdd", "switch", "ON");

        let task = tokio::spawn(async move { engine.run(RunMode::Continuous).await });
        tokio::time::sleep(Duration::from_secs(15)).await;
        h.shutdown.send(true).unwrap();
        task.await.unwrap().unwrap();

        // The failed first pass is skipped; the second one polls
        assert_eq!(h.api.polls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_discovery_and_status() {
        let api = MockApi::default().with_state(DeviceState {
            sku: "H5080".to_string(),
            device_id: "CC:DD".to_string(),
            capabilities: vec![
                Capability::new(CapabilityKind::OnOff, POWER_SWITCH).with_value(json!(1))
            ],
        });
        let mut h = harness(api, vec![lamp(), plug(), thermometer()]);

        assert_eq!(h.engine.publish_discovery().await.unwrap(), 4);
        assert!(h.bus.published().iter().all(|p| p.retain));
        assert!(h
            .bus
            .published()
            .iter()
            .all(|p| p.topic.starts_with("homeassistant/") && p.topic.ends_with("/config")));

        let status = h.engine.status();
        assert_eq!(status.borrow().devices["ccdd"].switch, None);

        h.engine.run_pass().await.unwrap();
        let snapshot = status.borrow().clone();
        assert_eq!(snapshot.devices["ccdd"].switch, Some(Power::On));
        assert_eq!(
            snapshot.devices["eeff"].entities,
            vec![EntityKind::Sensor, EntityKind::BinarySensor]
        );
    }

    #[tokio::test]
    async fn test_shutdown_disconnects() {
        let mut h = harness(MockApi::default(), vec![plug()]);
        h.engine.shutdown().await.unwrap();

        assert!(matches!(
            h.engine.publish_discovery().await,
            Err(EngineError::Bus(BusError::NotConnected))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_requested_before_pass() {
        let mut h = harness(MockApi::default(), vec![lamp()]);
        h.shutdown.send(true).unwrap();

        assert_eq!(h.engine.run_pass().await.unwrap(), PassOutcome::Interrupted);
        assert!(h.api.calls().is_empty());
    }
}
