use crate::hass::EntityKind;

/// Topic-safe identifier for a device: the device id with separators
/// removed, lowercased.
///
/// Example: `AA:BB:CC:DD` becomes `aabbccdd`
pub fn device_slug(device_id: &str) -> String {
    device_id
        .chars()
        .filter(|c| !matches!(c, ':' | '-'))
        .collect::<String>()
        .to_lowercase()
}

/// Topic layout for state, command and discovery messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    base: String,
    discovery_prefix: String,
}

impl Topics {
    pub fn new(base: impl Into<String>, discovery_prefix: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            discovery_prefix: discovery_prefix.into(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// State topic for an entity: `{base}/{slug}/{segment}/state`
    ///
    /// Sensors and binary sensors share the `sensor` state topic.
    pub fn state(&self, slug: &str, kind: EntityKind) -> String {
        format!("{}/{}/{}/state", self.base, slug, state_segment(kind))
    }

    /// Command topic for an entity: `{base}/{slug}/{kind}/set`
    pub fn command(&self, slug: &str, kind: EntityKind) -> String {
        format!("{}/{}/{}/set", self.base, slug, kind)
    }

    /// Discovery topic: `{prefix}/{component}/{slug}_{object}/config`
    pub fn discovery(&self, kind: EntityKind, slug: &str, object: &str) -> String {
        format!(
            "{}/{}/{}_{}/config",
            self.discovery_prefix, kind, slug, object
        )
    }

    /// Wildcard filter covering every command topic.
    pub fn command_filter(&self) -> String {
        format!("{}/+/+/set", self.base)
    }

    /// Split a command topic into `(slug, entity)`.
    ///
    /// Returns `None` for anything outside `{base}/{slug}/{entity}/set`.
    pub fn parse_command<'a>(&self, topic: &'a str) -> Option<(&'a str, &'a str)> {
        let rest = topic.strip_prefix(self.base.as_str())?.strip_prefix('/')?;
        let mut parts = rest.split('/');

        let slug = parts.next().filter(|s| !s.is_empty())?;
        let entity = parts.next().filter(|s| !s.is_empty())?;
        if parts.next() != Some("set") || parts.next().is_some() {
            return None;
        }

        Some((slug, entity))
    }
}

fn state_segment(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Light => "light",
        EntityKind::Switch => "switch",
        EntityKind::Sensor | EntityKind::BinarySensor => "sensor",
    }
}
