//! Passive data types for the Govee Platform API.
//!
//! Devices and state snapshots are rebuilt from every API response and never
//! cached across poll cycles. Parsing is lenient: the API wraps its data in
//! either a `data` or a `payload` member depending on the endpoint, and
//! missing fields fall back to empty values rather than failing the response.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde_json::Map;
use serde_json::Value;
use strum::EnumString;

/// Capability type as reported in the `type` member of a capability.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumString)]
pub enum CapabilityKind {
    #[strum(serialize = "devices.capabilities.on_off")]
    OnOff,
    #[strum(serialize = "devices.capabilities.toggle")]
    Toggle,
    #[strum(serialize = "devices.capabilities.range")]
    Range,
    #[strum(serialize = "devices.capabilities.mode")]
    Mode,
    #[strum(serialize = "devices.capabilities.color_setting")]
    ColorSetting,
    #[strum(serialize = "devices.capabilities.segment_color_setting")]
    SegmentColorSetting,
    #[strum(serialize = "devices.capabilities.music_setting")]
    MusicSetting,
    #[strum(serialize = "devices.capabilities.dynamic_scene")]
    DynamicScene,
    #[strum(serialize = "devices.capabilities.work_mode")]
    WorkMode,
    #[strum(serialize = "devices.capabilities.temperature_setting")]
    TemperatureSetting,
    #[strum(serialize = "devices.capabilities.online")]
    Online,
    #[strum(serialize = "devices.capabilities.property")]
    Property,
    #[strum(serialize = "devices.capabilities.event")]
    Event,
    /// A capability type not known to this bridge
    #[strum(default)]
    Other(String),
}

impl CapabilityKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::OnOff => "devices.capabilities.on_off",
            Self::Toggle => "devices.capabilities.toggle",
            Self::Range => "devices.capabilities.range",
            Self::Mode => "devices.capabilities.mode",
            Self::ColorSetting => "devices.capabilities.color_setting",
            Self::SegmentColorSetting => "devices.capabilities.segment_color_setting",
            Self::MusicSetting => "devices.capabilities.music_setting",
            Self::DynamicScene => "devices.capabilities.dynamic_scene",
            Self::WorkMode => "devices.capabilities.work_mode",
            Self::TemperatureSetting => "devices.capabilities.temperature_setting",
            Self::Online => "devices.capabilities.online",
            Self::Property => "devices.capabilities.property",
            Self::Event => "devices.capabilities.event",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for CapabilityKind {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl<'de> Deserialize<'de> for CapabilityKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        // The `Other` default variant makes parsing infallible.
        Ok(Self::from_str(&s).unwrap_or(Self::Other(s)))
    }
}

impl Serialize for CapabilityKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// A named, typed control or telemetry point on a device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Capability {
    #[serde(rename = "type", default)]
    pub kind: CapabilityKind,

    #[serde(default)]
    pub instance: String,

    #[serde(default, deserialize_with = "object_or_empty")]
    pub parameters: Map<String, Value>,

    #[serde(default, deserialize_with = "object_or_empty")]
    pub state: Map<String, Value>,
}

impl Capability {
    pub fn new(kind: CapabilityKind, instance: impl Into<String>) -> Self {
        Self {
            kind,
            instance: instance.into(),
            ..Self::default()
        }
    }

    /// Attach a reported value, as found in a state response.
    pub fn with_value(mut self, value: Value) -> Self {
        self.state.insert("value".to_string(), value);
        self
    }

    /// The reported value, `state["value"]`, if any.
    pub fn value(&self) -> Option<&Value> {
        self.state.get("value")
    }

    pub fn is(&self, kind: &CapabilityKind, instance: &str) -> bool {
        &self.kind == kind && self.instance == instance
    }
}

/// Find the first capability of `kind`, optionally restricted to `instance`.
pub fn find_capability<'a>(
    capabilities: &'a [Capability],
    kind: &CapabilityKind,
    instance: Option<&str>,
) -> Option<&'a Capability> {
    capabilities
        .iter()
        .find(|cap| &cap.kind == kind && instance.is_none_or(|i| cap.instance == i))
}

/// A device as returned by `GET /user/devices`.
///
/// Identity is `(sku, device_id)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Device {
    pub sku: String,
    pub device_id: String,
    pub name: String,
    pub device_type: Option<String>,
    pub capabilities: Vec<Capability>,
}

/// Snapshot returned by `POST /device/state`; superseded on every poll.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeviceState {
    pub sku: String,
    pub device_id: String,
    pub capabilities: Vec<Capability>,
}

/// One capability write, as sent to `POST /device/control`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapabilityCommand {
    #[serde(rename = "type")]
    pub kind: CapabilityKind,
    pub instance: String,
    pub value: Value,
}

impl CapabilityCommand {
    pub fn new(kind: CapabilityKind, instance: &str, value: impl Into<Value>) -> Self {
        Self {
            kind,
            instance: instance.to_string(),
            value: value.into(),
        }
    }
}

/// Accept `null` or a non-object where an object is expected.
fn object_or_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

#[derive(Deserialize)]
struct RawDevice {
    #[serde(default)]
    sku: String,
    #[serde(default)]
    device: String,
    #[serde(default, rename = "deviceName")]
    device_name: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "type")]
    device_type: Option<String>,
    #[serde(default)]
    capabilities: Option<Vec<Capability>>,
}

impl From<RawDevice> for Device {
    fn from(raw: RawDevice) -> Self {
        let name = [raw.device_name, raw.name, Some(raw.device.clone())]
            .into_iter()
            .flatten()
            .find(|n| !n.is_empty())
            .unwrap_or_else(|| "Unknown".to_string());

        Self {
            sku: raw.sku,
            device_id: raw.device,
            name,
            device_type: raw.device_type,
            capabilities: raw.capabilities.unwrap_or_default(),
        }
    }
}

#[derive(Deserialize)]
struct RawDeviceState {
    #[serde(default)]
    sku: String,
    #[serde(default)]
    device: String,
    #[serde(default)]
    capabilities: Option<Vec<Capability>>,
}

/// Parse a `GET /user/devices` response body.
///
/// The device array is read from `data`, falling back to `payload` when
/// `data` is missing or null; a body carrying neither yields an empty list.
pub fn parse_device_list(body: &Value) -> Result<Vec<Device>, serde_json::Error> {
    let data = body
        .get("data")
        .filter(|v| !v.is_null())
        .or_else(|| body.get("payload").filter(|v| !v.is_null()));
    let Some(data) = data else {
        return Ok(Vec::new());
    };

    let raw: Vec<RawDevice> = Vec::deserialize(data)?;
    Ok(raw.into_iter().map(Device::from).collect())
}

/// Parse a `POST /device/state` response body.
///
/// The snapshot is read from `payload`, falling back to `data` and then to
/// the body itself.
pub fn parse_device_state(body: &Value) -> Result<DeviceState, serde_json::Error> {
    let data = body
        .get("payload")
        .filter(|v| !v.is_null())
        .or_else(|| body.get("data").filter(|v| !v.is_null()))
        .unwrap_or(body);

    let raw = RawDeviceState::deserialize(data)?;
    Ok(DeviceState {
        sku: raw.sku,
        device_id: raw.device,
        capabilities: raw.capabilities.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const LIST_DEVICES: &str = include_str!("../../test-data/list_devices.json");
    const GET_DEVICE_STATE: &str = include_str!("../../test-data/get_device_state.json");

    #[test]
    fn test_parse_device_list_fixture() {
        let body: Value = serde_json::from_str(LIST_DEVICES).unwrap();
        let devices = parse_device_list(&body).unwrap();

        assert_eq!(devices.len(), 1);
        let lamp = &devices[0];
        assert_eq!(lamp.name, "Floor Lamp");
        assert_eq!(lamp.sku, "H6072");
        assert_eq!(lamp.device_id, "AA:BB:CC:DD:AA:BB:CC:DD");
        assert_eq!(lamp.device_type.as_deref(), Some("devices.types.light"));
        assert!(lamp
            .capabilities
            .iter()
            .any(|c| c.is(&CapabilityKind::ColorSetting, "colorTemperatureK")));
    }

    #[test]
    fn test_parse_device_state_fixture() {
        let body: Value = serde_json::from_str(GET_DEVICE_STATE).unwrap();
        let state = parse_device_state(&body).unwrap();

        assert_eq!(state.sku, "H7143");
        assert_eq!(state.device_id, "52:8B:D4:AD:FC:45:5D:FE");
        let brightness = state
            .capabilities
            .iter()
            .find(|c| c.instance == "brightness")
            .unwrap();
        assert_eq!(brightness.kind, CapabilityKind::Range);
        assert_eq!(brightness.value(), Some(&json!(5)));
    }

    #[test]
    fn test_parse_device_list_payload_fallback_and_name() {
        let body = json!({
            "payload": [
                {"sku": "H5179", "device": "11:22", "name": "Thermo"},
                {"sku": "H5080", "device": "33:44"},
            ]
        });
        let devices = parse_device_list(&body).unwrap();

        assert_eq!(devices[0].name, "Thermo");
        assert_eq!(devices[1].name, "33:44");
        assert!(devices[1].capabilities.is_empty());
    }

    #[test]
    fn test_parse_device_list_without_data() {
        let devices = parse_device_list(&json!({"code": 200})).unwrap();
        assert!(devices.is_empty());

        let devices = parse_device_list(&json!({"data": null, "payload": null})).unwrap();
        assert!(devices.is_empty());
    }

    #[test]
    fn test_parse_device_list_null_data_uses_payload() {
        let body = json!({
            "data": null,
            "payload": [{"sku": "H5080", "device": "33:44", "deviceName": "Plug"}]
        });
        let devices = parse_device_list(&body).unwrap();

        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].name, "Plug");
    }

    #[test]
    fn test_parse_device_state_unwrapped_body() {
        let body = json!({
            "sku": "H5080",
            "device": "33:44",
            "capabilities": [
                {"type": "devices.capabilities.on_off", "instance": "powerSwitch", "state": {"value": 1}},
                {"type": "devices.capabilities.vendor_thing", "instance": "x", "state": null},
            ]
        });
        let state = parse_device_state(&body).unwrap();

        assert_eq!(state.capabilities.len(), 2);
        assert_eq!(state.capabilities[0].kind, CapabilityKind::OnOff);
        assert_eq!(
            state.capabilities[1].kind,
            CapabilityKind::Other("devices.capabilities.vendor_thing".to_string())
        );
        assert_eq!(state.capabilities[1].value(), None);
    }

    #[test]
    fn test_capability_kind_round_trips_through_serde() {
        let cap: Capability = serde_json::from_value(json!({
            "type": "devices.capabilities.color_setting",
            "instance": "colorRgb",
        }))
        .unwrap();
        assert_eq!(cap.kind, CapabilityKind::ColorSetting);

        let back = serde_json::to_value(&cap.kind).unwrap();
        assert_eq!(back, json!("devices.capabilities.color_setting"));
    }

    #[test]
    fn test_find_capability() {
        let caps = vec![
            Capability::new(CapabilityKind::ColorSetting, "colorRgb"),
            Capability::new(CapabilityKind::ColorSetting, "colorTemperatureK"),
        ];

        let any = find_capability(&caps, &CapabilityKind::ColorSetting, None).unwrap();
        assert_eq!(any.instance, "colorRgb");

        let temp =
            find_capability(&caps, &CapabilityKind::ColorSetting, Some("colorTemperatureK"))
                .unwrap();
        assert_eq!(temp.instance, "colorTemperatureK");

        assert!(find_capability(&caps, &CapabilityKind::OnOff, None).is_none());
    }
}
