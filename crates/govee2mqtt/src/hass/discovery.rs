//! Home Assistant MQTT discovery announcements.
//!
//! One retained config message is published per entity:
//! `{prefix}/{component}/{slug}_{object}/config`.

use serde::Serialize;

use super::classify::has_brightness;
use super::classify::has_color_temp;
use super::classify::has_rgb;
use super::classify::is_light;
use super::classify::is_switch;
use super::classify::sensor_entities;
use super::light::kelvin_to_mired;
use super::light::ColorMode;
use super::sensor::SensorDescriptor;
use super::EntityKind;
use super::COLOR_TEMPERATURE_K;
use crate::govee::model::find_capability;
use crate::govee::CapabilityKind;
use crate::govee::Device;
use crate::mqtt::device_slug;
use crate::mqtt::Topics;

/// Prefix for every `unique_id` this bridge announces
const UNIQUE_ID_PREFIX: &str = "govee2mqtt";

/// Discovery config payload
///
/// Only the fields relevant to the entity's component are set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiscoveryMessage {
    /// Human-readable name of the entity
    pub name: String,

    /// Unique identifier for this entity
    pub unique_id: String,

    /// Schema type; lights use "json"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Topic to receive state updates
    pub state_topic: String,

    /// Topic to send commands
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_topic: Option<String>,

    /// Template extracting this entity's value from the shared sensor state,
    /// e.g. "{{ value_json.temperature }}"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_template: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_class: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_of_measurement: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_on: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_off: Option<String>,

    /// Whether brightness is supported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<bool>,

    /// Whether RGB color is supported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rgb: Option<bool>,

    /// Whether color temperature is supported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_temp: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub supported_color_modes: Option<Vec<ColorMode>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_mireds: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_mireds: Option<u32>,

    /// Device information
    pub device: DeviceInfo,
}

/// Device block shared by all entities of one device
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeviceInfo {
    /// List of identifiers for this device
    pub identifiers: Vec<String>,

    pub name: String,

    pub manufacturer: String,

    /// Govee SKU
    pub model: String,
}

impl DeviceInfo {
    pub fn new(device: &Device) -> Self {
        Self {
            identifiers: vec![device.device_id.clone()],
            name: device.name.clone(),
            manufacturer: "Govee".to_string(),
            model: device.sku.clone(),
        }
    }
}

/// A discovery message and the topic it is published on
#[derive(Debug, Clone, PartialEq)]
pub struct Announcement {
    pub topic: String,
    pub message: DiscoveryMessage,
}

fn unique_id(slug: &str, object: &str) -> String {
    format!("{UNIQUE_ID_PREFIX}_{slug}_{object}")
}

/// Color modes in Home Assistant's terms; brightness is implied by the
/// color modes and only listed on its own.
fn color_modes(brightness: bool, rgb: bool, color_temp: bool) -> Vec<ColorMode> {
    let mut modes = Vec::new();
    if rgb {
        modes.push(ColorMode::Rgb);
    }
    if color_temp {
        modes.push(ColorMode::ColorTemp);
    }
    if modes.is_empty() {
        modes.push(if brightness {
            ColorMode::Brightness
        } else {
            ColorMode::Onoff
        });
    }
    modes
}

/// Mired bounds `(min, max)` from the `colorTemperatureK` range parameter.
fn mired_range(device: &Device) -> Option<(u32, u32)> {
    let cap = find_capability(
        &device.capabilities,
        &CapabilityKind::ColorSetting,
        Some(COLOR_TEMPERATURE_K),
    )?;
    let range = cap.parameters.get("range")?;
    let min_k = range.get("min")?.as_u64().filter(|k| *k > 0)?;
    let max_k = range.get("max")?.as_u64().filter(|k| *k >= min_k)?;

    // Higher Kelvin means fewer mireds
    let min_mireds = kelvin_to_mired(max_k as f64).round() as u32;
    let max_mireds = kelvin_to_mired(min_k as f64).round() as u32;
    Some((min_mireds, max_mireds))
}

pub fn light_announcement(device: &Device, topics: &Topics) -> Announcement {
    let slug = device_slug(&device.device_id);
    let kind = EntityKind::Light;

    let brightness = has_brightness(device);
    let rgb = has_rgb(device);
    let color_temp = has_color_temp(device);
    let mireds = mired_range(device).filter(|_| color_temp);

    Announcement {
        topic: topics.discovery(kind, &slug, kind.as_ref()),
        message: DiscoveryMessage {
            name: device.name.clone(),
            unique_id: unique_id(&slug, kind.as_ref()),
            schema: Some("json".to_string()),
            state_topic: topics.state(&slug, kind),
            command_topic: Some(topics.command(&slug, kind)),
            brightness: Some(brightness),
            rgb: Some(rgb),
            color_temp: Some(color_temp),
            supported_color_modes: Some(color_modes(brightness, rgb, color_temp)),
            min_mireds: mireds.map(|(min, _)| min),
            max_mireds: mireds.map(|(_, max)| max),
            device: DeviceInfo::new(device),
            ..Default::default()
        },
    }
}

pub fn switch_announcement(device: &Device, topics: &Topics) -> Announcement {
    let slug = device_slug(&device.device_id);
    let kind = EntityKind::Switch;

    Announcement {
        topic: topics.discovery(kind, &slug, kind.as_ref()),
        message: DiscoveryMessage {
            name: device.name.clone(),
            unique_id: unique_id(&slug, kind.as_ref()),
            state_topic: topics.state(&slug, kind),
            command_topic: Some(topics.command(&slug, kind)),
            device: DeviceInfo::new(device),
            ..Default::default()
        },
    }
}

/// One announcement per sensor entity; all share the device's sensor state
/// topic and pick their value out with a template.
pub fn sensor_announcements(device: &Device, topics: &Topics) -> Vec<Announcement> {
    let slug = device_slug(&device.device_id);

    sensor_entities(device)
        .into_iter()
        .map(|entity| {
            let kind = entity.kind();
            let instance = &entity.instance;

            let mut message = DiscoveryMessage {
                name: format!("{} {}", device.name, instance),
                unique_id: unique_id(&slug, instance),
                state_topic: topics.state(&slug, kind),
                value_template: Some(format!("{{{{ value_json.{instance} }}}}")),
                device: DeviceInfo::new(device),
                ..Default::default()
            };

            match entity.descriptor {
                SensorDescriptor::Metric { device_class, unit } => {
                    message.device_class = Some(device_class.to_string());
                    message.unit_of_measurement = Some(unit.to_string());
                }
                SensorDescriptor::Binary { device_class } => {
                    message.device_class = Some(device_class.to_string());
                    message.payload_on = Some("1".to_string());
                    message.payload_off = Some("0".to_string());
                }
            }

            Announcement {
                topic: topics.discovery(kind, &slug, instance),
                message,
            }
        })
        .collect()
}

/// Every announcement for a device: its light or switch, then its sensors.
pub fn device_announcements(device: &Device, topics: &Topics) -> Vec<Announcement> {
    let mut announcements = Vec::new();
    if is_light(device) {
        announcements.push(light_announcement(device, topics));
    } else if is_switch(device) {
        announcements.push(switch_announcement(device, topics));
    }
    announcements.extend(sensor_announcements(device, topics));
    announcements
}
