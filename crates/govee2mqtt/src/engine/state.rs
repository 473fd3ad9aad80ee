use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::govee::Device;
use crate::hass::classify::entity_kinds;
use crate::hass::light::LightState;
use crate::hass::EntityKind;
use crate::hass::Power;
use crate::mqtt::device_slug;

/// Last published state of one device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceStatus {
    pub name: String,
    pub sku: String,
    pub device_id: String,

    /// Entity kinds derived from the device's capabilities
    pub entities: Vec<EntityKind>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub light: Option<LightState>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub switch: Option<Power>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensors: Option<Map<String, Value>>,
}

impl DeviceStatus {
    pub fn new(device: &Device) -> Self {
        Self {
            name: device.name.clone(),
            sku: device.sku.clone(),
            device_id: device.device_id.clone(),
            entities: entity_kinds(device),
            light: None,
            switch: None,
            sensors: None,
        }
    }

    pub fn has(&self, kind: EntityKind) -> bool {
        self.entities.contains(&kind)
    }
}

/// Snapshot of every known device, keyed by slug.
///
/// Readers get it through a `watch` channel; only the engine writes it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BridgeState {
    pub devices: BTreeMap<String, DeviceStatus>,
}

impl BridgeState {
    pub fn new(devices: &[Device]) -> Self {
        Self {
            devices: devices
                .iter()
                .map(|d| (device_slug(&d.device_id), DeviceStatus::new(d)))
                .collect(),
        }
    }
}
