use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use tracing::debug;

use super::is_truthy;
use super::EntityKind;
use crate::govee::Capability;
use crate::govee::CapabilityKind;
use crate::govee::DeviceState;

/// Device class for numeric sensors, matching Home Assistant's sensor device classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorDeviceClass {
    Temperature,
    Humidity,
    CarbonDioxide,
    #[serde(rename = "pm25")]
    Pm25,
    #[serde(rename = "pm10")]
    Pm10,
    VolatileOrganicCompounds,
    Aqi,
}

impl SensorDeviceClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::CarbonDioxide => "carbon_dioxide",
            Self::Pm25 => "pm25",
            Self::Pm10 => "pm10",
            Self::VolatileOrganicCompounds => "volatile_organic_compounds",
            Self::Aqi => "aqi",
        }
    }
}

impl fmt::Display for SensorDeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Device class for binary sensors, matching Home Assistant's binary_sensor device classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinarySensorDeviceClass {
    Door,
    Moisture,
    Motion,
}

impl BinarySensorDeviceClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Door => "door",
            Self::Moisture => "moisture",
            Self::Motion => "motion",
        }
    }
}

impl fmt::Display for BinarySensorDeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a capability instance is exposed as a sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorDescriptor {
    /// Numeric reading, published verbatim
    Metric {
        device_class: SensorDeviceClass,
        unit: &'static str,
    },
    /// Detection state, published as `1` while active
    Binary {
        device_class: BinarySensorDeviceClass,
    },
}

impl SensorDescriptor {
    /// Look up a capability instance in the sensor registry.
    ///
    /// Instances not listed here are not sensors.
    pub fn lookup(instance: &str) -> Option<Self> {
        use BinarySensorDeviceClass as B;
        use SensorDeviceClass as S;

        let metric = |device_class, unit| Self::Metric { device_class, unit };
        let binary = |device_class| Self::Binary { device_class };

        Some(match instance {
            "temperature" => metric(S::Temperature, "°C"),
            "humidity" => metric(S::Humidity, "%"),
            "co2" => metric(S::CarbonDioxide, "ppm"),
            "pm2_5" => metric(S::Pm25, "µg/m³"),
            "pm10" => metric(S::Pm10, "µg/m³"),
            "voc" => metric(S::VolatileOrganicCompounds, "ppb"),
            "aqi" => metric(S::Aqi, "AQI"),
            "motion" => binary(B::Motion),
            "leak" => binary(B::Moisture),
            "contact" => binary(B::Door),
            "door" => binary(B::Door),
            _ => return None,
        })
    }

    pub fn entity_kind(&self) -> EntityKind {
        match self {
            Self::Metric { .. } => EntityKind::Sensor,
            Self::Binary { .. } => EntityKind::BinarySensor,
        }
    }
}

/// A sensor entity derived from one capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorEntity {
    pub instance: String,
    pub descriptor: SensorDescriptor,
}

impl SensorEntity {
    pub fn kind(&self) -> EntityKind {
        self.descriptor.entity_kind()
    }
}

/// Only range and property capabilities can carry sensor readings.
pub fn is_sensor_capability(cap: &Capability) -> bool {
    matches!(cap.kind, CapabilityKind::Range | CapabilityKind::Property)
}

/// Build the combined sensor state payload, keyed by capability instance.
///
/// Metric values pass through unchanged. Binary values are published as `1`
/// when truthy; a falsy, empty or missing value is left out entirely.
pub fn sensor_state(state: &DeviceState) -> Map<String, Value> {
    let mut payload = Map::new();

    for cap in state.capabilities.iter().filter(|c| is_sensor_capability(c)) {
        let value = cap.value();
        match SensorDescriptor::lookup(&cap.instance) {
            Some(SensorDescriptor::Metric { .. }) => {
                payload.insert(cap.instance.clone(), value.cloned().unwrap_or(Value::Null));
            }
            Some(SensorDescriptor::Binary { .. }) => {
                if value.is_some_and(is_truthy) {
                    payload.insert(cap.instance.clone(), Value::from(1));
                }
            }
            None => debug!("Ignoring unsupported sensor capability: {}", cap.instance),
        }
    }

    payload
}
