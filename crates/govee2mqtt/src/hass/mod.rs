//! Home Assistant entity shapes derived from Govee capabilities.
//!
//! Entity kinds are never stored: they are recomputed from a device's
//! current capability list whenever they are needed.

pub mod classify;
pub mod discovery;
pub mod light;
pub mod sensor;
pub mod switch;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use strum::AsRefStr;
use strum::Display;
use strum::EnumString;

/// `powerSwitch` instance of `devices.capabilities.on_off`
pub const POWER_SWITCH: &str = "powerSwitch";

/// `brightness` instance of `devices.capabilities.range`
pub const BRIGHTNESS: &str = "brightness";

/// `colorRgb` instance of `devices.capabilities.color_setting`
pub const COLOR_RGB: &str = "colorRgb";

/// `colorTemperatureK` instance of `devices.capabilities.color_setting`
pub const COLOR_TEMPERATURE_K: &str = "colorTemperatureK";

/// Home Assistant component an entity is announced as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Light,
    Switch,
    Sensor,
    BinarySensor,
}

/// On/off state as exchanged with Home Assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Power {
    On,
    Off,
}

impl Power {
    /// Interpret a reported capability value.
    pub fn from_value(value: Option<&Value>) -> Self {
        if value.is_some_and(is_truthy) {
            Self::On
        } else {
            Self::Off
        }
    }

    /// Parse an "ON"/"OFF" command; anything other than "ON" means off.
    pub fn from_command(text: &str) -> Self {
        if text.trim().eq_ignore_ascii_case("ON") {
            Self::On
        } else {
            Self::Off
        }
    }

    /// Value written to the `powerSwitch` capability.
    pub fn capability_value(self) -> u8 {
        match self {
            Self::On => 1,
            Self::Off => 0,
        }
    }
}

/// Loose truthiness used for reported values: null, false, zero and empty
/// strings/collections are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Numeric value of a reported field; booleans do not count as numbers.
pub(crate) fn as_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}
