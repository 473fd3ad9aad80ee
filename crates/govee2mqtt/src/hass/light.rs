//! Light state encoding and command decoding.
//!
//! Govee reports brightness as a 0-100 percentage and color temperature in
//! Kelvin; Home Assistant's JSON light schema uses 0-255 and mireds.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use super::as_number;
use super::Power;
use super::BRIGHTNESS;
use super::COLOR_RGB;
use super::COLOR_TEMPERATURE_K;
use super::POWER_SWITCH;
use crate::govee::model::find_capability;
use crate::govee::CapabilityCommand;
use crate::govee::CapabilityKind;
use crate::govee::DeviceState;

/// RGB color triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Read `{r, g, b}` with integral channels, or a packed `0xRRGGBB` integer.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(map) => {
                let channel = |name: &str| {
                    map.get(name)
                        .and_then(Value::as_u64)
                        .and_then(|c| u8::try_from(c).ok())
                };
                Some(Self {
                    r: channel("r")?,
                    g: channel("g")?,
                    b: channel("b")?,
                })
            }
            Value::Number(n) => {
                let packed = u32::try_from(n.as_u64()?).ok()?;
                if packed > 0xFF_FF_FF {
                    return None;
                }
                let [_, r, g, b] = packed.to_be_bytes();
                Some(Self { r, g, b })
            }
            _ => None,
        }
    }
}

/// Home Assistant color modes, as listed in discovery and reported in state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    Onoff,
    Brightness,
    Rgb,
    ColorTemp,
}

/// Payload published to `{base}/{slug}/light/state`.
///
/// Fields are only present when the device reported a well-typed value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<Power>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<u8>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgb>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_temp: Option<u32>,

    /// Which of `color` and `color_temp` is active
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_mode: Option<ColorMode>,
}

impl LightState {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Scale a 0-100 percentage to Home Assistant's 0-255 brightness.
pub fn percent_to_brightness(percent: f64) -> u8 {
    (percent / 100.0 * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Scale a 0-255 brightness to a percentage; Govee rejects 0, so the result
/// is clamped to 1-100.
pub fn brightness_to_percent(brightness: f64) -> u8 {
    (brightness / 255.0 * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Convert a color temperature in Kelvin to mireds.
///
/// The result is not rounded; callers round when producing a wire value.
pub fn kelvin_to_mired(kelvin: f64) -> f64 {
    1_000_000.0 / kelvin
}

/// Convert mireds to Kelvin, the inverse of [`kelvin_to_mired`].
pub fn mired_to_kelvin(mired: f64) -> f64 {
    1_000_000.0 / mired
}

/// Derive the light state from a device state snapshot.
pub fn light_state(state: &DeviceState) -> LightState {
    let caps = &state.capabilities;
    let value = |kind: CapabilityKind, instance: &str| {
        find_capability(caps, &kind, Some(instance)).map(|cap| cap.value())
    };

    let power = value(CapabilityKind::OnOff, POWER_SWITCH).map(Power::from_value);

    let brightness = value(CapabilityKind::Range, BRIGHTNESS)
        .and_then(as_number)
        .map(percent_to_brightness);

    let color = value(CapabilityKind::ColorSetting, COLOR_RGB)
        .flatten()
        .and_then(Rgb::from_value);

    let color_temp = value(CapabilityKind::ColorSetting, COLOR_TEMPERATURE_K)
        .and_then(as_number)
        .filter(|kelvin| *kelvin > 0.0)
        .map(|kelvin| kelvin_to_mired(kelvin).round() as u32);

    // Govee reports a zero color temperature while the light is in RGB mode
    let color_mode = if color_temp.is_some() {
        Some(ColorMode::ColorTemp)
    } else if color.is_some() {
        Some(ColorMode::Rgb)
    } else {
        None
    };

    LightState {
        state: power,
        brightness,
        color,
        color_temp,
        color_mode,
    }
}

/// Decode a JSON light command into capability writes.
///
/// Commands are ordered state, brightness, color, color temperature. A field
/// that is missing or of the wrong type produces no command.
pub fn decode_command(payload: &Map<String, Value>) -> Vec<CapabilityCommand> {
    let mut commands = Vec::new();

    if let Some(state) = payload.get("state").and_then(Value::as_str) {
        commands.push(CapabilityCommand::new(
            CapabilityKind::OnOff,
            POWER_SWITCH,
            Power::from_command(state).capability_value(),
        ));
    }

    if let Some(brightness) = as_number(payload.get("brightness")) {
        commands.push(CapabilityCommand::new(
            CapabilityKind::Range,
            BRIGHTNESS,
            brightness_to_percent(brightness),
        ));
    }

    if let Some(color @ Value::Object(_)) = payload.get("color") {
        commands.push(CapabilityCommand::new(
            CapabilityKind::ColorSetting,
            COLOR_RGB,
            color.clone(),
        ));
    }

    if let Some(mired) = as_number(payload.get("color_temp")).filter(|m| *m > 0.0) {
        commands.push(CapabilityCommand::new(
            CapabilityKind::ColorSetting,
            COLOR_TEMPERATURE_K,
            mired_to_kelvin(mired).round() as u64,
        ));
    }

    commands
}
