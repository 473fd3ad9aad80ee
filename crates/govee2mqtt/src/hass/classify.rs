use super::sensor::is_sensor_capability;
use super::sensor::SensorDescriptor;
use super::sensor::SensorEntity;
use super::EntityKind;
use super::BRIGHTNESS;
use super::COLOR_RGB;
use super::COLOR_TEMPERATURE_K;
use crate::govee::model::find_capability;
use crate::govee::CapabilityKind;
use crate::govee::Device;

fn has(device: &Device, kind: CapabilityKind, instance: Option<&str>) -> bool {
    find_capability(&device.capabilities, &kind, instance).is_some()
}

/// Any on/off capability, regardless of instance.
pub fn has_power(device: &Device) -> bool {
    has(device, CapabilityKind::OnOff, None)
}

pub fn has_brightness(device: &Device) -> bool {
    has(device, CapabilityKind::Range, Some(BRIGHTNESS))
}

pub fn has_rgb(device: &Device) -> bool {
    has(device, CapabilityKind::ColorSetting, Some(COLOR_RGB))
}

pub fn has_color_temp(device: &Device) -> bool {
    has(device, CapabilityKind::ColorSetting, Some(COLOR_TEMPERATURE_K))
}

/// A light has power control plus at least one of brightness, RGB color or
/// color temperature.
pub fn is_light(device: &Device) -> bool {
    has_power(device) && (has_brightness(device) || has_rgb(device) || has_color_temp(device))
}

/// A switch has power control and nothing that would make it a light.
pub fn is_switch(device: &Device) -> bool {
    has_power(device) && !is_light(device)
}

/// Sensor entities exposed by a device, in capability order.
pub fn sensor_entities(device: &Device) -> Vec<SensorEntity> {
    device
        .capabilities
        .iter()
        .filter(|cap| is_sensor_capability(cap))
        .filter_map(|cap| {
            SensorDescriptor::lookup(&cap.instance).map(|descriptor| SensorEntity {
                instance: cap.instance.clone(),
                descriptor,
            })
        })
        .collect()
}

/// The entity kinds a device currently maps to, primary kind first.
pub fn entity_kinds(device: &Device) -> Vec<EntityKind> {
    let mut kinds = Vec::new();
    if is_light(device) {
        kinds.push(EntityKind::Light);
    } else if is_switch(device) {
        kinds.push(EntityKind::Switch);
    }
    for entity in sensor_entities(device) {
        if !kinds.contains(&entity.kind()) {
            kinds.push(entity.kind());
        }
    }
    kinds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::govee::Capability;
    use crate::hass::sensor::SensorDeviceClass;
    use crate::hass::POWER_SWITCH;

    fn device(caps: Vec<Capability>) -> Device {
        Device {
            sku: "H6000".to_string(),
            device_id: "AA:BB".to_string(),
            name: "Test".to_string(),
            device_type: None,
            capabilities: caps,
        }
    }

    fn power() -> Capability {
        Capability::new(CapabilityKind::OnOff, POWER_SWITCH)
    }

    #[test]
    fn test_power_plus_any_light_feature_is_light() {
        let features = [
            Capability::new(CapabilityKind::Range, BRIGHTNESS),
            Capability::new(CapabilityKind::ColorSetting, COLOR_RGB),
            Capability::new(CapabilityKind::ColorSetting, COLOR_TEMPERATURE_K),
        ];

        for feature in features {
            let dev = device(vec![power(), feature.clone()]);
            assert!(is_light(&dev), "{} should make a light", feature.instance);
            assert!(!is_switch(&dev));
        }
    }

    #[test]
    fn test_power_alone_is_switch() {
        let dev = device(vec![power()]);
        assert!(!is_light(&dev));
        assert!(is_switch(&dev));
        assert_eq!(entity_kinds(&dev), vec![EntityKind::Switch]);
    }

    #[test]
    fn test_light_features_without_power() {
        let dev = device(vec![Capability::new(CapabilityKind::Range, BRIGHTNESS)]);
        assert!(!is_light(&dev));
        assert!(!is_switch(&dev));
        assert!(entity_kinds(&dev).is_empty());
    }

    #[test]
    fn test_brightness_must_be_a_range() {
        let dev = device(vec![
            power(),
            Capability::new(CapabilityKind::Property, BRIGHTNESS),
        ]);
        assert!(is_switch(&dev));
    }

    #[test]
    fn test_sensor_entities() {
        let dev = device(vec![
            Capability::new(CapabilityKind::Property, "temperature"),
            Capability::new(CapabilityKind::Property, "battery"),
            Capability::new(CapabilityKind::Range, "humidity"),
            Capability::new(CapabilityKind::Event, "leak"),
            Capability::new(CapabilityKind::Property, "motion"),
        ]);

        let entities = sensor_entities(&dev);
        let instances: Vec<&str> = entities.iter().map(|e| e.instance.as_str()).collect();
        assert_eq!(instances, vec!["temperature", "humidity", "motion"]);
        assert_eq!(
            entities[0].descriptor,
            SensorDescriptor::Metric {
                device_class: SensorDeviceClass::Temperature,
                unit: "°C",
            }
        );
        assert_eq!(entities[2].kind(), EntityKind::BinarySensor);
    }

    #[test]
    fn test_light_with_sensors() {
        let dev = device(vec![
            power(),
            Capability::new(CapabilityKind::Range, BRIGHTNESS),
            Capability::new(CapabilityKind::Property, "temperature"),
            Capability::new(CapabilityKind::Property, "humidity"),
            Capability::new(CapabilityKind::Property, "contact"),
        ]);

        assert_eq!(
            entity_kinds(&dev),
            vec![
                EntityKind::Light,
                EntityKind::Sensor,
                EntityKind::BinarySensor
            ]
        );
    }
}
