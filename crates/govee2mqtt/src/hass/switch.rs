use super::Power;
use super::POWER_SWITCH;
use crate::govee::model::find_capability;
use crate::govee::CapabilityCommand;
use crate::govee::CapabilityKind;
use crate::govee::DeviceState;

/// Power state for `{base}/{slug}/switch/state`, or `None` when the snapshot
/// has no power capability and nothing should be published.
pub fn switch_state(state: &DeviceState) -> Option<Power> {
    find_capability(
        &state.capabilities,
        &CapabilityKind::OnOff,
        Some(POWER_SWITCH),
    )
    .map(|cap| Power::from_value(cap.value()))
}

/// Decode a plain-text switch command.
pub fn decode_command(payload: &str) -> Vec<CapabilityCommand> {
    vec![CapabilityCommand::new(
        CapabilityKind::OnOff,
        POWER_SWITCH,
        Power::from_command(payload).capability_value(),
    )]
}
