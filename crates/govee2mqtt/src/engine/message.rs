//! Command queue between the inbound listeners and the poll loop.
//!
//! The MQTT event loop task (and the local HTTP API, when enabled) push
//! `QueuedCommand`s; the engine is the only consumer.

use tokio::sync::mpsc;

/// An inbound command, exactly as received from the bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedCommand {
    /// Slug of the target device (second topic segment)
    pub device_slug: String,

    /// Entity segment of the topic, e.g. "light" or "switch"
    pub entity_kind: String,

    /// Undecoded payload text
    pub raw_payload: String,
}

pub type CommandSender = mpsc::UnboundedSender<QueuedCommand>;
pub type CommandReceiver = mpsc::UnboundedReceiver<QueuedCommand>;

/// Create the unbounded FIFO command queue
pub fn command_channel() -> (CommandSender, CommandReceiver) {
    mpsc::unbounded_channel()
}
