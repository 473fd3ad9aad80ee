#[allow(clippy::module_inception)]
mod engine;
mod message;
pub mod state;

pub use engine::CommandError;
pub use engine::Engine;
pub use engine::EngineError;
pub use engine::PassOutcome;
pub use engine::RunMode;
pub use engine::DEFAULT_POLL_INTERVAL;
pub use message::command_channel;
pub use message::CommandReceiver;
pub use message::CommandSender;
pub use message::QueuedCommand;
pub use state::BridgeState;
pub use state::DeviceStatus;
