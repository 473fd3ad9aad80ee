pub mod api;
pub mod config;
pub mod engine;
pub mod govee;
pub mod hass;
pub mod mqtt;

pub use config::Args;
pub use config::Config;
pub use config::ConfigError;
pub use config::LogLevel;
pub use engine::BridgeState;
pub use engine::Engine;
pub use engine::EngineError;
pub use engine::RunMode;
pub use govee::ApiError;
pub use govee::GoveeApi;
pub use govee::GoveeApiClient;
pub use govee::GoveeConfig;
