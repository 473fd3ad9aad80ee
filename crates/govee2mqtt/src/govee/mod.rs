//! Client and data model for the Govee Platform API.

pub mod backoff;
mod client;
pub mod model;

pub use client::ApiError;
pub use client::GoveeApi;
pub use client::GoveeApiClient;
pub use client::GoveeConfig;
pub use client::DEFAULT_API_BASE_URL;
pub use model::Capability;
pub use model::CapabilityCommand;
pub use model::CapabilityKind;
pub use model::Device;
pub use model::DeviceState;
