use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderName;
use reqwest::header::HeaderValue;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use tracing::warn;

use super::backoff::next_delay;
use super::backoff::retry_after;
use super::model::parse_device_list;
use super::model::parse_device_state;
use super::model::CapabilityCommand;
use super::model::Device;
use super::model::DeviceState;

/// Default Govee Platform API endpoint
pub const DEFAULT_API_BASE_URL: &str = "https://openapi.api.govee.com/router/api/v1";

/// Header carrying the account API key (`Govee-API-Key`)
const API_KEY_HEADER: HeaderName = HeaderName::from_static("govee-api-key");

/// Settings for the upstream API client
#[derive(Debug, Clone)]
pub struct GoveeConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
    pub max_retries: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Govee API rate limit still exceeded after {attempts} attempts")]
    RateLimitExceeded { attempts: u32 },

    #[error("Govee API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to decode Govee API response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid API key: {0}")]
    InvalidApiKey(#[from] reqwest::header::InvalidHeaderValue),
}

/// Upstream operations used by the bridge.
///
/// This trait allows the poll loop to be driven by an in-memory API in tests.
#[async_trait]
pub trait GoveeApi: Send + Sync {
    /// List all devices on the account
    async fn list_devices(&self) -> Result<Vec<Device>, ApiError>;

    /// Fetch the current state of a device
    async fn get_device_state(&self, device: &Device) -> Result<DeviceState, ApiError>;

    /// Write one capability value to a device
    async fn control_device(
        &self,
        device: &Device,
        command: &CapabilityCommand,
    ) -> Result<(), ApiError>;
}

#[derive(Serialize)]
struct DeviceRef<'a> {
    device: &'a str,
    sku: &'a str,
}

#[derive(Serialize)]
struct ControlRequest<'a> {
    device: &'a str,
    sku: &'a str,
    capability: &'a CapabilityCommand,
}

/// Govee Platform API client backed by reqwest.
///
/// Every request shares one retry policy: HTTP 429 responses are retried up
/// to `max_retries` times, waiting for the server's `Retry-After` or an
/// exponential backoff. Any other failure is returned immediately.
#[derive(Clone)]
pub struct GoveeApiClient {
    http: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

impl GoveeApiClient {
    pub fn new(config: &GoveeConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(&config.api_key)?;
        key.set_sensitive(true);
        headers.insert(API_KEY_HEADER, key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries.max(1),
        })
    }

    /// Issue a request, retrying on rate limiting, and return the raw body.
    async fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Vec<u8>, ApiError> {
        let url = format!("{}{}", self.base_url, path);

        for attempt in 1..=self.max_retries {
            let mut request = self.http.request(method.clone(), &url);
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request.send().await?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                if attempt == self.max_retries {
                    break;
                }
                let delay = next_delay(attempt, retry_after(response.headers()));
                warn!(
                    "Rate limited by Govee API on {} {}. Backing off for {:.1}s (attempt {}/{})",
                    method,
                    path,
                    delay.as_secs_f64(),
                    attempt,
                    self.max_retries
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(ApiError::Status {
                    status: status.as_u16(),
                    body,
                });
            }

            debug!("{} {} -> {}", method, path, status);
            return Ok(response.bytes().await?.to_vec());
        }

        Err(ApiError::RateLimitExceeded {
            attempts: self.max_retries,
        })
    }

    async fn request_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Value, ApiError> {
        let bytes = self.request(method, path, body).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl GoveeApi for GoveeApiClient {
    async fn list_devices(&self) -> Result<Vec<Device>, ApiError> {
        let body = self
            .request_json::<()>(Method::GET, "/user/devices", None)
            .await?;
        Ok(parse_device_list(&body)?)
    }

    async fn get_device_state(&self, device: &Device) -> Result<DeviceState, ApiError> {
        let request = DeviceRef {
            device: &device.device_id,
            sku: &device.sku,
        };
        let body = self
            .request_json(Method::POST, "/device/state", Some(&request))
            .await?;
        Ok(parse_device_state(&body)?)
    }

    async fn control_device(
        &self,
        device: &Device,
        command: &CapabilityCommand,
    ) -> Result<(), ApiError> {
        let request = ControlRequest {
            device: &device.device_id,
            sku: &device.sku,
            capability: command,
        };
        // A successful control call carries nothing we need.
        self.request(Method::POST, "/device/control", Some(&request))
            .await?;
        debug!(
            "Set {} {} on {} to {}",
            command.kind, command.instance, device.device_id, command.value
        );
        Ok(())
    }
}
