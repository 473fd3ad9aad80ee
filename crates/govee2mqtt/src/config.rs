//! Command-line and environment configuration.
//!
//! Every option can be given as a flag or through its environment variable.
//! `Args` is the raw clap surface; `Config::from_args` validates it into the
//! settings the bridge runs with.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use clap::ValueEnum;
use tracing_subscriber::filter::LevelFilter;

use crate::govee::GoveeConfig;
use crate::govee::DEFAULT_API_BASE_URL;
use crate::mqtt::MqttConfig;
use crate::mqtt::DEFAULT_BASE_TOPIC;
use crate::mqtt::DEFAULT_DISCOVERY_PREFIX;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "govee2mqtt")]
#[command(about = "Bridge Govee cloud devices to MQTT and Home Assistant")]
#[command(version)]
pub struct Args {
    /// Govee Platform API key
    #[arg(long, env = "GOVEE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Govee Platform API base URL
    #[arg(long, env = "GOVEE_API_BASE_URL", default_value = DEFAULT_API_BASE_URL)]
    pub api_base_url: String,

    /// Timeout for a single API request, in seconds
    #[arg(long, env = "GOVEE_API_TIMEOUT_SECONDS", default_value_t = 10)]
    pub api_timeout_seconds: u64,

    /// Attempts per API request while rate limited
    #[arg(long, env = "GOVEE_API_MAX_RETRIES", default_value_t = 5)]
    pub api_max_retries: u32,

    /// MQTT broker hostname (required unless --dry-run)
    #[arg(long, env = "MQTT_HOST")]
    pub mqtt_host: Option<String>,

    #[arg(long, env = "MQTT_PORT", default_value_t = 1883)]
    pub mqtt_port: u16,

    #[arg(long, env = "MQTT_USERNAME")]
    pub mqtt_username: Option<String>,

    #[arg(long, env = "MQTT_PASSWORD", hide_env_values = true)]
    pub mqtt_password: Option<String>,

    #[arg(long, env = "MQTT_CLIENT_ID", default_value = "govee2mqtt")]
    pub mqtt_client_id: String,

    /// Prefix for state and command topics
    #[arg(long, env = "MQTT_BASE_TOPIC", default_value = DEFAULT_BASE_TOPIC)]
    pub mqtt_base_topic: String,

    /// Home Assistant discovery prefix
    #[arg(long, env = "MQTT_DISCOVERY_PREFIX", default_value = DEFAULT_DISCOVERY_PREFIX)]
    pub discovery_prefix: String,

    /// Time for one full pass over all devices, in seconds
    #[arg(long, env = "POLL_INTERVAL_SECONDS", default_value_t = 120)]
    pub poll_interval_seconds: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", value_enum, ignore_case = true, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Serve the local HTTP API on this address, e.g. 127.0.0.1:8565
    #[arg(long, env = "GOVEE_HTTP_LISTEN")]
    pub http_listen: Option<SocketAddr>,

    /// Log a failed poll pass and keep running instead of exiting
    #[arg(long, env = "GOVEE_CONTINUE_ON_ERROR")]
    pub continue_on_error: bool,

    /// Print discovered devices and exit without connecting to MQTT
    #[arg(long)]
    pub dry_run: bool,

    /// Poll every device once and exit
    #[arg(long)]
    pub once: bool,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("GOVEE_API_KEY is required")]
    MissingApiKey,

    #[error("MQTT_HOST is required when not in --dry-run mode")]
    MissingMqttHost,

    #[error("POLL_INTERVAL_SECONDS must be at least 1")]
    InvalidPollInterval,

    #[error("GOVEE_API_MAX_RETRIES must be at least 1")]
    InvalidMaxRetries,
}

/// Validated settings
#[derive(Debug, Clone)]
pub struct Config {
    pub govee: GoveeConfig,

    /// Broker settings; only absent in dry-run mode
    pub mqtt: Option<MqttConfig>,

    pub poll_interval: Duration,
    pub log_level: LogLevel,
    pub http_listen: Option<SocketAddr>,
    pub continue_on_error: bool,
    pub dry_run: bool,
    pub once: bool,
}

/// Treat empty strings as unset.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn from_args(args: Args) -> Result<Self, ConfigError> {
        let api_key = non_empty(args.api_key).ok_or(ConfigError::MissingApiKey)?;

        if args.poll_interval_seconds == 0 {
            return Err(ConfigError::InvalidPollInterval);
        }
        if args.api_max_retries == 0 {
            return Err(ConfigError::InvalidMaxRetries);
        }

        let mqtt = match non_empty(args.mqtt_host) {
            Some(host) => Some(MqttConfig {
                host,
                port: args.mqtt_port,
                client_id: args.mqtt_client_id,
                username: non_empty(args.mqtt_username),
                password: args.mqtt_password,
                base_topic: args.mqtt_base_topic,
                discovery_prefix: args.discovery_prefix,
            }),
            None if args.dry_run => None,
            None => return Err(ConfigError::MissingMqttHost),
        };

        Ok(Self {
            govee: GoveeConfig {
                api_key,
                base_url: args.api_base_url,
                timeout: Duration::from_secs(args.api_timeout_seconds),
                max_retries: args.api_max_retries,
            },
            mqtt,
            poll_interval: Duration::from_secs(args.poll_interval_seconds),
            log_level: args.log_level,
            http_listen: args.http_listen,
            continue_on_error: args.continue_on_error,
            dry_run: args.dry_run,
            once: args.once,
        })
    }
}
