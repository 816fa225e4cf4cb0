//! Client configuration with environment overrides.

use std::time::Duration;

use thiserror::Error;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://app.simplelogin.io";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Server page size for every paginated list.
pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const DEFAULT_DEVICE_NAME: &str = "SimpleLogin Rust";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid base url {value:?}: {source}")]
    InvalidBaseUrl {
        value: String,
        source: url::ParseError,
    },

    #[error("invalid timeout {0:?}, expected whole seconds")]
    InvalidTimeout(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: Url,
    pub timeout: Duration,
    /// Expected page length; a shorter page ends pagination.
    pub page_size: usize,
    /// Fetch the next page once the rendered record is this close to the end.
    pub prefetch_distance: usize,
    /// Sent as `device` on login and MFA.
    pub device_name: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("DEFAULT_BASE_URL is a valid url"),
            timeout: DEFAULT_TIMEOUT,
            page_size: DEFAULT_PAGE_SIZE,
            prefetch_distance: 1,
            device_name: DEFAULT_DEVICE_NAME.to_string(),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `SIMPLELOGIN_BASE_URL`,
    /// `SIMPLELOGIN_TIMEOUT_SECS` and `SIMPLELOGIN_DEVICE_NAME`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup("SIMPLELOGIN_BASE_URL") {
            config.base_url = Url::parse(&value)
                .map_err(|source| ConfigError::InvalidBaseUrl { value, source })?;
        }
        if let Some(value) = lookup("SIMPLELOGIN_TIMEOUT_SECS") {
            let secs: u64 = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidTimeout(value.clone()))?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(value) = lookup("SIMPLELOGIN_DEVICE_NAME") {
            config.device_name = value;
        }

        Ok(config)
    }
}
