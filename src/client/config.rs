//! Configuration for the batch client.
//!
//! # Configuration Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `service_url` | empty | Web API base address, e.g. `https://org/api/data/` |
//! | `fallback_version` | 8.2 | Version used for the discovery call |
//! | `request_timeout_ms` | 120000 | Timeout of each physical request |
//! | `proxy_url` | empty | Proxy for all requests, empty for none |
//! | `enable_logging` | false | Log each physical request |
//! | `prefer` | formatted values | `Prefer` header of the batch call |
//! | `max_idle_connections` | 8 | Idle connections kept by the transport |
//!
//! # Examples
//!
//! ```
//! use odata_batch_http::client::ClientConfig;
//!
//! let config = ClientConfig {
//!     service_url: "https://org.example.com/api/data/".into(),
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! assert_eq!(config.request_timeout_ms, 120_000);
//! ```

use crate::error::{BatchError, Result};
use crate::protocol::constants::PREFER_FORMATTED_VALUES;
use crate::types::{ApiRoot, ApiVersion};
use serde::{Deserialize, Serialize};

/// Configuration for the batch client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Web API base address, without the version segment.
    pub service_url: String,

    /// Version used to address `RetrieveVersion` before the real one is known.
    pub fallback_version: ApiVersion,

    /// Request timeout in milliseconds.
    ///
    /// Applies to each physical request; a batch is one request, so a timeout
    /// aborts the whole batch.
    pub request_timeout_ms: u64,

    /// Proxy URL (optional).
    pub proxy_url: String,

    /// Enable request logging.
    ///
    /// When enabled, logs every physical request using the `tracing` crate.
    pub enable_logging: bool,

    /// `Prefer` header value sent with every batch.
    pub prefer: String,

    /// Maximum idle connections kept per host.
    pub max_idle_connections: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            service_url: String::new(),
            fallback_version: ApiVersion::FALLBACK,
            request_timeout_ms: 120_000,
            proxy_url: String::new(),
            enable_logging: false,
            prefer: PREFER_FORMATTED_VALUES.to_string(),
            max_idle_connections: 8,
        }
    }
}

impl ClientConfig {
    /// Configuration for a service url with every other option defaulted.
    pub fn new(service_url: impl Into<String>) -> Self {
        ClientConfig {
            service_url: service_url.into(),
            ..Default::default()
        }
    }

    /// Check that the configuration can address a service.
    pub fn validate(&self) -> Result<()> {
        if self.service_url.trim().is_empty() {
            return Err(BatchError::Config("service_url is empty".into()));
        }
        if self.request_timeout_ms == 0 {
            return Err(BatchError::Config("request_timeout_ms must be positive".into()));
        }
        self.api_root().map(|_| ())
    }

    /// The root used before version discovery.
    pub fn api_root(&self) -> Result<ApiRoot> {
        ApiRoot::new(&self.service_url, self.fallback_version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.fallback_version, ApiVersion::new(8, 2));
        assert_eq!(config.request_timeout_ms, 120_000);
        assert!(!config.enable_logging);
        assert!(config.prefer.contains("FormattedValue"));
    }

    #[test]
    fn test_empty_service_url_invalid() {
        let err = ClientConfig::default().validate().unwrap_err();
        assert!(matches!(err, BatchError::Config(_)));
    }

    #[test]
    fn test_relative_service_url_invalid() {
        assert!(ClientConfig::new("api/data/").validate().is_err());
    }

    #[test]
    fn test_zero_timeout_invalid() {
        let config = ClientConfig {
            request_timeout_ms: 0,
            ..ClientConfig::new("https://x/api/data/")
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_api_root_uses_fallback() {
        let root = ClientConfig::new("https://x/api/data").api_root().unwrap();
        assert_eq!(root.versioned_base(), "https://x/api/data/v8.2/");
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"service_url":"https://x/api/data/","enable_logging":true}"#)
                .unwrap();
        assert!(config.enable_logging);
        assert_eq!(config.request_timeout_ms, 120_000);
        assert_eq!(config.fallback_version, ApiVersion::FALLBACK);
    }
}
