//! API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use c4_core::{PaywayConfig, DEFAULT_CURRENCY, DEFAULT_ORDER_PREFIX};
use c4_db::DbConfig;

/// Placeholder merchant id shipped as the default.
const PLACEHOLDER_MERCHANT_ID: &str = "YOUR_MERCHANT_ID";

/// Placeholder API key shipped as the default.
const PLACEHOLDER_API_KEY: &str = "YOUR_API_KEY";

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Interface to bind
    pub bind_addr: String,

    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub db_path: PathBuf,

    /// Pool upper bound
    pub db_max_connections: u32,

    /// Prefix for generated order ids
    pub order_prefix: String,

    /// ABA PayWay credentials and redirect URLs.
    ///
    /// Defaults to placeholders (including localhost redirect URLs) so the
    /// server boots without them; checkout requests then fail with a
    /// configuration error instead of signing.
    pub payway: PaywayConfig,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let currency = var_or("C4_CURRENCY", DEFAULT_CURRENCY);

        let config = ApiConfig {
            bind_addr: var_or("C4_BIND_ADDR", "0.0.0.0"),

            port: parse_var("C4_PORT", "8000")?,

            db_path: PathBuf::from(var_or("C4_DB_PATH", "./c4.db")),

            db_max_connections: parse_var("C4_DB_MAX_CONNECTIONS", "5")?,

            order_prefix: var_or("C4_ORDER_PREFIX", DEFAULT_ORDER_PREFIX),

            payway: PaywayConfig {
                merchant_id: var_or("ABA_PAYWAY_MERCHANT_ID", PLACEHOLDER_MERCHANT_ID),
                api_key: var_or("ABA_PAYWAY_API_KEY", PLACEHOLDER_API_KEY),
                checkout_url: var_or(
                    "ABA_PAYWAY_CHECKOUT_URL",
                    "https://checkout-sandbox.payway.com.kh/api/payment-gateway/v1/payments/purchase",
                ),
                return_url: var_or("ABA_PAYWAY_RETURN_URL", "http://localhost:8000/payment/success"),
                cancel_url: var_or("ABA_PAYWAY_CANCEL_URL", "http://localhost:8000/payment/cancel"),
                currency,
            },
        };

        if config.order_prefix.trim().is_empty() {
            return Err(ConfigError::MissingRequired("C4_ORDER_PREFIX".to_string()));
        }
        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("C4_DB_MAX_CONNECTIONS".to_string()));
        }

        Ok(config)
    }

    /// Socket address string for the listener.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    /// Database settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.db_path)
            .max_connections(self.db_max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .order_prefix(&self.order_prefix)
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_var<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError> {
    var_or(key, default)
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(key.to_string()))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_var_default() {
        let port: u16 = parse_var("C4_TEST_UNSET_PORT", "8123").unwrap();
        assert_eq!(port, 8123);
    }

    #[test]
    fn test_parse_var_invalid() {
        let err = parse_var::<u16>("C4_TEST_UNSET_PORT", "not-a-port").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref k) if k == "C4_TEST_UNSET_PORT"));
    }

    #[test]
    fn test_placeholder_credentials_refused_by_signer() {
        let payway = PaywayConfig {
            merchant_id: PLACEHOLDER_MERCHANT_ID.to_string(),
            api_key: PLACEHOLDER_API_KEY.to_string(),
            checkout_url: "https://gateway.example".to_string(),
            return_url: "https://shop.example/ok".to_string(),
            cancel_url: "https://shop.example/cancel".to_string(),
            ..Default::default()
        };
        assert!(payway.validate().is_err());
    }

    #[test]
    fn test_default_redirects_refused_by_signer() {
        let payway = PaywayConfig {
            merchant_id: "M-1".to_string(),
            api_key: "live-key".to_string(),
            checkout_url: "https://gateway.example".to_string(),
            return_url: "http://localhost:8000/payment/success".to_string(),
            cancel_url: "http://localhost:8000/payment/cancel".to_string(),
            ..Default::default()
        };
        let err = payway.validate().unwrap_err();
        assert!(err.to_string().contains("return URL"));
    }
}
