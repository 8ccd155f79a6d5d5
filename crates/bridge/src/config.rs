//! Bridge configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPIFY_URL` - Shop base URL (e.g., `https://your-store.myshopify.com`)
//! - `SHOPIFY_API_ACCESS_TOKEN` - Admin API access token (HIGH PRIVILEGE)
//! - `SHOPIFY_LOCATION_ID` - Location used for inventory (numeric id or gid)
//! - `SHOPIFY_API_SECRET` - Shared secret expected in `X-Shopify-Token`
//!
//! ## Optional
//! - `HOST` - Bind address (default: 0.0.0.0)
//! - `PORT` - Listen port (default: 3000)
//! - `SHOPIFY_API_VERSION` - API version (default: 2021-10)
//! - `DOWNSTREAM_URL` - Order-management callback endpoint
//!   (default: `https://traderheavens.com/v3_foadmin/index.php`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Traces sample rate (default: 1.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_API_VERSION: &str = "2021-10";
const DEFAULT_DOWNSTREAM_URL: &str = "https://traderheavens.com/v3_foadmin/index.php";
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Bridge configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Shopify Admin API configuration
    pub shopify: ShopifyConfig,
    /// Order-management callback configuration
    pub downstream: DownstreamConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Shopify Admin API configuration.
///
/// Implements `Debug` manually to redact the access token and shared secret.
#[derive(Clone)]
pub struct ShopifyConfig {
    /// Shop base URL
    pub shop_url: Url,
    /// Shopify API version (e.g., 2021-10)
    pub api_version: String,
    /// Admin API access token (HIGH PRIVILEGE - full store access)
    pub access_token: SecretString,
    /// Location inventory is read from and written to
    pub location_id: String,
    /// Shared secret inbound callers send in `X-Shopify-Token`
    pub api_secret: SecretString,
}

impl std::fmt::Debug for ShopifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyConfig")
            .field("shop_url", &self.shop_url.as_str())
            .field("api_version", &self.api_version)
            .field("access_token", &"[REDACTED]")
            .field("location_id", &self.location_id)
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

impl ShopifyConfig {
    /// The shop URL without a trailing slash, as reported downstream.
    #[must_use]
    pub fn shop(&self) -> &str {
        self.shop_url.as_str().trim_end_matches('/')
    }

    /// Admin API GraphQL endpoint.
    #[must_use]
    pub fn graphql_endpoint(&self) -> String {
        format!("{}/admin/api/{}/graphql.json", self.shop(), self.api_version)
    }

    fn from_env() -> Result<Self, ConfigError> {
        let api_secret = get_required_env("SHOPIFY_API_SECRET")?;
        if let Err(e) = validate_secret_strength(&api_secret, "SHOPIFY_API_SECRET") {
            tracing::warn!("SHOPIFY_API_SECRET validation warning: {e}");
        }

        let location_id = get_required_env("SHOPIFY_LOCATION_ID")?;
        if location_id.trim().is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "SHOPIFY_LOCATION_ID".to_string(),
                "must not be empty".to_string(),
            ));
        }

        Ok(Self {
            shop_url: get_url("SHOPIFY_URL", None)?,
            api_version: get_env_or_default("SHOPIFY_API_VERSION", DEFAULT_API_VERSION),
            access_token: get_required_secret("SHOPIFY_API_ACCESS_TOKEN")?,
            location_id: location_id.trim().to_string(),
            api_secret: SecretString::from(api_secret),
        })
    }
}

/// Order-management callback configuration.
#[derive(Debug, Clone)]
pub struct DownstreamConfig {
    /// Endpoint notifications are posted to; `route` and `cron` are added as
    /// query parameters.
    pub base_url: Url,
}

impl DownstreamConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: get_url("DOWNSTREAM_URL", Some(DEFAULT_DOWNSTREAM_URL))?,
        })
    }
}

impl BridgeConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("HOST", "0.0.0.0")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORT".to_string(), e.to_string()))?;

        let shopify = ShopifyConfig::from_env()?;
        let downstream = DownstreamConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            host,
            port,
            shopify,
            downstream,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get an environment variable that must be an absolute URL.
fn get_url(key: &str, default: Option<&str>) -> Result<Url, ConfigError> {
    let value = match default {
        Some(default) => get_env_or_default(key, default),
        None => get_required_env(key)?,
    };
    parse_url(key, &value)
}

fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected an http(s) URL, got {value}"),
        ));
    }

    Ok(url)
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn shopify_config(shop_url: &str) -> ShopifyConfig {
        ShopifyConfig {
            shop_url: Url::parse(shop_url).unwrap(),
            api_version: DEFAULT_API_VERSION.to_string(),
            access_token: SecretString::from("shpat_super_secret_token"),
            location_id: "61234".to_string(),
            api_secret: SecretString::from("super_secret_shared_value"),
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("changeme123", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        assert!(validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR").is_ok());
    }

    #[test]
    fn test_graphql_endpoint_strips_trailing_slash() {
        let config = shopify_config("https://inflyshop.myshopify.com/");
        assert_eq!(config.shop(), "https://inflyshop.myshopify.com");
        assert_eq!(
            config.graphql_endpoint(),
            "https://inflyshop.myshopify.com/admin/api/2021-10/graphql.json"
        );
    }

    #[test]
    fn test_parse_url_rejects_non_http() {
        assert!(parse_url("DOWNSTREAM_URL", "https://traderheavens.com/index.php").is_ok());
        assert!(matches!(
            parse_url("DOWNSTREAM_URL", "mailto:ops@example.com"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
        assert!(matches!(
            parse_url("SHOPIFY_URL", "inflyshop.myshopify.com"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
    }

    #[test]
    fn test_default_downstream_url_is_valid() {
        let url = parse_url("DOWNSTREAM_URL", DEFAULT_DOWNSTREAM_URL).unwrap();
        assert_eq!(url.path(), "/v3_foadmin/index.php");
    }

    #[test]
    fn test_socket_addr() {
        let config = BridgeConfig {
            host: "0.0.0.0".parse().unwrap(),
            port: 3000,
            shopify: shopify_config("https://inflyshop.myshopify.com"),
            downstream: DownstreamConfig {
                base_url: Url::parse(DEFAULT_DOWNSTREAM_URL).unwrap(),
            },
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "0.0.0.0");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_shopify_config_debug_redacts_secrets() {
        let debug_output = format!("{:?}", shopify_config("https://inflyshop.myshopify.com"));

        assert!(debug_output.contains("inflyshop.myshopify.com"));
        assert!(debug_output.contains("61234"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("shpat_super_secret_token"));
        assert!(!debug_output.contains("super_secret_shared_value"));
    }
}
