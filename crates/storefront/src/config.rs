//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `THRYFT_BASE_URL` - Public URL for the storefront (OAuth redirects are built from it)
//! - `SUPABASE_URL` - Hosted backend project URL (e.g., <https://abc.supabase.co>)
//! - `SUPABASE_ANON_KEY` - Hosted backend anon (publishable) API key
//!
//! ## Optional
//! - `THRYFT_HOST` - Bind address (default: 127.0.0.1)
//! - `THRYFT_PORT` - Listen port (default: 3000)
//! - `SUPABASE_STORAGE_BUCKET` - Bucket for listing photos (default: product-images)
//! - `CATALOG_CACHE_TTL_SECS` - Product cache time-to-live (default: 60)
//! - `RAZORPAY_KEY_ID` - Payment widget key ID (checkout disabled if unset)
//! - `RAZORPAY_KEY_SECRET` - Payment signature secret (signatures not verified if unset)
//! - `GEOCODING_URL` - Reverse geocoding endpoint (default: Nominatim)
//! - `GEOCODING_USER_AGENT` - User agent sent to the geocoder (default: thryft-storefront)
//! - `ADMIN_EMAILS` - Comma-separated emails allowed into `/admin`
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
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

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Hosted backend configuration
    pub backend: BackendConfig,
    /// Payment widget configuration
    pub payments: PaymentConfig,
    /// Reverse geocoding configuration
    pub geocoding: GeocodingConfig,
    /// Emails allowed to use the admin dashboard
    pub admin_emails: Vec<String>,
    /// Sentry configuration
    pub sentry: SentryConfig,
}

/// Hosted backend (auth, REST data API, object storage) configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct BackendConfig {
    /// Project base URL, without trailing slash
    pub url: String,
    /// Anon API key, sent as `apikey` on every request
    pub anon_key: SecretString,
    /// Storage bucket for listing photos
    pub storage_bucket: String,
    /// How long product reads stay cached
    pub cache_ttl: Duration,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url)
            .field("anon_key", &"[REDACTED]")
            .field("storage_bucket", &self.storage_bucket)
            .field("cache_ttl", &self.cache_ttl)
            .finish()
    }
}

/// Payment widget configuration.
#[derive(Clone, Default)]
pub struct PaymentConfig {
    /// Public key ID handed to the browser widget
    pub key_id: Option<String>,
    /// Secret used to verify payment signatures
    pub key_secret: Option<SecretString>,
    /// Merchant name shown in the widget
    pub merchant_name: String,
}

impl std::fmt::Debug for PaymentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentConfig")
            .field("key_id", &self.key_id)
            .field("key_secret", &self.key_secret.as_ref().map(|_| "[REDACTED]"))
            .field("merchant_name", &self.merchant_name)
            .finish()
    }
}

/// Reverse geocoding configuration.
#[derive(Debug, Clone)]
pub struct GeocodingConfig {
    /// Reverse lookup endpoint (Nominatim-compatible)
    pub url: String,
    /// User agent sent with lookups
    pub user_agent: String,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            url: "https://nominatim.openstreetmap.org/reverse".to_string(),
            user_agent: "thryft-storefront".to_string(),
        }
    }
}

/// Sentry error tracking configuration.
#[derive(Debug, Clone, Default)]
pub struct SentryConfig {
    pub dsn: Option<String>,
    pub environment: Option<String>,
    pub sample_rate: f32,
    pub traces_sample_rate: f32,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("THRYFT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("THRYFT_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("THRYFT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("THRYFT_PORT".to_string(), e.to_string()))?;
        let base_url = trim_trailing_slash(get_required_env("THRYFT_BASE_URL")?);

        Ok(Self {
            host,
            port,
            base_url,
            backend: BackendConfig::from_env()?,
            payments: PaymentConfig::from_env()?,
            geocoding: GeocodingConfig::from_env(),
            admin_emails: parse_list(&get_env_or_default("ADMIN_EMAILS", "")),
            sentry: SentryConfig::from_env()?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the storefront is served over HTTPS (secure cookies).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Whether `email` may use the admin dashboard.
    #[must_use]
    pub fn is_admin_email(&self, email: &str) -> bool {
        self.admin_emails
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(email.trim()))
    }
}

impl BackendConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let ttl_secs = get_env_or_default("CATALOG_CACHE_TTL_SECS", "60")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("CATALOG_CACHE_TTL_SECS".to_string(), e.to_string())
            })?;

        Ok(Self {
            url: trim_trailing_slash(get_required_env("SUPABASE_URL")?),
            anon_key: get_required_secret("SUPABASE_ANON_KEY")?,
            storage_bucket: get_env_or_default("SUPABASE_STORAGE_BUCKET", "product-images"),
            cache_ttl: Duration::from_secs(ttl_secs),
        })
    }
}

impl PaymentConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let key_secret = match get_optional_env("RAZORPAY_KEY_SECRET") {
            Some(_) => Some(get_validated_secret("RAZORPAY_KEY_SECRET")?),
            None => None,
        };

        Ok(Self {
            key_id: get_optional_env("RAZORPAY_KEY_ID").filter(|k| !k.trim().is_empty()),
            key_secret,
            merchant_name: get_env_or_default("THRYFT_MERCHANT_NAME", "Thryft"),
        })
    }
}

impl GeocodingConfig {
    fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: get_optional_env("GEOCODING_URL").unwrap_or(defaults.url),
            user_agent: get_optional_env("GEOCODING_USER_AGENT").unwrap_or(defaults.user_agent),
        }
    }
}

impl SentryConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            dsn: get_optional_env("SENTRY_DSN"),
            environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sample_rate: parse_rate("SENTRY_SAMPLE_RATE", "1.0")?,
            traces_sample_rate: parse_rate("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
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

fn trim_trailing_slash(mut value: String) -> String {
    while value.ends_with('/') {
        value.pop();
    }
    value
}

/// Split a comma-separated list, dropping blanks.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Parse a sample rate in `[0.0, 1.0]`.
fn parse_rate(key: &str, default: &str) -> Result<f32, ConfigError> {
    let rate = get_env_or_default(key, default)
        .parse::<f32>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be between 0.0 and 1.0 (got {rate})"),
        ))
    }
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
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the secret issued by the provider."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    pub(crate) fn test_config() -> StorefrontConfig {
        StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            backend: BackendConfig {
                url: "http://127.0.0.1:9".to_string(),
                anon_key: SecretString::from("anon"),
                storage_bucket: "product-images".to_string(),
                cache_ttl: Duration::from_secs(60),
            },
            payments: PaymentConfig::default(),
            geocoding: GeocodingConfig::default(),
            admin_emails: vec!["admin@thryft.in".to_string()],
            sentry: SentryConfig::default(),
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
        let result = validate_secret_strength("your-razorpay-secret", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(
            parse_list(" Admin@Thryft.in, ,ops@thryft.in "),
            vec!["admin@thryft.in".to_string(), "ops@thryft.in".to_string()]
        );
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn test_trim_trailing_slash() {
        assert_eq!(
            trim_trailing_slash("https://abc.supabase.co//".to_string()),
            "https://abc.supabase.co"
        );
    }

    #[test]
    fn test_is_admin_email() {
        let config = test_config();
        assert!(config.is_admin_email("ADMIN@thryft.in"));
        assert!(!config.is_admin_email("buyer@thryft.in"));
    }

    #[test]
    fn test_socket_addr() {
        let config = test_config();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
        assert!(!config.is_secure());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut config = test_config();
        config.backend.anon_key = SecretString::from("super_secret_anon_key");
        config.payments = PaymentConfig {
            key_id: Some("rzp_test_public".to_string()),
            key_secret: Some(SecretString::from("super_secret_payment_key")),
            merchant_name: "Thryft".to_string(),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("rzp_test_public"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_anon_key"));
        assert!(!debug_output.contains("super_secret_payment_key"));
    }
}
