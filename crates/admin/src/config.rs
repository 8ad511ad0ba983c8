//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `ADMIN_API_BASE_URL` - Order service base URL (default: `http://localhost:5001/api/v1`)
//! - `ADMIN_API_TIMEOUT_SECS` - Request timeout in seconds (default: 10)
//! - `ADMIN_PAGE_SIZE` - Orders per listing page (default: 10)
//! - `ADMIN_SEARCH_DEBOUNCE_MS` - Search debounce delay (default: 500)
//! - `ADMIN_CACHE_TTL_SECS` - Order cache lifetime (default: 300)
//! - `ADMIN_RECEIPT_DIR` - Directory receipts are saved into (default: `.`)
//! - `ADMIN_RECEIPT_SETTLE_MS` - Delay before rasterizing a receipt (default: 100)
//! - `ADMIN_TOKEN_FILE` - Persisted bearer token (default: `$HOME/.street-admin/token`)
//! - `ADMIN_APP_NAME` - Display name (default: `Women Street Admin`)
//! - `ADMIN_LOG_JSON` - Emit JSON logs when set to `true` or `1`
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Sentry error sample rate (default: 1.0)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_BASE_URL: &str = "http://localhost:5001/api/v1";
const DEFAULT_APP_NAME: &str = "Women Street Admin";
const TOKEN_DIR: &str = ".street-admin";
const FALLBACK_TOKEN_FILE: &str = ".street-admin-token";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Order service connection settings
    pub api: ApiConfig,
    /// Orders per listing page
    pub page_size: u32,
    /// Quiet period before a search term is applied
    pub search_debounce: Duration,
    /// Lifetime of cached listings and records
    pub cache_ttl: Duration,
    /// Receipt generation settings
    pub receipt: ReceiptConfig,
    /// Where the bearer token is persisted between runs
    pub token_file: PathBuf,
    /// Display name
    pub app_name: String,
    /// Emit JSON-formatted logs
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
}

/// Order service connection settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL, e.g. `https://api.example.com/api/v1`
    pub base_url: Url,
    /// Applied to every request; an expired request counts as failed
    pub timeout: Duration,
}

impl ApiConfig {
    /// Settings pointing at `base_url` with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `base_url` is not an absolute URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            timeout: Duration::from_secs(10),
        })
    }
}

/// Receipt generation settings.
#[derive(Debug, Clone)]
pub struct ReceiptConfig {
    /// Directory receipts are written into
    pub output_dir: PathBuf,
    /// Wait before capture so layout has settled
    pub settle_delay: Duration,
}

impl Default for ReceiptConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            settle_delay: Duration::from_millis(100),
        }
    }
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_vars<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(get);

        let base_url = parse_base_url(&vars.or_default("ADMIN_API_BASE_URL", DEFAULT_API_BASE_URL))?;
        let timeout = Duration::from_secs(vars.parsed("ADMIN_API_TIMEOUT_SECS", 10)?);
        let page_size: u32 = vars.parsed("ADMIN_PAGE_SIZE", 10)?;
        if page_size == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "ADMIN_PAGE_SIZE".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let search_debounce = Duration::from_millis(vars.parsed("ADMIN_SEARCH_DEBOUNCE_MS", 500)?);
        let cache_ttl = Duration::from_secs(vars.parsed("ADMIN_CACHE_TTL_SECS", 300)?);
        let receipt = ReceiptConfig {
            output_dir: PathBuf::from(vars.or_default("ADMIN_RECEIPT_DIR", ".")),
            settle_delay: Duration::from_millis(vars.parsed("ADMIN_RECEIPT_SETTLE_MS", 100)?),
        };
        let token_file = vars
            .optional("ADMIN_TOKEN_FILE")
            .map_or_else(|| default_token_file(vars.optional("HOME")), PathBuf::from);
        let app_name = vars.or_default("ADMIN_APP_NAME", DEFAULT_APP_NAME);
        let log_json = vars
            .optional("ADMIN_LOG_JSON")
            .is_some_and(|v| matches!(v.trim(), "1" | "true" | "TRUE" | "yes"));
        let sentry_dsn = vars.optional("SENTRY_DSN").filter(|dsn| !dsn.is_empty());
        let sentry_environment = vars.optional("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = vars
            .optional("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            api: ApiConfig { base_url, timeout },
            page_size,
            search_debounce,
            cache_ttl,
            receipt,
            token_file,
            app_name,
            log_json,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable lookup wrapper shared by the loaders.
struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional variable.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable, falling back to `default` when absent.
    fn parsed<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }
}

/// Parse and validate the order service base URL.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_API_BASE_URL".to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "ADMIN_API_BASE_URL".to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

/// `$HOME/.street-admin/token`, or a file in the working directory without `HOME`.
fn default_token_file(home: Option<String>) -> PathBuf {
    home.map_or_else(
        || PathBuf::from(FALLBACK_TOKEN_FILE),
        |home| PathBuf::from(home).join(TOKEN_DIR).join("token"),
    )
}
