//! Configuration module
//!
//! Environment-driven settings for the ingestion service: storage provider
//! credentials, validation limits, pipeline deadlines and placeholder options.

use std::env;
use std::time::Duration;

use crate::error::AppError;

const DEFAULT_PORT: u16 = 4000;
const MAX_FILE_SIZE_MB: usize = 10;
const PIPELINE_DEADLINE_SECS: u64 = 60;
const DERIVE_TIMEOUT_MS: u64 = 8000;
const PLACEHOLDER_WIDTH: u32 = 5;
const DEFAULT_API_BASE: &str = "https://api.cloudflare.com/client/v4";
const DEFAULT_SOURCE_TAG: &str = "kyte";
const DEFAULT_CONTENT_TYPES: &str = "image/jpeg,image/png,image/gif,image/webp";

/// Credentials for the image storage provider.
///
/// `Debug` is implemented by hand so the token never reaches logs.
#[derive(Clone)]
pub struct ProviderCredentials {
    pub account_id: String,
    pub api_token: String,
    pub api_base: String,
}

impl ProviderCredentials {
    pub fn new(
        account_id: impl Into<String>,
        api_token: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            api_token: api_token.into(),
            api_base: api_base.into(),
        }
    }

    /// Name of the first blank credential variable, if any.
    pub fn missing_variable(&self) -> Option<&'static str> {
        if self.account_id.trim().is_empty() {
            Some("CLOUDFLARE_ACCOUNT")
        } else if self.api_token.trim().is_empty() {
            Some("CLOUDFLARE_TOKEN")
        } else {
            None
        }
    }

    /// Fails with `ConfigMissing` when either credential is empty.
    pub fn ensure_present(&self) -> Result<(), AppError> {
        match self.missing_variable() {
            Some(var) => Err(AppError::ConfigMissing(var.to_string())),
            None => Ok(()),
        }
    }

    /// Short account prefix that is safe to log.
    pub fn account_hint(&self) -> &str {
        let end = self
            .account_id
            .char_indices()
            .nth(8)
            .map(|(i, _)| i)
            .unwrap_or(self.account_id.len());
        &self.account_id[..end]
    }
}

impl std::fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("account_id", &self.account_hint())
            .field("api_token", &"<redacted>")
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub log_format: String,
    pub credentials: ProviderCredentials,
    pub require_signed_urls: bool,
    pub source_tag: String,
    pub max_file_size_bytes: usize,
    pub allowed_content_types: Vec<String>,
    pub pipeline_deadline: Duration,
    pub derive_timeout: Duration,
    /// Remote derivation endpoint. `None` runs placeholder generation in-process.
    pub placeholder_endpoint: Option<String>,
    pub placeholder_width: u32,
    pub placeholder_source_allowlist: Option<Vec<String>>,
    /// Lets the placeholder route fetch from private addresses (local development only).
    pub placeholder_allow_private_sources: bool,
    pub max_concurrent_uploads: Option<usize>,
}

impl Config {
    /// Load configuration from the process environment (and `.env` if present).
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let credentials = ProviderCredentials::new(
            get("CLOUDFLARE_ACCOUNT").unwrap_or_default(),
            get("CLOUDFLARE_TOKEN").unwrap_or_default(),
            get("CLOUDFLARE_API_BASE")
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
        );
        credentials.ensure_present()?;

        let environment = get("ENVIRONMENT")
            .or_else(|| get("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let server_port = match get("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| AppError::InvalidInput("PORT must be a valid number".to_string()))?,
            None => DEFAULT_PORT,
        };

        let cors_origins = get("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_file_size_mb = get("MAX_FILE_SIZE_MB")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(MAX_FILE_SIZE_MB);
        let max_file_size_bytes = max_file_size_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| AppError::InvalidInput("MAX_FILE_SIZE_MB is too large".to_string()))?;

        let allowed_content_types = get("ALLOWED_CONTENT_TYPES")
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPES.to_string())
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        let placeholder_source_allowlist = get("PLACEHOLDER_SOURCE_ALLOWLIST").map(|s| {
            s.split(',')
                .map(|d| d.trim().to_lowercase())
                .filter(|d| !d.is_empty())
                .collect::<Vec<_>>()
        });

        Ok(Self {
            server_port,
            environment,
            cors_origins,
            log_format: get("LOG_FORMAT").unwrap_or_else(|| "pretty".to_string()),
            credentials,
            require_signed_urls: get("CLOUDFLARE_REQUIRE_SIGNED_URLS")
                .map(|s| parse_flag(&s))
                .unwrap_or(false),
            source_tag: get("UPLOAD_SOURCE_TAG").unwrap_or_else(|| DEFAULT_SOURCE_TAG.to_string()),
            max_file_size_bytes,
            allowed_content_types,
            pipeline_deadline: Duration::from_secs(
                get("PIPELINE_DEADLINE_SECS")
                    .and_then(|s| s.trim().parse().ok())
                    .unwrap_or(PIPELINE_DEADLINE_SECS),
            ),
            derive_timeout: Duration::from_millis(
                get("DERIVE_TIMEOUT_MS")
                    .and_then(|s| s.trim().parse().ok())
                    .unwrap_or(DERIVE_TIMEOUT_MS),
            ),
            placeholder_endpoint: get("PLACEHOLDER_ENDPOINT").map(|s| s.trim().to_string()),
            placeholder_width: get("PLACEHOLDER_WIDTH")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(PLACEHOLDER_WIDTH),
            placeholder_source_allowlist,
            placeholder_allow_private_sources: get("PLACEHOLDER_ALLOW_PRIVATE_SOURCES")
                .map(|s| parse_flag(&s))
                .unwrap_or(false),
            max_concurrent_uploads: get("MAX_CONCURRENT_UPLOADS")
                .and_then(|s| s.trim().parse().ok())
                .filter(|n: &usize| *n > 0),
        })
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than 0"));
        }

        if self.allowed_content_types.is_empty() {
            return Err(anyhow::anyhow!(
                "ALLOWED_CONTENT_TYPES must list at least one media type"
            ));
        }

        if self.pipeline_deadline.is_zero() {
            return Err(anyhow::anyhow!("PIPELINE_DEADLINE_SECS must be greater than 0"));
        }

        if self.derive_timeout.is_zero() {
            return Err(anyhow::anyhow!("DERIVE_TIMEOUT_MS must be greater than 0"));
        }

        if self.placeholder_width == 0 {
            return Err(anyhow::anyhow!("PLACEHOLDER_WIDTH must be greater than 0"));
        }

        if self.is_production() && self.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        if self.is_production() && self.placeholder_allow_private_sources {
            return Err(anyhow::anyhow!(
                "PLACEHOLDER_ALLOW_PRIVATE_SOURCES cannot be enabled in production"
            ));
        }

        if let Some(endpoint) = &self.placeholder_endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(anyhow::anyhow!(
                    "PLACEHOLDER_ENDPOINT must be an http(s) URL"
                ));
            }
        }

        Ok(())
    }

    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}
