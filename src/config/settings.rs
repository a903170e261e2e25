//! # Configuration Settings
//!
//! Defines the configuration structure for vaultline clients.

use crate::config::SecretString;
use crate::errors::{Error, Result};
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;
use validator::{Validate, ValidationError};

/// Prefix for vaultline-specific environment variables (`VAULTLINE__TRANSPORT__ADDRESS`).
pub const ENV_PREFIX: &str = "VAULTLINE";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Transport configuration for every client handle
    #[validate(nested)]
    pub transport: TransportConfig,

    /// Retry budget for reads that may race replication
    #[validate(nested)]
    pub read_retry: ReadRetryConfig,

    /// Logging and metrics configuration
    #[validate(nested)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Load configuration from defaults, an optional file, and the environment.
    ///
    /// Sources are layered lowest to highest: struct defaults, the file at
    /// `path` (format picked from its extension), `VAULTLINE__*` variables,
    /// then the conventional `VAULT_*` variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX).separator("__").try_parsing(true),
        );

        let max_retries = env_parsed::<i64>("VAULT_MAX_RETRIES")?;
        let skip_verify = std::env::var("VAULT_SKIP_VERIFY").ok().map(|v| parse_flag(&v));

        builder = builder
            .set_override_option("transport.address", std::env::var("VAULT_ADDR").ok())?
            .set_override_option("transport.token", std::env::var("VAULT_TOKEN").ok())?
            .set_override_option("transport.namespace", std::env::var("VAULT_NAMESPACE").ok())?
            .set_override_option("transport.tls.ca_cert_file", std::env::var("VAULT_CACERT").ok())?
            .set_override_option("transport.tls.skip_verify", skip_verify)?
            .set_override_option("transport.max_retries", max_retries)?;

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self)?;
        Ok(())
    }
}

/// Transport settings for one client handle.
///
/// Clones may diverge from the original in any of these fields; only the
/// consistency state is shared between them.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(default)]
#[validate(schema(function = "validate_transport_waits"))]
pub struct TransportConfig {
    /// Service address, e.g. `https://vault.example.com:8200`
    #[validate(custom(function = "validate_address"))]
    pub address: String,

    /// Service token sent as `X-Vault-Token`
    pub token: Option<SecretString>,

    /// Namespace sent as `X-Vault-Namespace`
    pub namespace: Option<String>,

    /// Per-request timeout in seconds
    #[validate(range(min = 1, max = 600, message = "Timeout must be between 1 and 600 seconds"))]
    pub timeout_seconds: u64,

    /// Retries for connection errors and 5xx responses (0 disables)
    #[validate(range(max = 20, message = "Max retries must be at most 20"))]
    pub max_retries: u32,

    /// Lower bound of the wait between transport retries
    pub retry_wait_min_ms: u64,

    /// Upper bound of the wait between transport retries
    pub retry_wait_max_ms: u64,

    /// TLS settings
    #[validate(nested)]
    pub tls: TlsConfig,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            address: "https://127.0.0.1:8200".to_string(),
            token: None,
            namespace: None,
            timeout_seconds: 60,
            max_retries: 2,
            retry_wait_min_ms: 1000,
            retry_wait_max_ms: 1500,
            tls: TlsConfig::default(),
        }
    }
}

impl TransportConfig {
    /// Create a transport configuration for the given address.
    pub fn new(address: impl Into<String>) -> Self {
        Self { address: address.into(), ..Default::default() }
    }

    /// Set the service token.
    pub fn with_token(mut self, token: impl Into<SecretString>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set the number of transport-level retries.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the bounds of the wait between transport retries.
    pub fn with_retry_wait(mut self, min: Duration, max: Duration) -> Self {
        self.retry_wait_min_ms = min.as_millis() as u64;
        self.retry_wait_max_ms = max.as_millis() as u64;
        self
    }

    /// Create transport configuration from `VAULT_*` environment variables
    pub fn from_env() -> Result<Self> {
        let address = std::env::var("VAULT_ADDR")
            .map_err(|_| Error::config("VAULT_ADDR environment variable not set"))?;

        let mut config = Self::new(address);
        config.token = std::env::var("VAULT_TOKEN").ok().map(SecretString::from);
        config.namespace = std::env::var("VAULT_NAMESPACE").ok().filter(|ns| !ns.is_empty());

        if let Some(max_retries) = env_parsed::<u32>("VAULT_MAX_RETRIES")? {
            config.max_retries = max_retries;
        }

        config.tls.ca_cert_file = std::env::var("VAULT_CACERT").ok().map(PathBuf::from);
        config.tls.skip_verify =
            std::env::var("VAULT_SKIP_VERIFY").map(|v| parse_flag(&v)).unwrap_or(false);

        config.validate()?;
        Ok(config)
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Bounds of the wait between transport retries
    pub fn retry_wait(&self) -> (Duration, Duration) {
        (Duration::from_millis(self.retry_wait_min_ms), Duration::from_millis(self.retry_wait_max_ms))
    }
}

/// TLS settings for the connection to the backing service
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default, PartialEq)]
#[serde(default)]
#[validate(schema(function = "validate_client_identity"))]
pub struct TlsConfig {
    /// PEM bundle of additional trusted CA certificates
    pub ca_cert_file: Option<PathBuf>,

    /// PEM client certificate for mutual TLS
    pub client_cert_file: Option<PathBuf>,

    /// PEM private key matching `client_cert_file`
    pub client_key_file: Option<PathBuf>,

    /// Disable certificate verification (development only)
    pub skip_verify: bool,
}

/// Retry budget for reads that may race replication
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(default)]
#[validate(schema(function = "validate_read_waits"))]
pub struct ReadRetryConfig {
    /// Total attempts including the first (0 and 1 both mean a single try)
    #[validate(range(max = 100, message = "Max attempts must be at most 100"))]
    pub max_attempts: u32,

    /// Lower bound of the wait between attempts
    pub min_wait_ms: u64,

    /// Upper bound of the wait between attempts
    pub max_wait_ms: u64,
}

impl Default for ReadRetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            min_wait_ms: policy.min_wait.as_millis() as u64,
            max_wait_ms: policy.max_wait.as_millis() as u64,
        }
    }
}

impl ReadRetryConfig {
    /// Build the retry policy described by this configuration
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_attempts(self.max_attempts)
            .with_wait(Duration::from_millis(self.min_wait_ms), Duration::from_millis(self.max_wait_ms))
    }
}

/// Logging and metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,

    /// Emit metrics through the `metrics` facade
    pub enable_metrics: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self { log_level: "info".to_string(), json_logging: false, enable_metrics: true }
    }
}

fn validate_address(address: &str) -> std::result::Result<(), ValidationError> {
    let url = Url::parse(address).map_err(|_| {
        let mut err = ValidationError::new("address");
        err.message = Some(format!("'{}' is not a valid URL", address).into());
        err
    })?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        let mut err = ValidationError::new("address");
        err.message = Some("Address must be an http:// or https:// URL with a host".into());
        return Err(err);
    }

    Ok(())
}

fn validate_transport_waits(config: &TransportConfig) -> std::result::Result<(), ValidationError> {
    if config.retry_wait_min_ms > config.retry_wait_max_ms {
        let mut err = ValidationError::new("retry_wait");
        err.message = Some("retry_wait_min_ms cannot exceed retry_wait_max_ms".into());
        return Err(err);
    }
    Ok(())
}

fn validate_read_waits(config: &ReadRetryConfig) -> std::result::Result<(), ValidationError> {
    if config.min_wait_ms > config.max_wait_ms {
        let mut err = ValidationError::new("read_wait");
        err.message = Some("min_wait_ms cannot exceed max_wait_ms".into());
        return Err(err);
    }
    Ok(())
}

fn validate_client_identity(config: &TlsConfig) -> std::result::Result<(), ValidationError> {
    if config.client_cert_file.is_some() != config.client_key_file.is_some() {
        let mut err = ValidationError::new("client_identity");
        err.message =
            Some("client_cert_file and client_key_file must be configured together".into());
        return Err(err);
    }
    Ok(())
}

fn env_parsed<T: std::str::FromStr>(name: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| Error::config(format!("Invalid {}: {}", name, e))),
        _ => Ok(None),
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
