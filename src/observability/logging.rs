//! # Structured Logging
//!
//! Logging setup on top of `tracing-subscriber`, plus span helpers used by the
//! client layer. Tokens and credentials are never recorded; spans carry token
//! counts only.

use crate::config::ObservabilityConfig;
use crate::errors::{Error, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// Create a tracing span for one request to the backing service.
///
/// ```rust,ignore
/// let span = vault_span!("GET", "secret/data/app");
/// let span = vault_span!("PUT", "secret/data/app", namespace = "team-a");
/// ```
#[macro_export]
macro_rules! vault_span {
    ($method:expr, $path:expr) => {
        tracing::debug_span!(
            "vault_request",
            method = %$method,
            path = %$path,
            attempt = tracing::field::Empty,
            status = tracing::field::Empty
        )
    };
    ($method:expr, $path:expr, $($field:tt)*) => {
        tracing::debug_span!(
            "vault_request",
            method = %$method,
            path = %$path,
            attempt = tracing::field::Empty,
            status = tracing::field::Empty,
            $($field)*
        )
    };
}

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over `config.log_level`. If a subscriber is
/// already installed (tests, embedding applications) this is a no-op.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => level_filter(&config.log_level)?,
    };

    // A subscriber may already be set (tests, embedders); keep it.
    let _ = if config.json_logging {
        tracing::subscriber::set_global_default(
            fmt().json().with_env_filter(filter).with_writer(std::io::stderr).finish(),
        )
    } else {
        tracing::subscriber::set_global_default(
            fmt().with_env_filter(filter).with_writer(std::io::stderr).finish(),
        )
    };
    Ok(())
}

fn level_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(level)
        .map_err(|e| Error::config(format!("Invalid log level '{}': {}", level, e)))
}

/// Log configuration at startup
pub fn log_config_info(config: &crate::config::AppConfig) {
    tracing::info!(
        address = %config.transport.address,
        namespace = ?config.transport.namespace,
        token_configured = config.transport.token.is_some(),
        max_retries = config.transport.max_retries,
        read_max_attempts = config.read_retry.max_attempts,
        tls_skip_verify = config.transport.tls.skip_verify,
        "vaultline client configuration"
    );
}
