//! # Observability Infrastructure
//!
//! Structured logging and metrics for the client layer.

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, log_config_info};
pub use metrics::MetricsRecorder;

use crate::config::ObservabilityConfig;
use crate::errors::Result;

/// Initialize logging and register metric descriptions
pub fn init_observability(config: &ObservabilityConfig) -> Result<MetricsRecorder> {
    init_logging(config)?;

    let recorder = if config.enable_metrics {
        MetricsRecorder::describe();
        MetricsRecorder::new()
    } else {
        MetricsRecorder::disabled()
    };

    tracing::debug!(
        log_level = %config.log_level,
        json_logging = config.json_logging,
        metrics_enabled = config.enable_metrics,
        "Observability initialized"
    );

    Ok(recorder)
}
