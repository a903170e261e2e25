//! # Metrics Collection
//!
//! Emits client metrics through the `metrics` facade. The library installs no
//! exporter; the host application chooses one.

use metrics::{counter, describe_counter, describe_gauge, gauge};

/// Metrics recorder for client handles and the retrying reader
#[derive(Debug, Clone, Copy)]
pub struct MetricsRecorder {
    enabled: bool,
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRecorder {
    /// Create an enabled recorder
    pub fn new() -> Self {
        Self { enabled: true }
    }

    /// Create a recorder that drops every measurement
    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Register metric descriptions with the installed recorder
    pub fn describe() {
        describe_counter!(
            "vaultline_consistency_tokens_observed_total",
            "New freshness tokens merged into a consistency store"
        );
        describe_gauge!(
            "vaultline_consistency_token_set_size",
            "Tokens currently held by the most recently updated store"
        );
        describe_counter!("vaultline_requests_total", "Requests sent to the backing service");
        describe_counter!(
            "vaultline_transport_retries_total",
            "Requests re-sent after a connection error or 5xx response"
        );
        describe_counter!("vaultline_read_attempts_total", "Attempts made by the retrying reader");
        describe_counter!("vaultline_read_outcomes_total", "Final outcomes of retrying reads");
    }

    /// Record newly merged tokens and the resulting set size
    pub fn record_tokens_observed(&self, inserted: usize, set_size: usize) {
        if !self.enabled || inserted == 0 {
            return;
        }
        counter!("vaultline_consistency_tokens_observed_total").increment(inserted as u64);
        gauge!("vaultline_consistency_token_set_size").set(set_size as f64);
    }

    /// Record a completed request
    pub fn record_request(&self, method: &str, status: u16) {
        if !self.enabled {
            return;
        }
        let labels = [("method", method.to_string()), ("status", status.to_string())];
        counter!("vaultline_requests_total", &labels).increment(1);
    }

    /// Record a transport-level retry
    pub fn record_transport_retry(&self) {
        if self.enabled {
            counter!("vaultline_transport_retries_total").increment(1);
        }
    }

    /// Record one attempt of a retrying read
    pub fn record_read_attempt(&self) {
        if self.enabled {
            counter!("vaultline_read_attempts_total").increment(1);
        }
    }

    /// Record the final outcome of a retrying read
    pub fn record_read_outcome(&self, outcome: &'static str) {
        if !self.enabled {
            return;
        }
        let labels = [("outcome", outcome)];
        counter!("vaultline_read_outcomes_total", &labels).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recorder_without_exporter() {
        // No recorder installed: every call is a no-op and must not panic.
        MetricsRecorder::describe();
        let recorder = MetricsRecorder::new();
        recorder.record_tokens_observed(2, 5);
        recorder.record_request("GET", 200);
        recorder.record_transport_retry();
        recorder.record_read_attempt();
        recorder.record_read_outcome("success");
    }

    #[test]
    fn test_disabled_recorder() {
        let recorder = MetricsRecorder::disabled();
        assert!(!recorder.is_enabled());
        recorder.record_read_outcome("not_found");
    }
}
