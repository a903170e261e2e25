//! # Error Handling
//!
//! Error types for the vaultline client layer, defined with `thiserror`.
//!
//! Store operations never fail. Everything that can fail surfaces one
//! [`Error`] value, and the retry-aware variants carry the queried path so
//! callers can pattern-match instead of inspecting strings.

/// Custom result type for vaultline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the vaultline client layer
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network or TLS failure talking to the backing service
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-success response from the backing service
    #[error("API error: {path} returned status {status}{}", format_api_errors(.errors))]
    Api { status: u16, path: String, errors: Vec<String> },

    /// The path stayed absent for the whole retry budget
    #[error("Not found: {path} (after {attempts} attempts)")]
    NotFound { path: String, attempts: u32 },

    /// The path kept racing a concurrent change for the whole retry budget
    #[error("Retries exhausted reading {path}: still conflicting after {attempts} attempts")]
    RetriesExhausted { path: String, attempts: u32 },

    /// A read was cancelled while waiting between attempts
    #[error("Read of {path} cancelled after {attempts} attempts")]
    Cancelled { path: String, attempts: u32 },

    /// Payload for a path could not be encoded or decoded
    #[error("Serialization error for {path}: {source}")]
    Serialization {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Logical path that cannot be turned into a request URL
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_api_errors(errors: &[String]) -> String {
    if errors.is_empty() {
        String::new()
    } else {
        format!(": {}", errors.join("; "))
    }
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S, source: reqwest::Error) -> Self {
        Self::Transport { message: message.into(), source }
    }

    /// Create a new API error
    pub fn api<P: Into<String>>(status: u16, path: P, errors: Vec<String>) -> Self {
        Self::Api { status, path: path.into(), errors }
    }

    /// Create a new serialization error
    pub fn serialization<P: Into<String>>(path: P, source: serde_json::Error) -> Self {
        Self::Serialization { path: path.into(), source }
    }

    /// Create a new invalid path error
    pub fn invalid_path<P: Into<String>, R: Into<String>>(path: P, reason: R) -> Self {
        Self::InvalidPath { path: path.into(), reason: reason.into() }
    }

    /// Whether this error means the requested path does not exist.
    ///
    /// True for an exhausted not-found read and for a raw 404 response.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Api { status: 404, .. })
    }

    /// HTTP status of the response that produced this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Logical path this error refers to, if known
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Api { path, .. }
            | Self::NotFound { path, .. }
            | Self::RetriesExhausted { path, .. }
            | Self::Cancelled { path, .. }
            | Self::Serialization { path, .. }
            | Self::InvalidPath { path, .. } => Some(path),
            _ => None,
        }
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Config(format!("Validation failed: {}", errors))
    }
}

impl From<config::ConfigError> for Error {
    fn from(error: config::ConfigError) -> Self {
        Self::Config(format!("Failed to load configuration: {}", error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_constructors() {
        let err = Error::config("bad address");
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(err.to_string(), "Configuration error: bad address");

        let err = Error::api(403, "secret/foo", vec!["permission denied".to_string()]);
        assert_eq!(err.status(), Some(403));
        assert_eq!(err.path(), Some("secret/foo"));
        assert_eq!(err.to_string(), "API error: secret/foo returned status 403: permission denied");
    }

    #[test]
    fn test_api_error_without_messages() {
        let err = Error::api(500, "sys/health", vec![]);
        assert_eq!(err.to_string(), "API error: sys/health returned status 500");
    }

    #[test]
    fn test_is_not_found() {
        assert!(Error::NotFound { path: "kv/a".into(), attempts: 3 }.is_not_found());
        assert!(Error::api(404, "kv/a", vec![]).is_not_found());

        assert!(!Error::RetriesExhausted { path: "kv/a".into(), attempts: 3 }.is_not_found());
        assert!(!Error::api(412, "kv/a", vec![]).is_not_found());
        assert!(!Error::config("nope").is_not_found());
    }

    #[test]
    fn test_exhausted_errors_carry_path() {
        let err = Error::RetriesExhausted { path: "kv/data/app".into(), attempts: 5 };
        assert_eq!(err.path(), Some("kv/data/app"));
        assert!(err.to_string().contains("kv/data/app"));
        assert!(err.to_string().contains("5 attempts"));
        assert_eq!(err.status(), None);
    }
}
