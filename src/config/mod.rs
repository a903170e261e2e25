//! # Configuration Management
//!
//! Configuration for client handles, read retries, and observability.
//! Values are layered from defaults, an optional file, and the environment
//! with the `config` crate, then checked with `validator`.

pub mod secret;
pub mod settings;

pub use secret::SecretString;
pub use settings::{
    AppConfig, ObservabilityConfig, ReadRetryConfig, TlsConfig, TransportConfig, ENV_PREFIX,
};
