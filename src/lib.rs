//! # Vaultline
//!
//! Client-side consistency layer for Vault-compatible secrets services running
//! as a replicated cluster.
//!
//! ## Architecture
//!
//! ```text
//! ClientHandleFactory ──owns──> Arc<ConsistencyStateStore>
//!        │                            ▲        │
//!        ├─ handle()                  │observe │stamp
//!        └─ clone_handle_with(..) ────┴────────┘  (every handle)
//!
//! RetryingReader ──reads through──> any LogicalRead (e.g. ClientHandle)
//! ```
//!
//! - **ConsistencyStateStore**: the sorted, deduplicated set of `X-Vault-Index`
//!   tokens seen so far, stamped onto every outgoing request.
//! - **ClientHandleFactory**: one store, many independently configured handles.
//! - **RetryingReader**: bounded, jittered retries for reads racing a recent write.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use vaultline::{ClientHandleFactory, RetryingReader, RetryPolicy, Result, TransportConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let factory = ClientHandleFactory::construct(TransportConfig::from_env()?)?;
//!     let reader = RetryingReader::new(RetryPolicy::default());
//!
//!     let outcome: vaultline::ReadOutcome<serde_json::Value> =
//!         reader.read(factory.handle(), "secret/data/app").await?;
//!     println!("{} after {} retries", outcome.payload, outcome.retries());
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod client;
pub mod config;
pub mod consistency;
pub mod errors;
pub mod observability;
pub mod retry;

// Re-export commonly used types and traits
pub use client::{ClientHandle, ClientHandleFactory, LogicalRead, VaultResponse};
pub use config::{AppConfig, TransportConfig};
pub use consistency::{ConsistencyStateStore, ConsistencyToken, VAULT_INDEX_HEADER};
pub use errors::{Error, Result};
pub use retry::{ReadOutcome, RetryPolicy, RetrySignal, RetryingReader};

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
