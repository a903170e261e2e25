//! # Client Layer
//!
//! HTTP handles for the backing service. A [`ClientHandleFactory`] owns one
//! consistency store; every handle it produces stamps requests from that store
//! and feeds response tokens back into it.
//!
//! ```rust,no_run
//! use vaultline::client::ClientHandleFactory;
//! use vaultline::config::TransportConfig;
//!
//! # async fn example() -> vaultline::Result<()> {
//! let factory = ClientHandleFactory::construct(
//!     TransportConfig::new("https://vault.example.com:8200").with_token("hvs.example"),
//! )?;
//! let reader = factory.clone_handle_with(|c| c.token = Some("hvs.reader".into()))?;
//!
//! factory.handle().write("secret/data/app", &serde_json::json!({"data": {"k": "v"}})).await?;
//! let secret = reader.read("secret/data/app").await?;
//! # let _ = secret;
//! # Ok(())
//! # }
//! ```

pub mod factory;
pub mod handle;
pub mod response;

pub use factory::ClientHandleFactory;
pub use handle::{ClientHandle, LogicalRead};
pub use response::VaultResponse;
