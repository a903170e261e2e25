//! # Session Consistency
//!
//! Tracks the freshness tokens the backing service hands out so that later
//! requests, possibly sent through a different client handle, ask to be
//! served by a node that has caught up at least that far.
//!
//! The service emits an `X-Vault-Index` header on responses. Each value is an
//! opaque [`ConsistencyToken`]. A [`ConsistencyStateStore`] merges every token
//! it is shown into a sorted, duplicate-free set and writes that set back onto
//! outgoing requests under the same header name.

pub mod store;
pub mod token;

pub use store::{ConsistencyStateStore, VAULT_INDEX_HEADER};
pub use token::ConsistencyToken;
