//! Shared, thread-safe set of observed freshness tokens.

use std::sync::{Mutex, MutexGuard, PoisonError};

use http::{HeaderMap, HeaderName};

use super::token::ConsistencyToken;

/// Header carrying freshness tokens on both responses and requests.
pub const VAULT_INDEX_HEADER: &str = "x-vault-index";

/// The set of freshness tokens seen so far by every handle sharing this store.
///
/// The set only grows. It is kept sorted and free of duplicates, so the result
/// of any interleaving of [`observe`](Self::observe) calls is the sorted union of
/// everything observed.
///
/// One mutex guards the set. Both operations are short, allocation-light and
/// never perform I/O while holding it.
#[derive(Debug)]
pub struct ConsistencyStateStore {
    header: HeaderName,
    tokens: Mutex<Vec<ConsistencyToken>>,
}

impl Default for ConsistencyStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsistencyStateStore {
    /// Create an empty store using the `X-Vault-Index` header.
    pub fn new() -> Self {
        Self::with_header(HeaderName::from_static(VAULT_INDEX_HEADER))
    }

    /// Create an empty store that reads and writes a different header.
    pub fn with_header(header: HeaderName) -> Self {
        Self { header, tokens: Mutex::new(Vec::new()) }
    }

    /// Name of the header this store reads and writes.
    pub fn header(&self) -> &HeaderName {
        &self.header
    }

    /// Merge the tokens carried by a response into the set.
    ///
    /// Values are kept exactly as received. Absent or empty values, and values
    /// that are not visible ASCII, are ignored. Returns how many tokens were
    /// new.
    pub fn observe(&self, headers: &HeaderMap) -> usize {
        let incoming: Vec<ConsistencyToken> = headers
            .get_all(&self.header)
            .iter()
            .filter_map(ConsistencyToken::from_header_value)
            .collect();

        if incoming.is_empty() {
            return 0;
        }

        let mut tokens = self.lock();
        let mut inserted = 0;
        for token in incoming {
            if let Err(position) = tokens.binary_search(&token) {
                tokens.insert(position, token);
                inserted += 1;
            }
        }
        inserted
    }

    /// Write the current set onto a request, one header value per token.
    ///
    /// Any existing values for the header are replaced. An empty set leaves the
    /// header unset.
    pub fn stamp(&self, headers: &mut HeaderMap) {
        headers.remove(&self.header);

        let tokens = self.lock();
        for token in tokens.iter() {
            match token.to_header_value() {
                Some(value) => {
                    headers.append(self.header.clone(), value);
                }
                None => {
                    tracing::warn!(header = %self.header, "Skipping token that is not a valid header value");
                }
            }
        }
    }

    /// Copy of the current tokens in ascending order.
    pub fn snapshot(&self) -> Vec<ConsistencyToken> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic elsewhere cannot leave the Vec half-updated, so a poisoned lock
    // still guards a consistent set.
    fn lock(&self) -> MutexGuard<'_, Vec<ConsistencyToken>> {
        self.tokens.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
