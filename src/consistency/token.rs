//! Opaque freshness token.

use http::HeaderValue;
use std::fmt;

/// A freshness marker returned by the backing service.
///
/// Observed values look like `v1:<cluster-id>:<epoch>:<index>:` (base64 encoded
/// on the wire) but the client never looks inside. Tokens compare and order by
/// their raw string contents only.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConsistencyToken(String);

impl ConsistencyToken {
    /// Wrap a raw token string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Extract a token from a header value, byte for byte.
    ///
    /// Only visible ASCII is accepted. The service emits base64, so empty
    /// values and values carrying obs-text bytes are not tokens and yield
    /// `None`.
    pub fn from_header_value(value: &HeaderValue) -> Option<Self> {
        let raw = value.to_str().ok()?;
        if raw.is_empty() {
            None
        } else {
            Some(Self(raw.to_string()))
        }
    }

    /// Render the token as a request header value.
    pub fn to_header_value(&self) -> Option<HeaderValue> {
        HeaderValue::from_str(&self.0).ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ConsistencyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConsistencyToken").field(&self.0).finish()
    }
}

impl fmt::Display for ConsistencyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConsistencyToken {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ConsistencyToken {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
