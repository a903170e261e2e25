//! Service token held in configuration.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// The `X-Vault-Token` credential.
///
/// Reads as a plain string from config files and `VAULT_TOKEN`, but prints and
/// serializes as `[REDACTED]`, so dumping an [`AppConfig`](super::AppConfig)
/// never leaks it. Zeroed on drop.
///
/// ```rust
/// use vaultline::config::SecretString;
///
/// let token = SecretString::from("hvs.example");
/// assert_eq!(format!("{:?}", token), "SecretString([REDACTED])");
/// assert_eq!(token.expose_secret(), "hvs.example");
/// ```
#[derive(Clone, PartialEq, Eq, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct SecretString(String);

impl SecretString {
    /// Raw token for the request header. Never log the result.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl Serialize for SecretString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("[REDACTED]")
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretString([REDACTED])")
    }
}

impl From<String> for SecretString {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for SecretString {
    fn from(token: &str) -> Self {
        Self(token.to_owned())
    }
}
