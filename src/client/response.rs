//! Response envelope returned by the backing service.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{Error, Result};

/// Standard envelope around every logical response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultResponse {
    pub request_id: String,
    pub lease_id: String,
    pub renewable: bool,
    pub lease_duration: u64,
    pub data: Option<Value>,
    pub warnings: Option<Vec<String>>,
    pub auth: Option<Value>,
    pub wrap_info: Option<Value>,
}

impl VaultResponse {
    /// Decode the `data` field into `T`.
    ///
    /// A missing `data` field decodes as JSON `null`, so `Option<T>` targets
    /// read it as `None`.
    pub fn decode<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let data = self.data.clone().unwrap_or(Value::Null);
        serde_json::from_value(data).map_err(|e| Error::serialization(path, e))
    }
}

/// Error body shape: `{"errors": ["..."]}`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub errors: Vec<String>,
}

impl ApiErrorBody {
    /// Parse an error body, tolerating empty or non-JSON payloads.
    pub(crate) fn parse(body: &[u8]) -> Vec<String> {
        serde_json::from_slice::<ApiErrorBody>(body).map(|b| b.errors).unwrap_or_default()
    }
}
