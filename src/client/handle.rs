//! # Client Handles
//!
//! A [`ClientHandle`] is one transport identity talking to the backing
//! service. Every request it sends is stamped with the tokens held by its
//! [`ConsistencyStateStore`], and every response it receives is fed back into
//! that store before anything else looks at it. Handles cloned from one
//! another share the store and nothing else.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn, Instrument};
use validator::Validate;

use super::response::{ApiErrorBody, VaultResponse};
use crate::config::TransportConfig;
use crate::consistency::ConsistencyStateStore;
use crate::errors::{Error, Result};
use crate::observability::MetricsRecorder;

const TOKEN_HEADER: &str = "x-vault-token";
const NAMESPACE_HEADER: &str = "x-vault-namespace";
const REQUEST_HEADER: &str = "x-vault-request";

/// Anything that can perform a logical read of a path.
///
/// [`RetryingReader`](crate::retry::RetryingReader) only depends on this
/// trait, so it works with any handle, wrapped or not.
#[async_trait]
pub trait LogicalRead: Send + Sync {
    async fn read(&self, path: &str) -> Result<VaultResponse>;
}

/// One transport identity bound to a shared consistency store.
#[derive(Debug)]
pub struct ClientHandle {
    http: reqwest::Client,
    config: TransportConfig,
    store: Arc<ConsistencyStateStore>,
    metrics: MetricsRecorder,
}

impl ClientHandle {
    /// Build a handle for `config` wired to `store`.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the configuration fails validation, a TLS file
    ///   cannot be parsed, or the token or namespace is not a valid header value
    /// - [`Error::Io`] if a TLS file cannot be read
    pub(crate) fn build(
        config: TransportConfig,
        store: Arc<ConsistencyStateStore>,
        metrics: MetricsRecorder,
    ) -> Result<Self> {
        config.validate()?;

        let mut builder = reqwest::Client::builder()
            .default_headers(default_headers(&config)?)
            .timeout(config.timeout());

        if let Some(ca_file) = &config.tls.ca_cert_file {
            let pem = std::fs::read(ca_file)?;
            let certs = reqwest::Certificate::from_pem_bundle(&pem).map_err(|e| {
                Error::config(format!("Invalid CA certificate '{}': {}", ca_file.display(), e))
            })?;
            if certs.is_empty() {
                return Err(Error::config(format!(
                    "CA file '{}' contains no certificates",
                    ca_file.display()
                )));
            }
            for cert in certs {
                builder = builder.add_root_certificate(cert);
            }
        }

        if let (Some(cert_file), Some(key_file)) =
            (&config.tls.client_cert_file, &config.tls.client_key_file)
        {
            let mut pem = std::fs::read(cert_file)?;
            pem.push(b'\n');
            pem.extend(std::fs::read(key_file)?);
            let identity = reqwest::Identity::from_pem(&pem).map_err(|e| {
                Error::config(format!("Invalid client identity '{}': {}", cert_file.display(), e))
            })?;
            builder = builder.identity(identity);
        }

        if config.tls.skip_verify {
            warn!(address = %config.address, "TLS certificate verification is disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config, store, metrics })
    }

    /// Transport configuration of this handle
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Consistency store shared with every sibling handle
    pub fn store(&self) -> &Arc<ConsistencyStateStore> {
        &self.store
    }

    /// Whether `other` reads and writes the same consistency store.
    pub fn shares_state_with(&self, other: &ClientHandle) -> bool {
        Arc::ptr_eq(&self.store, &other.store)
    }

    /// Build a sibling handle with its own copy of the transport configuration.
    ///
    /// `configure` may change anything (token, namespace, address, TLS); the
    /// new handle still shares this handle's consistency store.
    pub fn clone_with<F>(&self, configure: F) -> Result<ClientHandle>
    where
        F: FnOnce(&mut TransportConfig),
    {
        let mut config = self.config.clone();
        configure(&mut config);
        Self::build(config, Arc::clone(&self.store), self.metrics)
    }

    /// Read `path`. A success without a body reads as an empty response.
    pub async fn read(&self, path: &str) -> Result<VaultResponse> {
        Ok(self.send(Method::GET, path, false, None).await?.unwrap_or_default())
    }

    /// List the keys under `path`.
    pub async fn list(&self, path: &str) -> Result<VaultResponse> {
        Ok(self.send(Method::GET, path, true, None).await?.unwrap_or_default())
    }

    /// Write `body` to `path`.
    pub async fn write<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<Option<VaultResponse>> {
        let body = serde_json::to_value(body).map_err(|e| Error::serialization(path, e))?;
        self.send(Method::PUT, path, false, Some(&body)).await
    }

    /// Delete `path`.
    pub async fn delete(&self, path: &str) -> Result<Option<VaultResponse>> {
        self.send(Method::DELETE, path, false, None).await
    }

    fn url_for(&self, path: &str) -> Result<String> {
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            return Err(Error::invalid_path(path, "path cannot be empty"));
        }
        Ok(format!("{}/v1/{}", self.config.address.trim_end_matches('/'), trimmed))
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        list: bool,
        body: Option<&Value>,
    ) -> Result<Option<VaultResponse>> {
        let url = self.url_for(path)?;
        let span = crate::vault_span!(method, path);
        self.send_with_retries(method, path, &url, list, body).instrument(span).await
    }

    async fn send_with_retries(
        &self,
        method: Method,
        path: &str,
        url: &str,
        list: bool,
        body: Option<&Value>,
    ) -> Result<Option<VaultResponse>> {
        let max_retries = self.config.max_retries;
        let mut attempt: u32 = 0;

        loop {
            tracing::Span::current().record("attempt", attempt + 1);

            let mut builder = self.http.request(method.clone(), url);
            if list {
                builder = builder.query(&[("list", "true")]);
            }
            if let Some(body) = body {
                builder = builder.json(body);
            }
            let mut request =
                builder.build().map_err(|e| Error::transport("Failed to build request", e))?;
            self.store.stamp(request.headers_mut());
            debug!(
                stamped_tokens = request.headers().get_all(self.store.header()).iter().count(),
                "Sending request"
            );

            match self.http.execute(request).await {
                Ok(response) => {
                    let status = response.status();
                    let inserted = self.store.observe(response.headers());
                    self.metrics.record_tokens_observed(inserted, self.store.len());
                    self.metrics.record_request(method.as_str(), status.as_u16());
                    tracing::Span::current().record("status", status.as_u16());

                    if status.is_server_error() && attempt < max_retries {
                        warn!(
                            %status,
                            attempt = attempt + 1,
                            max_retries,
                            "Server error from backing service, retrying"
                        );
                    } else {
                        debug!(%status, new_tokens = inserted, "Response received");
                        return finish(path, status, response).await;
                    }
                }
                Err(e) if (e.is_connect() || e.is_timeout()) && attempt < max_retries => {
                    warn!(error = %e, attempt = attempt + 1, max_retries, "Request failed, retrying");
                }
                Err(e) => {
                    return Err(Error::transport(format!("{} {} failed", method, path), e));
                }
            }

            self.metrics.record_transport_retry();
            tokio::time::sleep(self.backoff(attempt)).await;
            attempt += 1;
        }
    }

    // Doubles from the lower bound on every retry, capped at the upper bound.
    fn backoff(&self, attempt: u32) -> Duration {
        let (min, max) = self.config.retry_wait();
        min.saturating_mul(2u32.saturating_pow(attempt)).min(max)
    }
}

#[async_trait]
impl LogicalRead for ClientHandle {
    async fn read(&self, path: &str) -> Result<VaultResponse> {
        ClientHandle::read(self, path).await
    }
}

async fn finish(
    path: &str,
    status: StatusCode,
    response: reqwest::Response,
) -> Result<Option<VaultResponse>> {
    let body = response
        .bytes()
        .await
        .map_err(|e| Error::transport(format!("Failed to read response body for {}", path), e))?;

    if !status.is_success() {
        return Err(Error::api(status.as_u16(), path, ApiErrorBody::parse(&body)));
    }

    if status == StatusCode::NO_CONTENT || body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    serde_json::from_slice(&body).map(Some).map_err(|e| Error::serialization(path, e))
}

fn default_headers(config: &TransportConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(HeaderName::from_static(REQUEST_HEADER), HeaderValue::from_static("true"));

    if let Some(token) = &config.token {
        let mut value = HeaderValue::from_str(token.expose_secret())
            .map_err(|_| Error::config("Token contains characters not allowed in a header"))?;
        value.set_sensitive(true);
        headers.insert(HeaderName::from_static(TOKEN_HEADER), value);
    }

    if let Some(namespace) = config.namespace.as_deref().filter(|ns| !ns.is_empty()) {
        let value = HeaderValue::from_str(namespace).map_err(|_| {
            Error::config(format!("Namespace '{}' is not a valid header value", namespace))
        })?;
        headers.insert(HeaderName::from_static(NAMESPACE_HEADER), value);
    }

    Ok(headers)
}
