//! Factory owning one consistency store and the handles wired to it.

use std::sync::Arc;

use tracing::info;

use super::handle::ClientHandle;
use crate::config::TransportConfig;
use crate::consistency::ConsistencyStateStore;
use crate::errors::Result;
use crate::observability::MetricsRecorder;

/// Builds client handles that share one [`ConsistencyStateStore`].
///
/// The store is created by [`construct`](Self::construct) and lives as long
/// as the factory or any handle produced from it.
#[derive(Debug)]
pub struct ClientHandleFactory {
    store: Arc<ConsistencyStateStore>,
    primary: ClientHandle,
}

impl ClientHandleFactory {
    /// Create a fresh store and a primary handle for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if `config` is invalid
    /// or the transport cannot be built from it.
    pub fn construct(config: TransportConfig) -> Result<Self> {
        Self::construct_with_metrics(config, MetricsRecorder::new())
    }

    /// Same as [`construct`](Self::construct) with an explicit metrics recorder.
    pub fn construct_with_metrics(config: TransportConfig, metrics: MetricsRecorder) -> Result<Self> {
        let store = Arc::new(ConsistencyStateStore::new());
        let address = config.address.clone();
        let primary = ClientHandle::build(config, Arc::clone(&store), metrics)?;

        info!(address = %address, header = %store.header(), "Client handle factory constructed");
        Ok(Self { store, primary })
    }

    /// The primary handle. Repeated calls return the same handle.
    pub fn handle(&self) -> &ClientHandle {
        &self.primary
    }

    /// A new handle with a copy of the primary's configuration.
    pub fn clone_handle(&self) -> Result<ClientHandle> {
        self.clone_handle_with(|_| {})
    }

    /// A new handle whose configuration `configure` may change freely.
    ///
    /// Tokens observed through the new handle become visible to every other
    /// handle of this factory, and the reverse.
    pub fn clone_handle_with<F>(&self, configure: F) -> Result<ClientHandle>
    where
        F: FnOnce(&mut TransportConfig),
    {
        let handle = self.primary.clone_with(configure)?;
        info!(
            address = %handle.config().address,
            namespace = ?handle.config().namespace,
            "Cloned client handle"
        );
        Ok(handle)
    }

    /// The store every handle of this factory shares
    pub fn store(&self) -> &Arc<ConsistencyStateStore> {
        &self.store
    }
}
