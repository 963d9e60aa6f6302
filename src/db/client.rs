//! Handle references handed out by the registry.

use crate::config::MongoConfig;
use crate::db::driver::Driver;
use crate::db::registry::ConnectionRegistry;
use crate::error::MotorResult;
use std::sync::Arc;

/// A config bound to the registry that owns its connection.
///
/// Cloning is cheap. All references with the same URL share one underlying
/// connection; disconnecting through one disconnects it for all of them.
pub struct ConnectionRef<D: Driver> {
    registry: Arc<ConnectionRegistry<D>>,
    config: MongoConfig,
}

impl<D: Driver> ConnectionRef<D> {
    pub(crate) fn new(registry: Arc<ConnectionRegistry<D>>, config: MongoConfig) -> Self {
        Self { registry, config }
    }

    pub fn config(&self) -> &MongoConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry<D>> {
        &self.registry
    }

    /// The connection URL this reference is keyed by.
    pub fn url(&self) -> String {
        self.config.get_url()
    }

    /// Ensure the connection is established. No-op when already connected.
    pub async fn connect(&self) -> MotorResult<()> {
        self.handle().await.map(|_| ())
    }

    /// Get the driver handle, connecting first if needed.
    pub async fn handle(&self) -> MotorResult<D::Handle> {
        self.registry.get_or_create(&self.config).await
    }

    pub async fn disconnect(&self) {
        self.registry.disconnect(&self.url()).await;
    }

    /// Close the current connection and dial a new one.
    pub async fn reconnect(&self) -> MotorResult<()> {
        self.registry.reconnect(&self.config).await.map(|_| ())
    }

    pub async fn is_connected(&self) -> bool {
        self.registry.is_connected(&self.url()).await
    }
}

impl<D: Driver> Clone for ConnectionRef<D> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            config: self.config.clone(),
        }
    }
}

impl<D: Driver> std::fmt::Debug for ConnectionRef<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRef")
            .field("url", &self.config.masked_url())
            .field("database", &self.config.database)
            .finish_non_exhaustive()
    }
}
