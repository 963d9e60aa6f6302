//! Per-URL connection registry.
//!
//! # Concurrency
//!
//! - The slot table is a `tokio::sync::RwLock<HashMap<..>>` held only long
//!   enough to look up or insert a slot, never across a driver call.
//! - Each slot owns a `tokio::sync::Mutex` that serializes dial, close and
//!   reconnect for its URL, so one URL never has two dials in flight.
//! - The handle itself sits behind a `std::sync::RwLock` that is never held
//!   across an await point. Callers that find a handle there return without
//!   touching the slot mutex.
//!
//! No timeout is applied to driver calls. A dial that never completes blocks
//! every later caller for the same URL; wrap calls in `tokio::time::timeout`
//! when bounded waits matter. Other URLs are unaffected.

use crate::config::{MongoConfig, mask_url};
use crate::db::client::ConnectionRef;
use crate::db::driver::Driver;
use crate::error::{MotorError, MotorResult};
use futures_util::future::join_all;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Registry entry for one URL: at most one handle plus its guard.
struct Slot<H> {
    lock: Mutex<()>,
    handle: std::sync::RwLock<Option<H>>,
}

impl<H: Clone> Slot<H> {
    fn new() -> Self {
        Self {
            lock: Mutex::new(()),
            handle: std::sync::RwLock::new(None),
        }
    }

    /// Current handle, if connected. Synchronous - does not hold locks across await.
    fn current(&self) -> Option<H> {
        self.handle
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn store(&self, handle: H) {
        *self.handle.write().unwrap_or_else(PoisonError::into_inner) = Some(handle);
    }

    fn take(&self) -> Option<H> {
        self.handle
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

/// Deduplicated pool of driver connections, one per distinct URL.
///
/// Share it as `Arc<ConnectionRegistry<D>>`; every clone of the `Arc` sees
/// the same connections.
pub struct ConnectionRegistry<D: Driver> {
    driver: D,
    slots: RwLock<HashMap<String, Arc<Slot<D::Handle>>>>,
}

impl<D: Driver> ConnectionRegistry<D> {
    /// Create an empty registry over `driver`.
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// The driver this registry dials through.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Return a reference to the connection for `config`, connecting first
    /// if needed. With `None`, the config is resolved from the environment.
    pub async fn create(
        self: &Arc<Self>,
        config: Option<MongoConfig>,
    ) -> MotorResult<ConnectionRef<D>> {
        let config = match config {
            Some(config) => config,
            None => MongoConfig::from_env()?,
        };
        let connection = self.connection(config);
        connection.connect().await?;
        Ok(connection)
    }

    /// Return a reference to the connection for `config` without connecting.
    pub fn connection(self: &Arc<Self>, config: MongoConfig) -> ConnectionRef<D> {
        ConnectionRef::new(Arc::clone(self), config)
    }

    /// Get the connected handle for `config`'s URL, dialing if there is none.
    ///
    /// Concurrent callers for the same URL share a single dial. On failure
    /// the slot is left empty, so a later call dials again.
    pub async fn get_or_create(&self, config: &MongoConfig) -> MotorResult<D::Handle> {
        let url = config.get_url();
        let slot = self.slot(&url).await;

        if let Some(handle) = slot.current() {
            debug!(url = %mask_url(&url), "Reusing connection");
            return Ok(handle);
        }

        let _guard = slot.lock.lock().await;

        // Another caller may have connected while we waited
        if let Some(handle) = slot.current() {
            debug!(url = %mask_url(&url), "Connection established by concurrent caller");
            return Ok(handle);
        }

        let handle = self.establish(&url).await?;
        slot.store(handle.clone());
        Ok(handle)
    }

    /// Close and forget the handle for `url`. No-op if there is none.
    ///
    /// Waits for any dial in flight for the same URL to finish first.
    pub async fn disconnect(&self, url: &str) {
        let Some(slot) = self.existing_slot(url).await else {
            return;
        };

        let _guard = slot.lock.lock().await;
        if let Some(handle) = slot.take() {
            self.driver.close(handle).await;
            info!(url = %mask_url(url), "Disconnected");
        }
    }

    /// Replace the handle for `config`'s URL with a freshly dialed one.
    ///
    /// The slot mutex is held across close and dial, so concurrent callers
    /// wait for the new handle instead of dialing themselves. On failure the
    /// slot is left empty and the old handle is already closed.
    pub async fn reconnect(&self, config: &MongoConfig) -> MotorResult<D::Handle> {
        let url = config.get_url();
        let slot = self.slot(&url).await;

        let _guard = slot.lock.lock().await;
        if let Some(old) = slot.take() {
            self.driver.close(old).await;
            debug!(url = %mask_url(&url), "Closed connection for reconnect");
        }

        let handle = self.establish(&url).await?;
        slot.store(handle.clone());
        info!(url = %mask_url(&url), "Reconnected");
        Ok(handle)
    }

    /// Check if `url` currently has a connected handle.
    pub async fn is_connected(&self, url: &str) -> bool {
        self.existing_slot(url)
            .await
            .is_some_and(|slot| slot.current().is_some())
    }

    /// List URLs with a connected handle.
    pub async fn urls(&self) -> Vec<String> {
        let slots = self.slots.read().await;
        slots
            .iter()
            .filter(|(_, slot)| slot.current().is_some())
            .map(|(url, _)| url.clone())
            .collect()
    }

    /// Get the number of connected handles.
    pub async fn connection_count(&self) -> usize {
        let slots = self.slots.read().await;
        slots
            .values()
            .filter(|slot| slot.current().is_some())
            .count()
    }

    /// Close every connected handle. Slots stay registered and reconnect
    /// on their next use.
    pub async fn close_all(&self) {
        // Snapshot under the table lock, close outside it
        let slots: Vec<(String, Arc<Slot<D::Handle>>)> = {
            let slots = self.slots.read().await;
            slots
                .iter()
                .map(|(url, slot)| (url.clone(), Arc::clone(slot)))
                .collect()
        };

        join_all(slots.iter().map(|(url, slot)| async move {
            let _guard = slot.lock.lock().await;
            if let Some(handle) = slot.take() {
                info!(url = %mask_url(url), "Closing connection");
                self.driver.close(handle).await;
            }
        }))
        .await;

        info!("All connections closed");
    }

    /// Dial and probe `url`. A handle that fails the probe is closed before
    /// the error is returned.
    async fn establish(&self, url: &str) -> MotorResult<D::Handle> {
        info!(url = %mask_url(url), "Connecting to MongoDB");

        let handle = self.driver.dial(url).await.map_err(|e| {
            warn!(url = %mask_url(url), error = %e, "Dial failed");
            MotorError::connection(url, e.to_string())
        })?;

        if let Err(e) = self.driver.probe(&handle).await {
            warn!(url = %mask_url(url), error = %e, "Liveness probe failed");
            self.driver.close(handle).await;
            return Err(MotorError::connection(url, e.to_string()));
        }

        info!(url = %mask_url(url), "Connected successfully");
        Ok(handle)
    }

    /// Get the slot for `url`, inserting an empty one if absent.
    async fn slot(&self, url: &str) -> Arc<Slot<D::Handle>> {
        if let Some(slot) = self.existing_slot(url).await {
            return slot;
        }

        let mut slots = self.slots.write().await;
        // Double-check after acquiring write lock
        let slot = slots.entry(url.to_string()).or_insert_with(|| {
            debug!(url = %mask_url(url), "Registering connection slot");
            Arc::new(Slot::new())
        });
        Arc::clone(slot)
    }

    async fn existing_slot(&self, url: &str) -> Option<Arc<Slot<D::Handle>>> {
        let slots = self.slots.read().await;
        slots.get(url).map(Arc::clone)
    }
}

impl<D: Driver + Default> Default for ConnectionRegistry<D> {
    fn default() -> Self {
        Self::new(D::default())
    }
}

impl<D: Driver + std::fmt::Debug> std::fmt::Debug for ConnectionRegistry<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("driver", &self.driver)
            .finish_non_exhaustive()
    }
}
