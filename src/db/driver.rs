//! The driver seam consumed by the connection registry.
//!
//! The registry never talks to MongoDB directly. It dials, probes, closes
//! and selects databases through a [`Driver`], which lets tests substitute
//! a scripted driver for [`MongoDriver`](super::MongoDriver).

use crate::error::DriverError;
use std::future::Future;

/// Result type alias for driver calls.
pub type DriverResult<T> = Result<T, DriverError>;

pub trait Driver: Send + Sync + 'static {
    /// A live connection. Cloning must be cheap and yield the same connection.
    type Handle: Clone + Send + Sync + 'static;

    /// A reference to one database on a connection.
    type Database: Send + 'static;

    /// Open a connection to `url`. Drivers may connect lazily; reachability
    /// is confirmed by [`probe`](Self::probe).
    fn dial(&self, url: &str) -> impl Future<Output = DriverResult<Self::Handle>> + Send;

    /// Liveness check run right after dialing.
    fn probe(&self, handle: &Self::Handle) -> impl Future<Output = DriverResult<()>> + Send;

    /// Close a connection previously returned by [`dial`](Self::dial).
    fn close(&self, handle: Self::Handle) -> impl Future<Output = ()> + Send;

    /// Select `name`, or the driver's default database when `name` is `None`.
    fn select_database(
        &self,
        handle: &Self::Handle,
        name: Option<&str>,
    ) -> DriverResult<Self::Database>;
}
