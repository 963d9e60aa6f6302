//! Connection management.
//!
//! This module provides:
//! - The driver seam and its MongoDB implementation
//! - The per-URL connection registry
//! - Connection references and scoped sessions

pub mod client;
pub mod driver;
pub mod mongo;
pub mod registry;
pub mod session;

pub use client::ConnectionRef;
pub use driver::{Driver, DriverResult};
pub use mongo::MongoDriver;
pub use registry::ConnectionRegistry;
pub use session::Session;

/// Registry over the production MongoDB driver.
pub type MongoRegistry = ConnectionRegistry<MongoDriver>;

/// Connection reference over the production MongoDB driver.
pub type MongoConnection = ConnectionRef<MongoDriver>;
