//! [`Driver`] implementation on the official `mongodb` crate.

use crate::db::driver::{Driver, DriverResult};
use crate::error::DriverError;
use mongodb::bson::doc;
use mongodb::{Client, Database};
use std::future::Future;
use tracing::debug;

/// Production driver. Each handle is a [`mongodb::Client`], which keeps its
/// own internal socket pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct MongoDriver;

impl MongoDriver {
    pub fn new() -> Self {
        Self
    }
}

impl Driver for MongoDriver {
    type Handle = Client;
    type Database = Database;

    fn dial(&self, url: &str) -> impl Future<Output = DriverResult<Client>> + Send {
        let url = url.to_string();
        async move { Client::with_uri_str(&url).await.map_err(DriverError::from) }
    }

    fn probe(&self, handle: &Client) -> impl Future<Output = DriverResult<()>> + Send {
        let admin = handle.database("admin");
        async move {
            let reply = admin
                .run_command(doc! { "ping": 1 })
                .await
                .map_err(DriverError::from)?;
            debug!(reply = %reply, "Ping succeeded");
            Ok::<(), DriverError>(())
        }
    }

    fn close(&self, handle: Client) -> impl Future<Output = ()> + Send {
        // Sessions may still hold cursors; do not wait for them.
        async move { handle.shutdown().immediate(true).await }
    }

    fn select_database(&self, handle: &Client, name: Option<&str>) -> DriverResult<Database> {
        match name {
            Some(name) => Ok(handle.database(name)),
            None => handle.default_database().ok_or_else(|| {
                DriverError::new("no database configured and the connection URL names none")
            }),
        }
    }
}
