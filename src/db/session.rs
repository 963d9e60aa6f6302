//! Scoped database sessions.
//!
//! A session pairs a selected database with the URL of the shared
//! connection it runs on. The connection belongs to the registry, so ending
//! a session never closes it.

use crate::config::mask_url;
use crate::db::client::ConnectionRef;
use crate::db::driver::Driver;
use crate::error::{MotorError, MotorResult};
use std::future::Future;
use tracing::{Instrument, debug, debug_span};

/// A database reference on an established connection.
pub struct Session<D: Driver> {
    database: D::Database,
    url: String,
}

impl<D: Driver> Session<D> {
    pub fn database(&self) -> &D::Database {
        &self.database
    }

    pub fn into_database(self) -> D::Database {
        self.database
    }

    /// URL of the connection this session runs on.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl<D: Driver> std::fmt::Debug for Session<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("url", &mask_url(&self.url))
            .finish_non_exhaustive()
    }
}

impl<D: Driver> ConnectionRef<D> {
    /// Run `f` with a session on this connection, connecting first if needed.
    ///
    /// Failures to connect or to select the database are returned as
    /// [`MotorError::SessionCreation`] and `f` is not called. Whatever `f`
    /// returns, including its own errors, is passed through untouched.
    ///
    /// ```ignore
    /// let count = mongo
    ///     .with_session(|session| async move {
    ///         session.database().collection::<Document>("users").count_documents(doc! {}).await
    ///     })
    ///     .await??;
    /// ```
    pub async fn with_session<F, Fut, T>(&self, f: F) -> MotorResult<T>
    where
        F: FnOnce(Session<D>) -> Fut,
        Fut: Future<Output = T>,
    {
        let session = self.session().await?;
        let span = debug_span!("session", url = %mask_url(session.url()));
        Ok(f(session).instrument(span).await)
    }

    /// Open a session without a scoped block.
    pub async fn session(&self) -> MotorResult<Session<D>> {
        let url = self.url();

        let handle = self
            .handle()
            .await
            .map_err(|e| MotorError::session_creation(&url, e.to_string()))?;

        let database = self
            .registry()
            .driver()
            .select_database(&handle, self.config().database.as_deref())
            .map_err(|e| MotorError::database_selection(&url, e.to_string()))?;

        debug!(
            url = %mask_url(&url),
            database = ?self.config().database,
            "Session opened"
        );

        Ok(Session { database, url })
    }
}
