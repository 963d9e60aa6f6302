//! Error types for mongo-motors.
//!
//! All failures are returned to the immediate caller; nothing here is
//! retried or swallowed internally. URLs embedded in error messages are
//! masked, while the `url` fields keep the raw URL that was attempted.

use crate::config::mask_url;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MotorError {
    #[error("Failed to cast environment variable for '{field}' to {target}: {value:?}")]
    ConfigCast {
        field: String,
        /// Name of the type the value was cast to, e.g. "u16".
        target: String,
        value: String,
    },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Failed to connect to MongoDB at {}: {message}", mask_url(.url))]
    Connection { url: String, message: String },

    #[error("Failed to create session for MongoDB at {}: {message}", mask_url(.url))]
    SessionCreation {
        url: String,
        message: String,
        /// False when the database could not be selected; only a failed
        /// connection step can succeed on a later attempt.
        retryable: bool,
    },
}

impl MotorError {
    /// Create a config cast error.
    pub fn config_cast(
        field: impl Into<String>,
        target: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::ConfigCast {
            field: field.into(),
            target: target.into(),
            value: value.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a connection error for the given URL.
    pub fn connection(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a session creation error for a failed connection step.
    pub fn session_creation(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SessionCreation {
            url: url.into(),
            message: message.into(),
            retryable: true,
        }
    }

    /// Create a session creation error for a database that cannot be selected.
    pub fn database_selection(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SessionCreation {
            url: url.into(),
            message: message.into(),
            retryable: false,
        }
    }

    /// The URL this error refers to, if any.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Connection { url, .. } | Self::SessionCreation { url, .. } => Some(url),
            _ => None,
        }
    }

    /// Check if calling create-or-reuse again may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection { .. } => true,
            Self::SessionCreation { retryable, .. } => *retryable,
            _ => false,
        }
    }
}

/// Result type alias for registry and config operations.
pub type MotorResult<T> = Result<T, MotorError>;

/// Failure reported by a [`Driver`](crate::db::Driver) call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct DriverError {
    pub message: String,
}

impl DriverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<mongodb::error::Error> for DriverError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::new(err.to_string())
    }
}
