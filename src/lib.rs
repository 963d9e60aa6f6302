//! mongo-motors
//!
//! An asynchronous registry of MongoDB connections keyed by connection URL.
//! Each distinct URL gets at most one connection, established lazily and
//! exactly once even under concurrent first use, plus scoped sessions that
//! select a database on the shared connection.

pub mod config;
pub mod db;
pub mod error;

pub use config::MongoConfig;
pub use db::{
    ConnectionRef, ConnectionRegistry, Driver, MongoConnection, MongoDriver, MongoRegistry, Session,
};
pub use error::{DriverError, MotorError, MotorResult};
