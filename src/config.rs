//! Connection configuration.
//!
//! A [`MongoConfig`] is built from explicitly supplied fields, falling back
//! to `MONGO_*` environment variables and then to fixed defaults.

use crate::error::{MotorError, MotorResult};
use clap::Parser;
use serde::{Deserialize, Serialize};
use url::Url;

pub const ENV_HOST: &str = "MONGO_HOST";
pub const ENV_PORT: &str = "MONGO_PORT";
pub const ENV_DATABASE: &str = "MONGO_DB";
pub const ENV_USER: &str = "MONGO_USER";
pub const ENV_PASSWORD: &str = "MONGO_PASSWORD";

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 27017;
pub const DEFAULT_DATABASE: &str = "mydatabase";
pub const DEFAULT_LOG_LEVEL: &str = "info";

const MASK: &str = "****";
const URL_SCHEMES: &[&str] = &["mongodb://", "mongodb+srv://"];

/// Configuration for one MongoDB deployment.
///
/// Two configs with the same [`get_url`](Self::get_url) share one connection
/// in a [`ConnectionRegistry`](crate::db::ConnectionRegistry).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MongoConfig {
    pub host: String,
    pub port: u16,
    /// Database selected by sessions. `None` uses the driver's default
    /// database taken from the URL path.
    pub database: Option<String>,
    pub user: Option<String>,
    /// Contains sensitive data - never log
    #[serde(skip_serializing)]
    pub password: Option<String>,
    /// Pre-built connection URL. Takes precedence over host/port/credentials.
    pub url: Option<String>,
}

impl MongoConfig {
    /// Create a config for `host:port` with no database and no credentials.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            database: None,
            user: None,
            password: None,
            url: None,
        }
    }

    /// Start building a config whose missing fields are resolved from the environment.
    pub fn builder() -> MongoConfigBuilder {
        MongoConfigBuilder::default()
    }

    /// Resolve a config entirely from the environment and defaults.
    pub fn from_env() -> MotorResult<Self> {
        Self::builder().resolve()
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Build the connection URL.
    ///
    /// Credentials are embedded only when both user and password are
    /// non-empty, and are not percent-encoded: a user or password containing `:`, `@`
    /// or `/` yields a URL the driver will reject or misread.
    pub fn get_url(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }
        match (&self.user, &self.password) {
            (Some(user), Some(password)) if !user.is_empty() && !password.is_empty() => format!(
                "mongodb://{}:{}@{}:{}",
                user, password, self.host, self.port
            ),
            _ => format!("mongodb://{}:{}", self.host, self.port),
        }
    }

    /// [`get_url`](Self::get_url) with the password replaced, safe for logs.
    pub fn masked_url(&self) -> String {
        mask_url(&self.get_url())
    }
}

impl std::fmt::Debug for MongoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MongoConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| MASK))
            .field("url", &self.url.as_deref().map(mask_url))
            .finish()
    }
}

/// Renders as indented JSON including the (masked) effective URL.
impl std::fmt::Display for MongoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let attributes = serde_json::json!({
            "host": self.host,
            "port": self.port,
            "database": self.database,
            "user": self.user,
            "password": self.password.as_ref().map(|_| MASK),
            "url": self.masked_url(),
        });
        let body = serde_json::to_string_pretty(&attributes).map_err(|_| std::fmt::Error)?;
        write!(f, "MongoConfig {}", body)
    }
}

/// Explicitly supplied config fields. Anything left unset is resolved from
/// the environment, then from defaults.
#[derive(Debug, Clone, Default)]
pub struct MongoConfigBuilder {
    host: Option<String>,
    port: Option<u16>,
    database: Option<String>,
    user: Option<String>,
    password: Option<String>,
    url: Option<String>,
}

impl MongoConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// An empty name means "no configured database".
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Resolve against the process environment.
    pub fn resolve(self) -> MotorResult<MongoConfig> {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    /// Resolve against an arbitrary variable lookup.
    pub fn resolve_with<F>(self, lookup: F) -> MotorResult<MongoConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty variables are treated as unset
        let env = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let port = match self.port {
            Some(port) => port,
            None => match env(ENV_PORT) {
                Some(raw) => raw
                    .trim()
                    .parse::<u16>()
                    .map_err(|_| MotorError::config_cast("port", "u16", raw.as_str()))?,
                None => DEFAULT_PORT,
            },
        };

        if let Some(url) = &self.url
            && !URL_SCHEMES.iter().any(|scheme| url.starts_with(scheme))
        {
            return Err(MotorError::invalid_config(format!(
                "URL override must start with mongodb:// or mongodb+srv://, got '{}'",
                mask_url(url)
            )));
        }

        let database = self
            .database
            .or_else(|| env(ENV_DATABASE))
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());

        Ok(MongoConfig {
            host: self
                .host
                .or_else(|| env(ENV_HOST))
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            database: Some(database).filter(|db| !db.is_empty()),
            user: self.user.or_else(|| env(ENV_USER)),
            password: self.password.or_else(|| env(ENV_PASSWORD)),
            url: self.url,
        })
    }
}

/// Command-line arguments for the `mongo-motors` connectivity checker.
///
/// Connection flags left unset fall back to the `MONGO_*` environment
/// variables and then to defaults, exactly like [`MongoConfig::builder`].
#[derive(Debug, Clone, Parser)]
#[command(
    name = "mongo-motors",
    about = "Check that a MongoDB deployment is reachable with the resolved configuration",
    version
)]
pub struct Cli {
    /// Server host [env: MONGO_HOST, default: localhost]
    #[arg(long)]
    pub host: Option<String>,

    /// Server port [env: MONGO_PORT, default: 27017]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Database to select [env: MONGO_DB, default: mydatabase]
    #[arg(short, long)]
    pub database: Option<String>,

    /// User name, embedded only together with a password [env: MONGO_USER]
    #[arg(short, long)]
    pub user: Option<String>,

    /// Password [env: MONGO_PASSWORD]
    #[arg(long)]
    pub password: Option<String>,

    /// Full connection URL, overriding host, port and credentials
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = DEFAULT_LOG_LEVEL, env = "MOTORS_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "MOTORS_JSON_LOGS")]
    pub json_logs: bool,

    /// Enable logging output (only the result line is printed otherwise)
    #[arg(long, env = "MOTORS_ENABLE_LOGS")]
    pub enable_logs: bool,
}

impl Cli {
    /// Explicit connection fields given on the command line.
    pub fn builder(&self) -> MongoConfigBuilder {
        let mut builder = MongoConfig::builder();
        if let Some(host) = &self.host {
            builder = builder.host(host);
        }
        if let Some(port) = self.port {
            builder = builder.port(port);
        }
        if let Some(database) = &self.database {
            builder = builder.database(database);
        }
        if let Some(user) = &self.user {
            builder = builder.user(user);
        }
        if let Some(password) = &self.password {
            builder = builder.password(password);
        }
        if let Some(url) = &self.url {
            builder = builder.url(url);
        }
        builder
    }
}

/// Replace the password in a connection URL with `****`.
///
/// Falls back to plain string surgery for URLs the `url` crate rejects,
/// such as multi-host seed lists.
pub fn mask_url(raw: &str) -> String {
    if let Ok(mut url) = Url::parse(raw) {
        if url.password().is_none() {
            return raw.to_string();
        }
        if url.set_password(Some(MASK)).is_ok() {
            return url.to_string();
        }
    }

    let authority_start = raw.find("://").map(|i| i + 3).unwrap_or(0);
    if let Some(at) = raw[authority_start..].rfind('@').map(|i| i + authority_start) {
        if let Some(colon) = raw[authority_start..at].find(':').map(|i| i + authority_start) {
            return format!("{}{}{}", &raw[..=colon], MASK, &raw[at..]);
        }
    }
    raw.to_string()
}
