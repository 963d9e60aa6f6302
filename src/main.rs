//! mongo-motors - connectivity checker.
//!
//! Resolves a connection config from flags, `.env` and the environment,
//! connects through the registry, opens a session and reports the result.

use clap::Parser;
use mongo_motors::MongoRegistry;
use mongo_motors::config::Cli;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(cli: &Cli) {
    if !cli.enable_logs {
        return;
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is not an error
    let dotenv = dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli);

    if let Some(path) = dotenv {
        info!(path = %path.display(), "Loaded environment file");
    }

    let config = cli.builder().resolve()?;
    info!(
        url = %config.masked_url(),
        database = ?config.database,
        "Starting mongo-motors v{}",
        env!("CARGO_PKG_VERSION")
    );

    let registry = Arc::new(MongoRegistry::default());

    let result = async {
        let mongo = registry.create(Some(config)).await?;
        let database = mongo
            .with_session(|session| async move { session.database().name().to_string() })
            .await?;
        Ok::<_, mongo_motors::MotorError>((mongo.config().masked_url(), database))
    }
    .await;

    registry.close_all().await;

    match result {
        Ok((url, database)) => {
            println!("Connected to {} (database: {})", url, database);
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Connectivity check failed");
            Err(e.into())
        }
    }
}
