use std::{thread, time::Duration};

use colored::Colorize;
use log::{error, info, warn};
use summit_collab::{
    Collab, Config, ConfigError, Database, DatabaseError, LocalBlobStore, MemoryDatabase,
    PgDatabase, StorageError,
};
use summit_core::time;
use thiserror::Error;
use tokio::runtime::{self, Runtime};

use crate::logging::LogColor;

mod logging;

type SummitCollab<Db> = Collab<Db, LocalBlobStore>;

#[derive(Debug, Error)]
enum SummitError {
    #[error("Could not read configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Could not initialize database: {0}")]
    Database(#[from] DatabaseError),

    #[error("Could not initialize file storage: {0}")]
    Storage(#[from] StorageError),

    #[error("Fatal error: {0}")]
    Fatal(String),
}

impl SummitError {
    fn hint(&self) -> String {
        match self {
            SummitError::Config(_) => {
                "Check the SUMMIT_* environment variables and try again.".to_string()
            }
            SummitError::Database(_) => {
                "This is a database error. Make sure SUMMIT_DATABASE_URL points to a running \
                Postgres instance, then try again."
                    .to_string()
            }
            SummitError::Storage(_) => "Make sure SUMMIT_BLOB_BASE_URL is a valid URL.".to_string(),
            SummitError::Fatal(_) => "This error is fatal, and should not happen.".to_string(),
        }
    }
}

fn start() -> Result<(), SummitError> {
    info!("Reading configuration...");
    let config = Config::from_env()?;
    let interval = config.scheduler_interval;

    info!("Building async runtime...");
    let runtime = runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("summit-async")
        .build()
        .map_err(|e| SummitError::Fatal(e.to_string()))?;

    let storage = LocalBlobStore::new(&config.storage)?;

    match config.database_url.clone() {
        Some(url) => {
            info!("Connecting to database...");
            let database = runtime.block_on(PgDatabase::new(&url))?;

            run(Collab::new(config, database, storage), runtime, interval);
        }
        None => {
            warn!("SUMMIT_DATABASE_URL is not set, data is kept in memory and lost on exit");

            run(
                Collab::new(config, MemoryDatabase::default(), storage),
                runtime,
                interval,
            );
        }
    }

    Ok(())
}

/// Runs the goal room scheduler every `interval` until interrupted
fn run<Db>(collab: SummitCollab<Db>, runtime: Runtime, interval: Duration)
where
    Db: Database,
{
    let events = collab.events();
    thread::spawn(move || logging::log_events(events));

    info!("Initialized successfully.");

    runtime.block_on(async move {
        let mut ticker = tokio::time::interval(interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(error) = collab.scheduler.run(time::today()).await {
                        error!("Scheduler run failed: {}", error);
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutting down...");
                    break;
                }
            }
        }
    });
}

fn main() {
    logging::init_logger();

    if let Err(error) = start() {
        error!(
            "{} Read the error below to troubleshoot the issue.",
            "Summit failed to start!".bold().color(LogColor::Red)
        );
        error!("{}", error);
        error!(
            "{}",
            format!("Hint: {}", error.hint())
                .color(LogColor::BrightBlack)
                .italic()
        );
    }
}
