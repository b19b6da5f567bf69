use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use reservd::application::engine::ReservationEngine;
use reservd::application::sweeper::ExpirySweeper;
use reservd::config::{DEFAULT_HOLD_MINUTES, DEFAULT_SWEEP_INTERVAL_SECS, EngineConfig};
use reservd::domain::ports::ReservationStoreBox;
use reservd::domain::reservation::ReservationId;
use reservd::infrastructure::in_memory::InMemoryReservationStore;
#[cfg(feature = "storage-rocksdb")]
use reservd::infrastructure::rocksdb::RocksDBReservationStore;
use reservd::interfaces::csv::request_reader::RequestReader;
use reservd::interfaces::csv::reservation_writer::ReservationWriter;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, env = "RESERVD_DB_PATH", global = true)]
    db_path: Option<PathBuf>,

    /// Minutes a new reservation holds its item.
    #[arg(long, env = "RESERVD_HOLD_MINUTES", default_value_t = DEFAULT_HOLD_MINUTES, global = true)]
    hold_minutes: i64,

    /// Seconds between two expiry sweeps in `watch` mode.
    #[arg(long, env = "RESERVD_SWEEP_INTERVAL_SECS", default_value_t = DEFAULT_SWEEP_INTERVAL_SECS, global = true)]
    sweep_interval_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply create/cancel/complete requests from a CSV file and print the reservations they touched
    Batch {
        /// Input requests CSV file
        input: PathBuf,
    },
    /// Print all reservations of a user, most recent first
    List {
        /// User id
        user: i64,
    },
    /// Expire lapsed reservations once and print how many were expired
    Sweep,
    /// Keep expiring lapsed reservations until interrupted
    Watch {
        /// Stop after this many seconds instead of waiting for Ctrl-C
        #[arg(long)]
        for_secs: Option<u64>,
    },
    /// Check that the store is reachable
    Health,
}

fn open_store(db_path: Option<PathBuf>) -> reservd::error::Result<ReservationStoreBox> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            tracing::info!("Using RocksDB storage at {}", path.display());
            Ok(Box::new(RocksDBReservationStore::open(path)?))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            tracing::warn!(
                "Persistent storage requested via --db-path, but the 'storage-rocksdb' feature is not enabled. Falling back to in-memory storage."
            );
            Ok(Box::new(InMemoryReservationStore::new()))
        }
        None => Ok(Box::new(InMemoryReservationStore::new())),
    }
}

/// Resolves on Ctrl-C, or once `for_secs` have elapsed when given.
async fn shutdown_signal(for_secs: Option<u64>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
    };
    match for_secs {
        Some(secs) => {
            tokio::select! {
                _ = ctrl_c => {}
                _ = tokio::time::sleep(Duration::from_secs(secs)) => {}
            }
        }
        None => ctrl_c.await,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reservd=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(io::stderr().is_terminal()),
        )
        .init();

    let cli = Cli::parse();

    let config = EngineConfig::from_parts(cli.hold_minutes, cli.sweep_interval_secs).into_diagnostic()?;
    let store = open_store(cli.db_path).into_diagnostic()?;
    let engine = ReservationEngine::new(store).with_config(config);

    match cli.command {
        Command::Batch { input } => {
            let file = File::open(input).into_diagnostic()?;
            let reader = RequestReader::new(file);

            let mut touched: BTreeSet<ReservationId> = BTreeSet::new();
            for request in reader.requests() {
                match request {
                    Ok(request) => match request.apply(&engine).await {
                        Ok(id) => {
                            touched.insert(id);
                        }
                        Err(e) => tracing::error!("Error processing request: {}", e),
                    },
                    Err(e) => tracing::error!("Error reading request: {}", e),
                }
            }

            let mut reservations = Vec::with_capacity(touched.len());
            for id in touched {
                reservations.push(engine.get(id).await.into_diagnostic()?);
            }

            let stdout = io::stdout();
            let mut writer = ReservationWriter::new(stdout.lock());
            writer.write_reservations(reservations).into_diagnostic()?;
        }
        Command::List { user } => {
            let reservations = engine.list_by_user(user).await.into_diagnostic()?;
            let stdout = io::stdout();
            let mut writer = ReservationWriter::new(stdout.lock());
            writer.write_reservations(reservations).into_diagnostic()?;
        }
        Command::Sweep => {
            let expired = engine.sweep().await.into_diagnostic()?;
            println!("{}", expired);
        }
        Command::Watch { for_secs } => {
            let sweeper = ExpirySweeper::from_engine(Arc::new(engine));
            tracing::info!("Expiry sweeper running every {}s", cli.sweep_interval_secs);
            let expired = sweeper.run(shutdown_signal(for_secs)).await;
            println!("{}", expired);
        }
        Command::Health => {
            engine.health().await.into_diagnostic()?;
            println!("ok");
        }
    }

    Ok(())
}
