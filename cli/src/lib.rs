//! Command-line front end for the futsal booking engine.
//!
//! Wires [`PostgresBookingStore`] and a log-only notifier into a
//! [`BookingEngine`] and runs one command per invocation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use anyhow::{Context, Result};
use futsal_booking_core::SystemClock;
use futsal_booking_postgres::PostgresBookingStore;
use futsal_booking_runtime::{BookingEngine, BookingEnvironment};
use std::io::Write;
use std::sync::Arc;

pub mod commands;
pub mod config;
pub mod notifier;

pub use commands::{Cli, Command, Output, execute};
pub use config::Config;
pub use notifier::LogNotifier;

/// Engine over `store` with the system clock and a [`LogNotifier`].
#[must_use]
pub fn build_engine(store: PostgresBookingStore, config: &Config) -> BookingEngine {
    let store = Arc::new(store);
    let env = BookingEnvironment::new(
        store.clone(),
        store,
        Arc::new(LogNotifier::new(
            config.admin_emails.clone(),
            config.display_name_mode,
        )),
        Arc::new(SystemClock),
    );
    BookingEngine::new(env, config.engine_config())
}

/// Connects to the database and runs `cli`'s command.
///
/// `migrate` applies the embedded migrations; every other command first
/// checks that the stored status vocabulary matches this build.
///
/// # Errors
///
/// Returns connection, migration, vocabulary and command failures.
pub async fn run(cli: Cli, config: &Config) -> Result<()> {
    let store = PostgresBookingStore::connect(
        &config.database.url,
        config.database.max_connections,
        config.database.connect_timeout(),
    )
    .await
    .context("Failed to connect to the database")?;

    if cli.command == Command::Migrate {
        store.migrate().await?;
    }
    store
        .verify_vocabulary()
        .await
        .context("Booking status vocabulary does not match the database")?;

    let engine = build_engine(store, config);
    let settings = Output {
        today: engine.clock().now().date_naive(),
        names: config.display_name_mode,
    };
    let reports_dead_letters = cli.command != Command::DeadLetters;

    let mut stdout = std::io::stdout().lock();
    execute(cli.command, &engine, settings, &mut stdout).await?;
    stdout.flush()?;

    if reports_dead_letters {
        report_dead_letters(&engine, config)?;
    }
    Ok(())
}

/// Prints notifications that failed during this run to stderr.
fn report_dead_letters(engine: &BookingEngine, config: &Config) -> Result<()> {
    let parked = engine.dead_letters().len();
    if parked == 0 {
        return Ok(());
    }
    tracing::warn!(parked, "Some notifications could not be delivered");
    let mut stderr = std::io::stderr().lock();
    writeln!(stderr, "{parked} notification(s) failed:")?;
    commands::write_dead_letters(engine, config.display_name_mode, &mut stderr)
}
