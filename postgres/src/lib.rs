//! `PostgreSQL` storage for the futsal booking engine.
//!
//! [`PostgresBookingStore`] implements both [`BookingLedger`] and
//! [`Directory`] from `futsal-booking-core` over one connection pool:
//!
//! - Append-only `booking_entries` with a global `sequence` and a per-pair
//!   `revision` guarded by a unique constraint (optimistic concurrency)
//! - `players`, `games` and `absences` tables for the directory
//! - Embedded migrations and a startup check of the persisted status
//!   vocabulary
//!
//! # Example
//!
//! ```ignore
//! use futsal_booking_postgres::PostgresBookingStore;
//! use std::time::Duration;
//!
//! let store = PostgresBookingStore::connect(
//!     "postgres://localhost/futsal",
//!     5,
//!     Duration::from_secs(30),
//! )
//! .await?;
//! store.migrate().await?;
//! store.verify_vocabulary().await?;
//! ```
//!
//! [`BookingLedger`]: futsal_booking_core::BookingLedger
//! [`Directory`]: futsal_booking_core::Directory

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use futsal_booking_core::status::vocabulary_mismatch;
use futsal_booking_core::LedgerError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

mod directory;
mod ledger;

/// Booking ledger and directory backed by `PostgreSQL`.
#[derive(Clone, Debug)]
pub struct PostgresBookingStore {
    pool: PgPool,
}

impl PostgresBookingStore {
    /// Connect with a fresh pool.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::DatabaseError`] if the connection fails.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, LedgerError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await
            .map_err(|e| LedgerError::DatabaseError(format!("Failed to connect: {e}")))?;

        tracing::info!(max_connections, "Connected to PostgreSQL");
        Ok(Self::from_pool(pool))
    }

    /// Wrap an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::DatabaseError`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), LedgerError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| LedgerError::DatabaseError(format!("Migration failed: {e}")))?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    /// Check that the persisted status vocabulary matches the code.
    ///
    /// Run at startup; a mismatch is fatal.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Vocabulary`] when statuses are missing or unknown
    /// - [`LedgerError::DatabaseError`] if the query fails
    pub async fn verify_vocabulary(&self) -> Result<(), LedgerError> {
        let names: Vec<(String,)> = sqlx::query_as("SELECT name FROM booking_statuses")
            .fetch_all(&self.pool)
            .await
            .map_err(database_error)?;

        let (missing, unknown) = vocabulary_mismatch(names.iter().map(|(name,)| name.as_str()));
        if missing.is_empty() && unknown.is_empty() {
            return Ok(());
        }

        tracing::error!(?missing, ?unknown, "Status vocabulary mismatch");
        Err(LedgerError::Vocabulary { missing, unknown })
    }
}

pub(crate) fn database_error(err: sqlx::Error) -> LedgerError {
    LedgerError::DatabaseError(err.to_string())
}

/// Name of the constraint a database error violated, if any.
pub(crate) fn violated_constraint(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) => db_err.constraint().map(str::to_string),
        _ => None,
    }
}

pub(crate) fn to_i64(value: u64, what: &str) -> Result<i64, LedgerError> {
    i64::try_from(value).map_err(|_| LedgerError::DatabaseError(format!("{what} {value} out of range")))
}

pub(crate) fn to_u64(value: i64, what: &str) -> Result<u64, LedgerError> {
    u64::try_from(value).map_err(|_| LedgerError::DatabaseError(format!("Negative {what}: {value}")))
}

pub(crate) fn parse_column<T>(value: &str, column: &str) -> Result<T, LedgerError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| LedgerError::DatabaseError(format!("Bad {column} column: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futsal_booking_core::BookingStatus;

    #[test]
    fn conversions_reject_out_of_range_values() {
        assert_eq!(to_i64(7, "revision").ok(), Some(7));
        assert!(to_i64(u64::MAX, "revision").is_err());
        assert!(to_u64(-1, "sequence").is_err());
    }

    #[test]
    fn columns_parse_through_from_str() {
        let status: Result<BookingStatus, _> = parse_column("awaiting", "status");
        assert_eq!(status.ok(), Some(BookingStatus::Awaiting));
        assert!(parse_column::<BookingStatus>("waiting", "status").is_err());
    }
}
