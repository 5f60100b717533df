//! # Futsal Booking Runtime
//!
//! The booking status engine on top of `futsal-booking-core`.
//!
//! [`BookingEngine`] owns the injected environment (ledger, directory,
//! notifier, clock) and runs every state change through the same
//! read-decide-append loop:
//!
//! - player actions follow the transition table
//! - a queue-promotion sweep confirms at most one awaiting player afterwards
//! - absences are reconciled into every game they cover
//! - new games are seeded by tier and re-scanned for active absences
//!
//! Writes to one game are serialized by a per-game lock; writes to different
//! games run in parallel. Storage-level revision conflicts are retried with
//! backoff. Notifications go out after the lock is released, and failures
//! land in a [`DeadLetterQueue`] instead of failing the caller.
//!
//! ## Example
//!
//! ```ignore
//! let engine = BookingEngine::new(
//!     BookingEnvironment::new(store.clone(), store, notifier, Arc::new(SystemClock)),
//!     EngineConfig::default(),
//! );
//!
//! let game = engine.create_game(NewGame::planned(date, "Friday"), true).await?;
//! let outcome = engine.apply_player_action(player, game.id, false).await?;
//! ```

use futsal_booking_core::{BookingLedger, Clock, Directory, Notifier};
use std::sync::Arc;

mod absence;
mod engine;
mod locks;
mod queries;
mod registry;

/// Notification dead letter queue
pub mod dead_letter;

/// Caller-facing errors
pub mod error;

/// Metric names and Prometheus exporter
pub mod metrics;

/// Retry with exponential backoff
pub mod retry;

pub use dead_letter::{Audience, DeadLetter, DeadLetterQueue};
pub use engine::{ActionOutcome, BookingEngine};
pub use error::BookingError;
pub use queries::GameSummary;
pub use registry::{MIN_NAME_FILTER_LEN, MOBILE_NUMBER_DIGITS, TierCounts, validate_new_player};
pub use retry::RetryPolicy;

/// Capabilities the engine depends on.
#[derive(Clone)]
pub struct BookingEnvironment {
    /// Append-only booking history
    pub ledger: Arc<dyn BookingLedger>,
    /// Players, games and absences
    pub directory: Arc<dyn Directory>,
    /// Status change announcements
    pub notifier: Arc<dyn Notifier>,
    /// Source of timestamps
    pub clock: Arc<dyn Clock>,
}

impl BookingEnvironment {
    /// Bundles the engine's capabilities.
    #[must_use]
    pub fn new(
        ledger: Arc<dyn BookingLedger>,
        directory: Arc<dyn Directory>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            ledger,
            directory,
            notifier,
            clock,
        }
    }
}

/// Engine tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Retry policy for conflicting appends
    pub retry: RetryPolicy,
    /// Capacity of the notification dead letter queue
    pub dead_letter_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            dead_letter_capacity: 1000,
        }
    }
}
