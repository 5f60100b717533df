//! Injected capabilities: time and notifications.
//!
//! The engine never reads the system clock or sends mail itself; both are
//! passed in so tests can substitute deterministic implementations.

use crate::BoxFuture;
use crate::status::BookingStatus;
use crate::types::{Game, Player};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Clock trait - abstracts time operations for testability.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;

    /// Current calendar day (UTC).
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Production clock backed by [`Utc::now`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// What produced a status change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeCause {
    /// The player toggled attendance.
    PlayerAction,
    /// The queue-promotion sweep confirmed an awaiting player.
    Promotion,
    /// An absence window was reconciled into the game.
    Absence,
    /// Default booking written when the game was created. Never announced.
    Seeding,
}

impl ChangeCause {
    /// Log and metric label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PlayerAction => "player_action",
            Self::Promotion => "promotion",
            Self::Absence => "absence",
            Self::Seeding => "seeding",
        }
    }

    /// Whether changes with this cause reach the notifier.
    #[must_use]
    pub const fn is_announced(self) -> bool {
        !matches!(self, Self::Seeding)
    }
}

/// A committed status change, as handed to a [`Notifier`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    /// Affected player
    pub player: Player,
    /// Affected game
    pub game: Game,
    /// Latest status before the append (`None` if never booked)
    pub previous: Option<BookingStatus>,
    /// Newly appended status
    pub status: BookingStatus,
    /// Origin of the change
    pub cause: ChangeCause,
}

/// Failure to deliver a notification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Notification to {recipient} failed: {reason}")]
pub struct NotificationError {
    /// Who was being notified
    pub recipient: String,
    /// Transport-specific reason
    pub reason: String,
}

impl NotificationError {
    /// Creates a notification error.
    #[must_use]
    pub fn new(recipient: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            reason: reason.into(),
        }
    }
}

/// Side-effect channel for committed status changes.
///
/// Failures are reported to the engine, which records them; they never undo
/// the ledger append that triggered them.
pub trait Notifier: Send + Sync {
    /// Tells the affected player.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError`] if delivery failed.
    fn notify_player(&self, change: &StatusChange) -> BoxFuture<'_, Result<(), NotificationError>>;

    /// Tells the admin observers.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError`] if delivery failed.
    fn notify_admins(&self, change: &StatusChange) -> BoxFuture<'_, Result<(), NotificationError>>;
}
