//! # Futsal Booking Core
//!
//! Core types and pure rules of the futsal booking status engine.
//!
//! For every (player, game) pair the engine tracks a participation status.
//! Status changes are appended to an immutable ledger; the current status of a
//! pair is the status of its most recent entry.
//!
//! ## Modules
//!
//! - [`status`]: the six-status vocabulary and the booked subset
//! - [`types`]: players, games, absence records
//! - [`ledger`]: the append-only [`BookingLedger`] trait
//! - [`directory`]: storage of players, games and absences
//! - [`roster`]: latest-state resolution and capacity accounting
//! - [`transition`]: the player-action state table
//! - [`absence`]: the absence reconciliation rule
//! - [`environment`]: injected [`Clock`] and [`Notifier`]
//!
//! Everything in this crate except the storage traits is pure; orchestration
//! lives in `futsal-booking-runtime`.
//!
//! ## Example
//!
//! ```
//! use futsal_booking_core::status::BookingStatus;
//! use futsal_booking_core::transition::{next_status, Transition};
//!
//! let next = next_status(Some(BookingStatus::Planned), false, false).unwrap();
//! assert_eq!(next, Transition::Move(BookingStatus::Cancelled));
//! ```

use std::future::Future;
use std::pin::Pin;

pub mod absence;
pub mod directory;
pub mod environment;
pub mod ledger;
pub mod roster;
pub mod status;
pub mod transition;
pub mod types;

pub use chrono::{DateTime, NaiveDate, Utc};
pub use directory::Directory;
pub use environment::{ChangeCause, Clock, NotificationError, Notifier, StatusChange, SystemClock};
pub use ledger::{
    BookingEntry, BookingLedger, Expected, LedgerError, NewBookingEntry, Revision, Sequence,
};
pub use roster::{GameRoster, Order};
pub use status::BookingStatus;
pub use transition::{Transition, TransitionError};
pub use types::{
    AbsenceId, AbsenceRecord, DateRange, DateRangeError, DisplayNameMode, Game, GameId,
    GameStatus, NewAbsence, NewGame, NewPlayer, Player, PlayerId, Tier,
};

/// Boxed, sendable future returned by the storage and notifier traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
