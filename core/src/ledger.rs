//! Booking ledger trait and related types.
//!
//! The ledger is the append-only history of status entries for every
//! (player, game) pair. It is the single source of truth: the current status
//! of a pair, the booked count of a game and the awaiting queue are all pure
//! functions over ledger entries (see [`crate::roster`]).
//!
//! # Ordering
//!
//! Every entry carries two counters:
//!
//! - [`Sequence`]: global, strictly increasing in insertion order. The latest
//!   entry of a pair is the one with the highest sequence; wall-clock
//!   timestamps are never compared.
//! - [`Revision`]: the number of entries the pair has after this one was
//!   appended. Appending with an expected revision gives optimistic
//!   concurrency per pair.
//!
//! Decisions that read the whole game (the sweep, promotion on opt-in)
//! append with [`Expected::GameHead`] instead: any entry appended to the game
//! since the read makes the append fail, whichever process wrote it.
//!
//! # Implementations
//!
//! - `PostgresBookingStore` (in `futsal-booking-postgres`): durable storage
//! - `InMemoryBookingStore` (in `futsal-booking-testing`): fast, deterministic tests

use crate::BoxFuture;
use crate::status::BookingStatus;
use crate::types::{GameId, PlayerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Global insertion order of ledger entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Sequence(u64);

impl Sequence {
    /// Wraps a raw sequence number.
    #[must_use]
    pub const fn new(sequence: u64) -> Self {
        Self(sequence)
    }

    /// Returns the raw sequence number.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Number of entries recorded for one (player, game) pair.
///
/// `Revision(0)` means the pair has never been booked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Revision(u64);

impl Revision {
    /// A pair with no entries.
    pub const NONE: Self = Self(0);

    /// Wraps a raw revision.
    #[must_use]
    pub const fn new(revision: u64) -> Self {
        Self(revision)
    }

    /// Returns the raw revision.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// The revision after one more append.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Optimistic-concurrency precondition of an append.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Expected {
    /// No check.
    #[default]
    Any,
    /// The pair has exactly this many entries.
    Revision(Revision),
    /// The game's newest entry has this sequence; `None` if the game has no
    /// entries yet.
    GameHead(Option<Sequence>),
}

/// An immutable ledger entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingEntry {
    /// Global insertion order
    pub sequence: Sequence,
    /// Per-pair revision reached by this entry
    pub revision: Revision,
    /// Booked player
    pub player: PlayerId,
    /// Game the entry applies to
    pub game: GameId,
    /// Status recorded by this entry
    pub status: BookingStatus,
    /// Wall-clock time of the append (display only)
    pub created_at: DateTime<Utc>,
}

/// An entry about to be appended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NewBookingEntry {
    /// Booked player
    pub player: PlayerId,
    /// Game the entry applies to
    pub game: GameId,
    /// Status to record
    pub status: BookingStatus,
    /// Wall-clock time of the append
    pub created_at: DateTime<Utc>,
}

/// Errors raised by ledger and directory storage.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The pair moved past the revision the caller decided on.
    #[error("Concurrency conflict for player {player} in game {game}: expected {expected}, found {actual}")]
    ConcurrencyConflict {
        /// Player of the pair
        player: PlayerId,
        /// Game of the pair
        game: GameId,
        /// Revision the caller read
        expected: Revision,
        /// Revision found at append time
        actual: Revision,
    },

    /// Another entry was appended to the game after the caller read it.
    #[error("Game {game} changed while deciding for player {player}: expected head {expected:?}, found {actual:?}")]
    GameMoved {
        /// Player the caller was appending for
        player: PlayerId,
        /// Game that moved
        game: GameId,
        /// Newest sequence the caller read
        expected: Option<Sequence>,
        /// Newest sequence found at append time
        actual: Option<Sequence>,
    },

    /// Referenced player does not exist.
    #[error("Unknown player: {0}")]
    UnknownPlayer(PlayerId),

    /// Referenced game does not exist.
    #[error("Unknown game: {0}")]
    UnknownGame(GameId),

    /// A unique value is already taken.
    #[error("Duplicate {field}: {value}")]
    Duplicate {
        /// Name of the unique field
        field: &'static str,
        /// Rejected value
        value: String,
    },

    /// Storage backend failure.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// The persisted status vocabulary disagrees with [`BookingStatus::ALL`].
    #[error("Status vocabulary mismatch: missing {missing:?}, unknown {unknown:?}")]
    Vocabulary {
        /// Statuses absent from storage
        missing: Vec<&'static str>,
        /// Stored names the vocabulary does not know
        unknown: Vec<String>,
    },
}

/// Append-only store of booking entries.
///
/// Methods return boxed futures so the trait stays dyn-compatible and can be
/// shared as `Arc<dyn BookingLedger>`.
pub trait BookingLedger: Send + Sync {
    /// Append one entry for a (player, game) pair.
    ///
    /// The check named by `expected` and the insert are atomic with respect
    /// to every other append to the same game, across processes.
    ///
    /// Returns the stored entry with its sequence and revision assigned.
    ///
    /// # Errors
    ///
    /// - `ConcurrencyConflict`: the pair's revision is not the expected one
    /// - `GameMoved`: the game's newest entry is not the expected one
    /// - `UnknownGame`: the game does not exist (durable stores)
    /// - `DatabaseError`: storage failure
    fn append(
        &self,
        entry: NewBookingEntry,
        expected: Expected,
    ) -> BoxFuture<'_, Result<BookingEntry, LedgerError>>;

    /// Entries of one pair, oldest first.
    ///
    /// An empty vector means the player was never booked for the game.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` on storage failure.
    fn history(
        &self,
        player: PlayerId,
        game: GameId,
    ) -> BoxFuture<'_, Result<Vec<BookingEntry>, LedgerError>>;

    /// Entries of every pair of one game, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` on storage failure.
    fn game_entries(&self, game: GameId) -> BoxFuture<'_, Result<Vec<BookingEntry>, LedgerError>>;

    /// Every entry in the ledger, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` on storage failure.
    fn all_entries(&self) -> BoxFuture<'_, Result<Vec<BookingEntry>, LedgerError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revision_counts_up_from_none() {
        assert_eq!(Revision::NONE.value(), 0);
        assert_eq!(Revision::NONE.next(), Revision::new(1));
        assert_eq!(Revision::default(), Revision::NONE);
    }

    #[test]
    fn sequence_orders_entries() {
        assert!(Sequence::new(3) > Sequence::new(2));
        assert_eq!(Sequence::new(3).to_string(), "#3");
    }

    #[test]
    fn game_moved_message_names_both_heads() {
        let err = LedgerError::GameMoved {
            player: PlayerId::new(4),
            game: GameId::new(9),
            expected: Some(Sequence::new(7)),
            actual: Some(Sequence::new(8)),
        };
        assert!(err.to_string().starts_with("Game 9 changed while deciding for player 4"));
        assert_eq!(Expected::default(), Expected::Any);
    }

    #[test]
    fn conflict_message_names_the_pair() {
        let err = LedgerError::ConcurrencyConflict {
            player: PlayerId::new(4),
            game: GameId::new(9),
            expected: Revision::new(1),
            actual: Revision::new(2),
        };
        assert_eq!(
            err.to_string(),
            "Concurrency conflict for player 4 in game 9: expected r1, found r2"
        );
    }
}
