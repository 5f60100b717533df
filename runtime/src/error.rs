//! Errors reported to callers of the booking engine.

use futsal_booking_core::{
    DateRangeError, GameId, GameStatus, LedgerError, PlayerId, TransitionError,
};
use thiserror::Error;

/// Caller-facing error of every [`crate::BookingEngine`] operation.
///
/// Notification failures never appear here: they are logged and
/// dead-lettered, never returned.
#[derive(Error, Debug)]
pub enum BookingError {
    /// The player's latest status has no row in the transition table.
    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),

    /// Referenced player does not exist.
    #[error("Unknown player: {0}")]
    UnknownPlayer(PlayerId),

    /// Referenced game does not exist.
    #[error("Unknown game: {0}")]
    UnknownGame(GameId),

    /// Concurrent writers kept changing the pair; the action was not applied.
    #[error("Concurrent update of player {player} in game {game}, try again")]
    ConcurrentConflict {
        /// Player of the contested pair
        player: PlayerId,
        /// Game of the contested pair
        game: GameId,
    },

    /// Games only leave `Planned`.
    #[error("Game {game} cannot change from {from} to {to}")]
    InvalidGameTransition {
        /// Game being updated
        game: GameId,
        /// Current status
        from: GameStatus,
        /// Requested status
        to: GameStatus,
    },

    /// Absence window ends before it starts.
    #[error(transparent)]
    InvalidDateRange(#[from] DateRangeError),

    /// Registration data failed validation.
    #[error("Invalid player: {0}")]
    InvalidPlayer(String),

    /// Storage failure.
    #[error("Storage error: {0}")]
    Ledger(#[source] LedgerError),
}

impl BookingError {
    /// Whether this is an optimistic-concurrency conflict worth retrying.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::Ledger(LedgerError::ConcurrencyConflict { .. } | LedgerError::GameMoved { .. })
        )
    }
}

impl From<LedgerError> for BookingError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::UnknownPlayer(player) => Self::UnknownPlayer(player),
            LedgerError::UnknownGame(game) => Self::UnknownGame(game),
            other => Self::Ledger(other),
        }
    }
}

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, BookingError>;

#[cfg(test)]
mod tests {
    use super::*;
    use futsal_booking_core::{Revision, Sequence};

    #[test]
    fn ledger_lookups_map_to_unknown_entities() {
        let err = BookingError::from(LedgerError::UnknownGame(GameId::new(3)));
        assert!(matches!(err, BookingError::UnknownGame(game) if game == GameId::new(3)));
    }

    #[test]
    fn only_ledger_conflicts_are_retryable() {
        let conflict = BookingError::from(LedgerError::ConcurrencyConflict {
            player: PlayerId::new(1),
            game: GameId::new(1),
            expected: Revision::new(1),
            actual: Revision::new(2),
        });
        assert!(conflict.is_conflict());
        let moved = BookingError::from(LedgerError::GameMoved {
            player: PlayerId::new(1),
            game: GameId::new(1),
            expected: None,
            actual: Some(Sequence::new(4)),
        });
        assert!(moved.is_conflict());
        assert!(!BookingError::UnknownPlayer(PlayerId::new(1)).is_conflict());
        assert!(!BookingError::from(LedgerError::DatabaseError("down".into())).is_conflict());
    }
}
