//! The player-action transition table.
//!
//! | current | `opt_in = false` | `opt_in = true` |
//! |---|---|---|
//! | planned | cancelled | planned |
//! | cancelled | cancelled | planned |
//! | reserved | reserved | awaiting |
//! | awaiting | reserved | confirmed if a slot is open, else awaiting |
//! | confirmed | reserved | confirmed |
//! | (never booked) | unchanged | unchanged |
//!
//! `resting` never appears in the per-game ledger through this crate; a pair
//! that somehow holds it has no row and is rejected.

use crate::status::BookingStatus;
use thiserror::Error;

/// Rejection of a `(current, opt_in)` pair that has no table row.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    /// No row for this combination.
    #[error("No transition from {current} with opt_in={opt_in}")]
    InvalidTransition {
        /// Latest status of the pair
        current: BookingStatus,
        /// Requested attendance
        opt_in: bool,
    },
}

/// Outcome of a player action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Nothing to append.
    Unchanged,
    /// Append an entry with this status.
    Move(BookingStatus),
}

impl Transition {
    /// Status to append, if any.
    #[must_use]
    pub const fn target(self) -> Option<BookingStatus> {
        match self {
            Self::Unchanged => None,
            Self::Move(status) => Some(status),
        }
    }
}

/// Computes the next status for a player action.
///
/// `has_open_slot` is only consulted for an awaiting player opting in.
///
/// # Errors
///
/// Returns [`TransitionError::InvalidTransition`] when `current` is `resting`.
pub fn next_status(
    current: Option<BookingStatus>,
    opt_in: bool,
    has_open_slot: bool,
) -> Result<Transition, TransitionError> {
    use BookingStatus::{Awaiting, Cancelled, Confirmed, Planned, Reserved, Resting};

    let Some(current) = current else {
        return Ok(Transition::Unchanged);
    };

    let next = match (current, opt_in) {
        (Planned | Cancelled, false) => Cancelled,
        (Planned | Cancelled, true) => Planned,
        (Reserved | Awaiting | Confirmed, false) => Reserved,
        (Reserved, true) => Awaiting,
        (Awaiting, true) if has_open_slot => Confirmed,
        (Awaiting, true) => Awaiting,
        (Confirmed, true) => Confirmed,
        (Resting, _) => return Err(TransitionError::InvalidTransition { current, opt_in }),
    };

    Ok(if next == current {
        Transition::Unchanged
    } else {
        Transition::Move(next)
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use BookingStatus::{Awaiting, Cancelled, Confirmed, Planned, Reserved, Resting};

    fn next(current: BookingStatus, opt_in: bool, open: bool) -> Option<BookingStatus> {
        next_status(Some(current), opt_in, open).unwrap().target()
    }

    #[test]
    fn committed_players_toggle_between_planned_and_cancelled() {
        assert_eq!(next(Planned, false, false), Some(Cancelled));
        assert_eq!(next(Planned, true, false), None);
        assert_eq!(next(Cancelled, true, false), Some(Planned));
        assert_eq!(next(Cancelled, false, false), None);
    }

    #[test]
    fn reserved_players_queue_and_withdraw() {
        assert_eq!(next(Reserved, true, false), Some(Awaiting));
        assert_eq!(next(Reserved, false, true), None);
        assert_eq!(next(Awaiting, false, true), Some(Reserved));
        assert_eq!(next(Confirmed, false, false), Some(Reserved));
        assert_eq!(next(Confirmed, true, false), None);
    }

    #[test]
    fn awaiting_promotion_depends_on_open_slot() {
        assert_eq!(next(Awaiting, true, true), Some(Confirmed));
        assert_eq!(next(Awaiting, true, false), None);
    }

    #[test]
    fn open_slot_only_matters_for_awaiting() {
        for current in [Planned, Cancelled, Reserved, Confirmed] {
            for opt_in in [false, true] {
                assert_eq!(next(current, opt_in, true), next(current, opt_in, false));
            }
        }
    }

    #[test]
    fn never_booked_is_a_no_op() {
        assert_eq!(next_status(None, true, true).unwrap(), Transition::Unchanged);
        assert_eq!(next_status(None, false, false).unwrap(), Transition::Unchanged);
    }

    #[test]
    fn resting_is_rejected() {
        let err = next_status(Some(Resting), true, false).unwrap_err();
        assert_eq!(
            err,
            TransitionError::InvalidTransition {
                current: Resting,
                opt_in: true
            }
        );
    }
}
