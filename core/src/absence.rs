//! Reconciliation rule applied to each game inside an absence window.

use crate::status::BookingStatus;

/// Status to append for a player whose absence covers a game.
///
/// A `resting` absence never writes `resting` into the ledger. It withdraws
/// the player from a committed slot (`planned`/`cancelled` become
/// `cancelled`) and releases a reserved one (`confirmed`/`reserved` become
/// `reserved`). Other latest statuses, and players never booked, get no entry.
///
/// Any other absence status is appended as-is.
///
/// The result is appended even when it equals `latest`.
#[must_use]
pub const fn reconcile(
    latest: Option<BookingStatus>,
    absence_status: BookingStatus,
) -> Option<BookingStatus> {
    match absence_status {
        BookingStatus::Resting => match latest {
            Some(BookingStatus::Planned | BookingStatus::Cancelled) => {
                Some(BookingStatus::Cancelled)
            }
            Some(BookingStatus::Confirmed | BookingStatus::Reserved) => {
                Some(BookingStatus::Reserved)
            }
            Some(BookingStatus::Awaiting | BookingStatus::Resting) | None => None,
        },
        other => Some(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use BookingStatus::{Awaiting, Cancelled, Confirmed, Planned, Reserved, Resting};

    #[test]
    fn resting_withdraws_committed_players() {
        assert_eq!(reconcile(Some(Planned), Resting), Some(Cancelled));
        assert_eq!(reconcile(Some(Cancelled), Resting), Some(Cancelled));
    }

    #[test]
    fn resting_releases_reserved_players() {
        assert_eq!(reconcile(Some(Confirmed), Resting), Some(Reserved));
        assert_eq!(reconcile(Some(Reserved), Resting), Some(Reserved));
    }

    #[test]
    fn resting_leaves_other_players_alone() {
        assert_eq!(reconcile(Some(Awaiting), Resting), None);
        assert_eq!(reconcile(None, Resting), None);
    }

    #[test]
    fn other_statuses_are_applied_directly() {
        assert_eq!(reconcile(Some(Planned), Reserved), Some(Reserved));
        assert_eq!(reconcile(None, Confirmed), Some(Confirmed));
    }

    #[test]
    fn resting_never_increases_booked_slots() {
        for latest in BookingStatus::ALL.map(Some).into_iter().chain([None]) {
            let before = latest.is_some_and(|s| s.is_booked());
            let after = reconcile(latest, Resting).or(latest).is_some_and(|s| s.is_booked());
            assert!(!after || before, "{latest:?} became booked");
        }
    }
}
