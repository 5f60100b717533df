//! The booking status vocabulary.
//!
//! This module is the single authoritative table of participation states. Every
//! other component imports [`BookingStatus`] from here; no component spells a
//! status as a string literal of its own.
//!
//! | status | meaning | booked |
//! |---|---|---|
//! | `planned` | committed slot, default for permanent players | yes |
//! | `reserved` | non-committed slot, default for active players | no |
//! | `confirmed` | a reserved player promoted into a committed slot | yes |
//! | `cancelled` | a committed player withdrew | no |
//! | `awaiting` | a reserved player opted in and waits in the FIFO queue | no |
//! | `resting` | the player declared an absence | no |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a string is not part of the status vocabulary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown booking status: {0}")]
pub struct ParseStatusError(String);

/// Participation state of a player for one game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// Committed slot (default for permanent players).
    Planned,
    /// Speculative slot (default for active players).
    Reserved,
    /// Reserved player promoted into a committed slot.
    Confirmed,
    /// Committed player withdrew.
    Cancelled,
    /// Reserved player queued for promotion.
    Awaiting,
    /// Player is inside a declared absence window.
    Resting,
}

impl BookingStatus {
    /// Every status, in vocabulary order.
    pub const ALL: [Self; 6] = [
        Self::Planned,
        Self::Reserved,
        Self::Confirmed,
        Self::Cancelled,
        Self::Awaiting,
        Self::Resting,
    ];

    /// Statuses that occupy a committed slot and count towards capacity.
    pub const BOOKED: [Self; 2] = [Self::Planned, Self::Confirmed];

    /// Stable lowercase identifier, used for storage and display.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Reserved => "reserved",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Awaiting => "awaiting",
            Self::Resting => "resting",
        }
    }

    /// Whether this status counts towards the booked total.
    #[must_use]
    pub const fn is_booked(&self) -> bool {
        matches!(self, Self::Planned | Self::Confirmed)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}

/// Checks a persisted vocabulary against [`BookingStatus::ALL`].
///
/// Returns the names that are missing from `persisted` and the names in
/// `persisted` that the vocabulary does not know. Both empty means the two
/// agree.
#[must_use]
pub fn vocabulary_mismatch<'a, I>(persisted: I) -> (Vec<&'static str>, Vec<String>)
where
    I: IntoIterator<Item = &'a str>,
{
    let persisted: Vec<&str> = persisted.into_iter().collect();

    let missing = BookingStatus::ALL
        .iter()
        .map(BookingStatus::as_str)
        .filter(|name| !persisted.contains(name))
        .collect();

    let unknown = persisted
        .into_iter()
        .filter(|name| name.parse::<BookingStatus>().is_err())
        .map(str::to_string)
        .collect();

    (missing, unknown)
}
