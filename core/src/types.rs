//! Domain types: players, games and absence records.
//!
//! Identifiers are newtypes over the storage row id so that a player id can
//! never be passed where a game id is expected.

use crate::status::BookingStatus;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Unique identifier of a player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(i64);

impl PlayerId {
    /// Wraps a raw row id.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw row id.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier of a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GameId(i64);

impl GameId {
    /// Wraps a raw row id.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw row id.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier of an absence record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AbsenceId(i64);

impl AbsenceId {
    /// Wraps a raw row id.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw row id.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

/// Error returned when parsing a tier or game status from text fails.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown {kind}: {value}")]
pub struct ParseKindError {
    kind: &'static str,
    value: String,
}

/// Commitment tier of a player.
///
/// The tier decides which status a player receives when a game is created
/// with default bookings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    /// Always plays; seeded as `planned`.
    Permanent,
    /// Plays when there is room; seeded as `reserved`.
    #[default]
    Active,
    /// Not seeded at all.
    Inactive,
}

impl Tier {
    /// Every tier.
    pub const ALL: [Self; 3] = [Self::Permanent, Self::Active, Self::Inactive];

    /// Status a new game gives to players of this tier, if any.
    #[must_use]
    pub const fn default_status(self) -> Option<BookingStatus> {
        match self {
            Self::Permanent => Some(BookingStatus::Planned),
            Self::Active => Some(BookingStatus::Reserved),
            Self::Inactive => None,
        }
    }

    /// Storage and display name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Permanent => "Permanent",
            Self::Active => "Active",
            Self::Inactive => "Inactive",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tier| tier.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseKindError {
                kind: "tier",
                value: s.to_string(),
            })
    }
}

/// A registered player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Identifier
    pub id: PlayerId,
    /// Unique login name
    pub username: String,
    /// Given name (may be empty)
    pub first_name: String,
    /// Family name (may be empty)
    pub last_name: String,
    /// Contact address used by notifiers
    pub email: String,
    /// Nine-digit mobile number
    pub mobile_number: String,
    /// Commitment tier
    pub tier: Tier,
}

impl Player {
    /// Name shown to other people, according to `mode`.
    #[must_use]
    pub fn display_name(&self, mode: DisplayNameMode) -> String {
        match mode {
            DisplayNameMode::Username => self.username.clone(),
            DisplayNameMode::FullName => {
                let full = format!("{} {}", self.first_name, self.last_name);
                let full = full.trim();
                if full.is_empty() {
                    self.username.clone()
                } else {
                    full.to_string()
                }
            }
        }
    }

    /// Case-insensitive match against username, first and last name.
    #[must_use]
    pub fn matches_name(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        [&self.username, &self.first_name, &self.last_name]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// How player names are rendered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayNameMode {
    /// Show the username.
    #[default]
    Username,
    /// Show "first last", falling back to the username.
    FullName,
}

impl FromStr for DisplayNameMode {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "username" => Ok(Self::Username),
            "full_name" => Ok(Self::FullName),
            _ => Err(ParseKindError {
                kind: "display name mode",
                value: s.to_string(),
            }),
        }
    }
}

/// Registration data for a new player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPlayer {
    /// Unique login name
    pub username: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Contact address
    pub email: String,
    /// Nine-digit mobile number
    pub mobile_number: String,
    /// Commitment tier
    pub tier: Tier,
}

/// Lifecycle status of a game.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameStatus {
    /// Scheduled, not yet played
    #[default]
    Planned,
    /// Took place
    Played,
    /// Called off
    Cancelled,
}

impl GameStatus {
    /// Every game status.
    pub const ALL: [Self; 3] = [Self::Planned, Self::Played, Self::Cancelled];

    /// Storage and display name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "Planned",
            Self::Played => "Played",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Whether an admin may move a game from `self` to `next`.
    ///
    /// Only a planned game changes status; re-setting the current status is
    /// allowed and has no effect.
    #[must_use]
    pub const fn can_become(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Planned, _) | (Self::Played, Self::Played) | (Self::Cancelled, Self::Cancelled)
        )
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameStatus {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseKindError {
                kind: "game status",
                value: s.to_string(),
            })
    }
}

/// A scheduled session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    /// Identifier
    pub id: GameId,
    /// Day the game takes place
    pub date: NaiveDate,
    /// Lifecycle status
    pub status: GameStatus,
    /// Free-text description
    pub description: String,
}

impl Game {
    /// Whether the game belongs to the "next games" listing on `today`.
    #[must_use]
    pub fn is_upcoming(&self, today: NaiveDate) -> bool {
        self.date >= today && self.status != GameStatus::Played
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.date, self.status)
    }
}

/// Data for a new game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGame {
    /// Day the game takes place
    pub date: NaiveDate,
    /// Initial lifecycle status
    pub status: GameStatus,
    /// Free-text description
    pub description: String,
}

impl NewGame {
    /// A planned game on `date`.
    #[must_use]
    pub fn planned(date: NaiveDate, description: impl Into<String>) -> Self {
        Self {
            date,
            status: GameStatus::Planned,
            description: description.into(),
        }
    }
}

/// Error returned when a date range ends before it starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Date range ends ({end}) before it starts ({start})")]
pub struct DateRangeError {
    start: NaiveDate,
    end: NaiveDate,
}

/// Inclusive range of calendar days.
///
/// Deserialization goes through [`DateRange::new`], so a reversed range is
/// rejected there too.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Deserialize)]
struct RawDateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = DateRangeError;

    fn try_from(raw: RawDateRange) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}

impl DateRange {
    /// Creates `[start, end]`.
    ///
    /// # Errors
    ///
    /// Returns [`DateRangeError`] if `end` is before `start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DateRangeError> {
        if end < start {
            return Err(DateRangeError { start, end });
        }
        Ok(Self { start, end })
    }

    /// First day of the range.
    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day of the range.
    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whether `date` falls inside the range (both ends included).
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// A declared unavailability window. Never modified once stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsenceRecord {
    /// Identifier
    pub id: AbsenceId,
    /// Absent player
    pub player: PlayerId,
    /// Days covered
    pub range: DateRange,
    /// Status the absence applies, usually `resting`
    pub status: BookingStatus,
    /// Free-text reason
    pub reason: String,
    /// When the record was stored
    pub created_at: DateTime<Utc>,
}

/// Data for a new absence record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAbsence {
    /// Absent player
    pub player: PlayerId,
    /// Days covered
    pub range: DateRange,
    /// Status the absence applies
    pub status: BookingStatus,
    /// Free-text reason
    pub reason: String,
}
