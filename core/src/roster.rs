//! Latest-state resolution and capacity accounting for one game.
//!
//! [`GameRoster`] groups a game's ledger entries by player once and keeps the
//! entry with the highest [`Sequence`] for each. Every query after that is a
//! scan over at most one entry per player, never over the whole ledger.

use crate::ledger::{BookingEntry, Revision, Sequence};
use crate::status::BookingStatus;
use crate::types::{GameId, PlayerId};
use std::collections::HashMap;

/// Order of players returned by [`GameRoster::players_by_status`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Order {
    /// Oldest qualifying transition first (FIFO).
    #[default]
    Ascending,
    /// Newest qualifying transition first.
    Descending,
}

/// Picks the entry with the highest sequence.
#[must_use]
pub fn resolve_latest<'a, I>(entries: I) -> Option<&'a BookingEntry>
where
    I: IntoIterator<Item = &'a BookingEntry>,
{
    entries.into_iter().max_by_key(|entry| entry.sequence)
}

/// Current state of every player booked for a game.
#[derive(Clone, Debug, Default)]
pub struct GameRoster {
    latest: HashMap<PlayerId, Latest>,
}

#[derive(Clone, Copy, Debug)]
struct Latest {
    status: BookingStatus,
    sequence: Sequence,
    revision: Revision,
}

impl GameRoster {
    /// Builds the roster from entries of a single game, in any order.
    ///
    /// Entries of other games are ignored when `game` is given.
    #[must_use]
    pub fn from_entries(game: Option<GameId>, entries: &[BookingEntry]) -> Self {
        let mut latest: HashMap<PlayerId, Latest> = HashMap::new();
        for entry in entries
            .iter()
            .filter(|entry| game.is_none_or(|game| entry.game == game))
        {
            let candidate = Latest {
                status: entry.status,
                sequence: entry.sequence,
                revision: entry.revision,
            };
            latest
                .entry(entry.player)
                .and_modify(|current| {
                    if candidate.sequence > current.sequence {
                        *current = candidate;
                    }
                })
                .or_insert(candidate);
        }
        Self { latest }
    }

    /// Latest status of `player`, `None` if never booked.
    #[must_use]
    pub fn latest(&self, player: PlayerId) -> Option<BookingStatus> {
        self.latest.get(&player).map(|latest| latest.status)
    }

    /// Revision reached by `player`'s entries, [`Revision::NONE`] if never booked.
    #[must_use]
    pub fn revision(&self, player: PlayerId) -> Revision {
        self.latest
            .get(&player)
            .map_or(Revision::NONE, |latest| latest.revision)
    }

    /// Sequence of the game's newest entry, `None` if the game has none.
    ///
    /// The newest entry of a game is always some player's latest entry.
    #[must_use]
    pub fn head(&self) -> Option<Sequence> {
        self.latest.values().map(|latest| latest.sequence).max()
    }

    /// Latest status of each of `players` that has one.
    #[must_use]
    pub fn latest_for_all(&self, players: &[PlayerId]) -> HashMap<PlayerId, BookingStatus> {
        players
            .iter()
            .filter_map(|player| self.latest(*player).map(|status| (*player, status)))
            .collect()
    }

    /// Players whose latest status is in `statuses`, ordered by the sequence
    /// of that latest entry.
    #[must_use]
    pub fn players_by_status(&self, statuses: &[BookingStatus], order: Order) -> Vec<PlayerId> {
        let mut matching: Vec<(Sequence, PlayerId)> = self
            .latest
            .iter()
            .filter(|(_, latest)| statuses.contains(&latest.status))
            .map(|(player, latest)| (latest.sequence, *player))
            .collect();
        matching.sort_unstable();
        if order == Order::Descending {
            matching.reverse();
        }
        matching.into_iter().map(|(_, player)| player).collect()
    }

    /// Number of players whose latest status is `status`.
    #[must_use]
    pub fn count_with(&self, status: BookingStatus) -> usize {
        self.latest
            .values()
            .filter(|latest| latest.status == status)
            .count()
    }

    /// Number of players occupying a committed slot (`planned` or `confirmed`).
    #[must_use]
    pub fn count_booked(&self) -> usize {
        self.latest
            .values()
            .filter(|latest| latest.status.is_booked())
            .count()
    }

    /// Whether cancellations currently outnumber confirmations.
    ///
    /// There is no explicit slot count: every cancellation is assumed to have
    /// freed one committed slot and every confirmation to have filled one.
    #[must_use]
    pub fn has_open_slot(&self) -> bool {
        self.count_with(BookingStatus::Cancelled) > self.count_with(BookingStatus::Confirmed)
    }

    /// Longest-waiting awaiting player.
    #[must_use]
    pub fn awaiting_head(&self) -> Option<PlayerId> {
        self.players_by_status(&[BookingStatus::Awaiting], Order::Ascending)
            .into_iter()
            .next()
    }

    /// Pairs the i-th cancelled player with the i-th confirmed player.
    #[must_use]
    pub fn cancelled_with_substitutes(&self) -> Vec<(PlayerId, Option<PlayerId>)> {
        let confirmed = self.players_by_status(&[BookingStatus::Confirmed], Order::Ascending);
        self.players_by_status(&[BookingStatus::Cancelled], Order::Ascending)
            .into_iter()
            .enumerate()
            .map(|(i, cancelled)| (cancelled, confirmed.get(i).copied()))
            .collect()
    }

    /// Number of players with at least one entry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.latest.len()
    }

    /// Whether nobody was ever booked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }
}
