//! In-memory ledger and directory.
//!
//! [`InMemoryBookingStore`] implements both [`BookingLedger`] and
//! [`Directory`] over ordered maps and vectors behind one `RwLock`, so tests run
//! without a database and with deterministic ids.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Lock poisoning only follows a panicking test

use chrono::{DateTime, NaiveDate, Utc};
use futsal_booking_core::{
    AbsenceId, AbsenceRecord, BookingEntry, BookingLedger, BookingStatus, BoxFuture, Directory, Expected,
    Game, GameId, GameStatus, LedgerError, NewAbsence, NewBookingEntry, NewGame, NewPlayer, Player,
    PlayerId, Revision, Sequence, Tier,
};
use std::collections::BTreeMap;
use std::future::ready;
use std::sync::{Arc, RwLock};

#[derive(Debug, Default)]
struct Inner {
    entries: Vec<BookingEntry>,
    players: BTreeMap<PlayerId, Player>,
    games: BTreeMap<GameId, Game>,
    absences: Vec<AbsenceRecord>,
    next_id: i64,
    injected_conflicts: usize,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn revision(&self, player: PlayerId, game: GameId) -> Revision {
        let count = self
            .entries
            .iter()
            .filter(|e| e.player == player && e.game == game)
            .count();
        Revision::new(count as u64)
    }

    fn head(&self, game: GameId) -> Option<Sequence> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.game == game)
            .map(|e| e.sequence)
    }

    fn check(&self, entry: &NewBookingEntry, expected: Expected) -> Result<(), LedgerError> {
        match expected {
            Expected::Any => Ok(()),
            Expected::Revision(expected) => {
                let actual = self.revision(entry.player, entry.game);
                if expected == actual {
                    Ok(())
                } else {
                    Err(LedgerError::ConcurrencyConflict {
                        player: entry.player,
                        game: entry.game,
                        expected,
                        actual,
                    })
                }
            }
            Expected::GameHead(expected) => {
                let actual = self.head(entry.game);
                if expected == actual {
                    Ok(())
                } else {
                    Err(LedgerError::GameMoved {
                        player: entry.player,
                        game: entry.game,
                        expected,
                        actual,
                    })
                }
            }
        }
    }
}

// What a writer that got there first would have caused.
fn injected_conflict(entry: &NewBookingEntry, expected: Expected, inner: &Inner) -> LedgerError {
    match expected {
        Expected::GameHead(expected) => LedgerError::GameMoved {
            player: entry.player,
            game: entry.game,
            expected,
            actual: Some(Sequence::new(inner.entries.len() as u64 + 1)),
        },
        _ => {
            let actual = inner.revision(entry.player, entry.game);
            LedgerError::ConcurrencyConflict {
                player: entry.player,
                game: entry.game,
                expected: actual,
                actual: actual.next(),
            }
        }
    }
}

/// In-memory booking store for fast, deterministic tests.
///
/// Clones share the same data.
///
/// # Example
///
/// ```
/// use futsal_booking_testing::InMemoryBookingStore;
///
/// let store = InMemoryBookingStore::new();
/// assert_eq!(store.entry_count(), 0);
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryBookingStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryBookingStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of ledger entries.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.inner.read().unwrap().entries.len()
    }

    /// Makes the next `count` appends that carry an expectation fail with a
    /// conflict, as if another writer got there first.
    pub fn inject_conflicts(&self, count: usize) {
        self.inner.write().unwrap().injected_conflicts = count;
    }

    /// Appends an entry directly, bypassing every rule.
    ///
    /// Useful to set up states the engine would never produce.
    pub fn force_entry(
        &self,
        player: PlayerId,
        game: GameId,
        status: BookingStatus,
        created_at: DateTime<Utc>,
    ) -> BookingEntry {
        self.append_now(
            NewBookingEntry {
                player,
                game,
                status,
                created_at,
            },
            Expected::Any,
        )
        .unwrap()
    }

    fn append_now(
        &self,
        entry: NewBookingEntry,
        expected: Expected,
    ) -> Result<BookingEntry, LedgerError> {
        let mut inner = self.inner.write().unwrap();

        if expected != Expected::Any && inner.injected_conflicts > 0 {
            inner.injected_conflicts -= 1;
            return Err(injected_conflict(&entry, expected, &inner));
        }
        inner.check(&entry, expected)?;

        let actual = inner.revision(entry.player, entry.game);

        let stored = BookingEntry {
            sequence: Sequence::new(inner.entries.len() as u64 + 1),
            revision: actual.next(),
            player: entry.player,
            game: entry.game,
            status: entry.status,
            created_at: entry.created_at,
        };
        inner.entries.push(stored.clone());
        Ok(stored)
    }

    fn read<T>(&self, f: impl FnOnce(&Inner) -> T) -> T {
        f(&self.inner.read().unwrap())
    }

    fn write<T>(&self, f: impl FnOnce(&mut Inner) -> T) -> T {
        f(&mut self.inner.write().unwrap())
    }
}

impl BookingLedger for InMemoryBookingStore {
    fn append(
        &self,
        entry: NewBookingEntry,
        expected: Expected,
    ) -> BoxFuture<'_, Result<BookingEntry, LedgerError>> {
        Box::pin(ready(self.append_now(entry, expected)))
    }

    fn history(
        &self,
        player: PlayerId,
        game: GameId,
    ) -> BoxFuture<'_, Result<Vec<BookingEntry>, LedgerError>> {
        let entries = self.read(|inner| {
            inner
                .entries
                .iter()
                .filter(|e| e.player == player && e.game == game)
                .cloned()
                .collect()
        });
        Box::pin(ready(Ok(entries)))
    }

    fn game_entries(&self, game: GameId) -> BoxFuture<'_, Result<Vec<BookingEntry>, LedgerError>> {
        let entries = self.read(|inner| {
            inner
                .entries
                .iter()
                .filter(|e| e.game == game)
                .cloned()
                .collect()
        });
        Box::pin(ready(Ok(entries)))
    }

    fn all_entries(&self) -> BoxFuture<'_, Result<Vec<BookingEntry>, LedgerError>> {
        Box::pin(ready(Ok(self.read(|inner| inner.entries.clone()))))
    }
}

impl Directory for InMemoryBookingStore {
    fn insert_player(&self, player: NewPlayer) -> BoxFuture<'_, Result<Player, LedgerError>> {
        let result = self.write(|inner| {
            if inner.players.values().any(|p| p.username == player.username) {
                return Err(LedgerError::Duplicate {
                    field: "username",
                    value: player.username,
                });
            }
            let id = PlayerId::new(inner.next_id());
            let stored = Player {
                id,
                username: player.username,
                first_name: player.first_name,
                last_name: player.last_name,
                email: player.email,
                mobile_number: player.mobile_number,
                tier: player.tier,
            };
            inner.players.insert(id, stored.clone());
            Ok(stored)
        });
        Box::pin(ready(result))
    }

    fn player(&self, id: PlayerId) -> BoxFuture<'_, Result<Option<Player>, LedgerError>> {
        Box::pin(ready(Ok(self.read(|inner| inner.players.get(&id).cloned()))))
    }

    fn players(&self) -> BoxFuture<'_, Result<Vec<Player>, LedgerError>> {
        Box::pin(ready(Ok(
            self.read(|inner| inner.players.values().cloned().collect())
        )))
    }

    fn update_tier(&self, id: PlayerId, tier: Tier) -> BoxFuture<'_, Result<Player, LedgerError>> {
        let result = self.write(|inner| {
            let player = inner
                .players
                .get_mut(&id)
                .ok_or(LedgerError::UnknownPlayer(id))?;
            player.tier = tier;
            Ok(player.clone())
        });
        Box::pin(ready(result))
    }

    fn insert_game(&self, game: NewGame) -> BoxFuture<'_, Result<Game, LedgerError>> {
        let stored = self.write(|inner| {
            let id = GameId::new(inner.next_id());
            let stored = Game {
                id,
                date: game.date,
                status: game.status,
                description: game.description,
            };
            inner.games.insert(id, stored.clone());
            stored
        });
        Box::pin(ready(Ok(stored)))
    }

    fn game(&self, id: GameId) -> BoxFuture<'_, Result<Option<Game>, LedgerError>> {
        Box::pin(ready(Ok(self.read(|inner| inner.games.get(&id).cloned()))))
    }

    fn games(&self) -> BoxFuture<'_, Result<Vec<Game>, LedgerError>> {
        let mut games: Vec<Game> = self.read(|inner| inner.games.values().cloned().collect());
        games.sort_by_key(|game| (game.date, game.id));
        Box::pin(ready(Ok(games)))
    }

    fn games_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BoxFuture<'_, Result<Vec<Game>, LedgerError>> {
        let mut games: Vec<Game> = self.read(|inner| {
            inner
                .games
                .values()
                .filter(|game| start <= game.date && game.date <= end)
                .cloned()
                .collect()
        });
        games.sort_by_key(|game| (game.date, game.id));
        Box::pin(ready(Ok(games)))
    }

    fn update_game(
        &self,
        id: GameId,
        status: GameStatus,
        description: String,
    ) -> BoxFuture<'_, Result<Game, LedgerError>> {
        let result = self.write(|inner| {
            let game = inner.games.get_mut(&id).ok_or(LedgerError::UnknownGame(id))?;
            game.status = status;
            game.description = description;
            Ok(game.clone())
        });
        Box::pin(ready(result))
    }

    fn insert_absence(
        &self,
        absence: NewAbsence,
        created_at: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<AbsenceRecord, LedgerError>> {
        let result = self.write(|inner| {
            if !inner.players.contains_key(&absence.player) {
                return Err(LedgerError::UnknownPlayer(absence.player));
            }
            let record = AbsenceRecord {
                id: AbsenceId::new(inner.next_id()),
                player: absence.player,
                range: absence.range,
                status: absence.status,
                reason: absence.reason,
                created_at,
            };
            inner.absences.push(record.clone());
            Ok(record)
        });
        Box::pin(ready(result))
    }

    fn absences(
        &self,
        player: Option<PlayerId>,
    ) -> BoxFuture<'_, Result<Vec<AbsenceRecord>, LedgerError>> {
        let mut absences: Vec<AbsenceRecord> = self.read(|inner| {
            inner
                .absences
                .iter()
                .filter(|a| player.is_none_or(|player| a.player == player))
                .cloned()
                .collect()
        });
        absences.sort_by_key(|a| (a.range.start(), a.id));
        Box::pin(ready(Ok(absences)))
    }
}
