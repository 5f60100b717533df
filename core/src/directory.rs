//! Directory of players, games and absence records.
//!
//! Unlike the ledger these are ordinary records: players change tier and
//! games change status. Absence records are insert-only.

use crate::BoxFuture;
use crate::ledger::LedgerError;
use crate::types::{
    AbsenceRecord, Game, GameId, GameStatus, NewAbsence, NewGame, NewPlayer, Player, PlayerId,
    Tier,
};
use chrono::{DateTime, NaiveDate, Utc};

/// Storage for everything that is not a ledger entry.
///
/// # Errors
///
/// Every method returns `LedgerError::DatabaseError` on storage failure.
/// Lookups by id return `Ok(None)` for a missing row; updates of a missing
/// row return `UnknownPlayer`/`UnknownGame`.
pub trait Directory: Send + Sync {
    /// Stores a new player.
    ///
    /// Fails with `Duplicate` when the username is taken.
    fn insert_player(&self, player: NewPlayer) -> BoxFuture<'_, Result<Player, LedgerError>>;

    /// Looks a player up by id.
    fn player(&self, id: PlayerId) -> BoxFuture<'_, Result<Option<Player>, LedgerError>>;

    /// Every player, ordered by id.
    fn players(&self) -> BoxFuture<'_, Result<Vec<Player>, LedgerError>>;

    /// Changes a player's tier.
    fn update_tier(&self, id: PlayerId, tier: Tier) -> BoxFuture<'_, Result<Player, LedgerError>>;

    /// Stores a new game.
    fn insert_game(&self, game: NewGame) -> BoxFuture<'_, Result<Game, LedgerError>>;

    /// Looks a game up by id.
    fn game(&self, id: GameId) -> BoxFuture<'_, Result<Option<Game>, LedgerError>>;

    /// Every game, ordered by date then id.
    fn games(&self) -> BoxFuture<'_, Result<Vec<Game>, LedgerError>>;

    /// Games dated inside `[start, end]`, ordered by date then id.
    fn games_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BoxFuture<'_, Result<Vec<Game>, LedgerError>>;

    /// Replaces a game's status and description.
    fn update_game(
        &self,
        id: GameId,
        status: GameStatus,
        description: String,
    ) -> BoxFuture<'_, Result<Game, LedgerError>>;

    /// Stores an absence record.
    fn insert_absence(
        &self,
        absence: NewAbsence,
        created_at: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<AbsenceRecord, LedgerError>>;

    /// Absence records, optionally for one player, ordered by start date then id.
    fn absences(
        &self,
        player: Option<PlayerId>,
    ) -> BoxFuture<'_, Result<Vec<AbsenceRecord>, LedgerError>>;
}
