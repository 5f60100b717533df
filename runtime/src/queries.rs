//! Read-only views over the ledger.

use crate::engine::BookingEngine;
use crate::error::Result;
use futsal_booking_core::{
    BookingEntry, BookingStatus, Game, GameId, GameRoster, Order, Player, PlayerId,
};
use serde::Serialize;
use std::collections::HashMap;

/// Everything shown on a game's page.
///
/// Player lists are ordered by the sequence of each player's latest entry,
/// oldest first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GameSummary {
    /// The game
    pub game: Game,
    /// Latest status `planned`
    pub planned: Vec<Player>,
    /// Latest status `reserved`
    pub reserved: Vec<Player>,
    /// Latest status `awaiting`, in promotion order
    pub awaiting: Vec<Player>,
    /// Latest status `confirmed`
    pub confirmed: Vec<Player>,
    /// Latest status `cancelled`
    pub cancelled: Vec<Player>,
    /// `planned` plus `confirmed`
    pub booked: usize,
    /// The i-th cancelled player with the i-th confirmed player, if any
    pub cancelled_with_substitutes: Vec<(Player, Option<Player>)>,
}

impl BookingEngine {
    /// Latest status of a pair, `None` if the player was never booked.
    ///
    /// # Errors
    ///
    /// `UnknownPlayer` / `UnknownGame`, or `Ledger` on storage failure.
    pub async fn get_current_status(
        &self,
        player: PlayerId,
        game: GameId,
    ) -> Result<Option<BookingStatus>> {
        self.require_player(player).await?;
        self.require_game(game).await?;
        self.latest_status(player, game).await
    }

    /// Players whose latest status for `game` is one of `statuses`.
    ///
    /// # Errors
    ///
    /// `UnknownGame`, or `Ledger` on storage failure.
    pub async fn list_players_by_status(
        &self,
        statuses: &[BookingStatus],
        game: GameId,
        order: Order,
    ) -> Result<Vec<Player>> {
        let roster = self.roster(game).await?;
        let players = self.players_by_id().await?;
        Ok(resolve(&players, roster.players_by_status(statuses, order)))
    }

    /// Number of players in a committed slot of `game`.
    ///
    /// # Errors
    ///
    /// `UnknownGame`, or `Ledger` on storage failure.
    pub async fn count_booked_players(&self, game: GameId) -> Result<usize> {
        Ok(self.roster(game).await?.count_booked())
    }

    /// Every entry of `game`, oldest first.
    ///
    /// # Errors
    ///
    /// `UnknownGame`, or `Ledger` on storage failure.
    pub async fn booking_history(&self, game: GameId) -> Result<Vec<BookingEntry>> {
        self.require_game(game).await?;
        Ok(self.env.ledger.game_entries(game).await?)
    }

    /// Entries of one pair, oldest first.
    ///
    /// # Errors
    ///
    /// `UnknownPlayer` / `UnknownGame`, or `Ledger` on storage failure.
    pub async fn player_history(&self, player: PlayerId, game: GameId) -> Result<Vec<BookingEntry>> {
        self.require_player(player).await?;
        self.require_game(game).await?;
        Ok(self.env.ledger.history(player, game).await?)
    }

    /// The whole ledger, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `Ledger` on storage failure.
    pub async fn ledger_history(&self) -> Result<Vec<BookingEntry>> {
        Ok(self.env.ledger.all_entries().await?)
    }

    /// Roster breakdown of a game.
    ///
    /// # Errors
    ///
    /// `UnknownGame`, or `Ledger` on storage failure.
    pub async fn game_summary(&self, game: GameId) -> Result<GameSummary> {
        let game = self.require_game(game).await?;
        let entries = self.env.ledger.game_entries(game.id).await?;
        let roster = GameRoster::from_entries(Some(game.id), &entries);
        let players = self.players_by_id().await?;

        let with = |status: BookingStatus| {
            resolve(&players, roster.players_by_status(&[status], Order::Ascending))
        };

        let cancelled_with_substitutes = roster
            .cancelled_with_substitutes()
            .into_iter()
            .filter_map(|(cancelled, substitute)| {
                let cancelled = players.get(&cancelled)?.clone();
                let substitute = substitute.and_then(|id| players.get(&id).cloned());
                Some((cancelled, substitute))
            })
            .collect();

        Ok(GameSummary {
            planned: with(BookingStatus::Planned),
            reserved: with(BookingStatus::Reserved),
            awaiting: with(BookingStatus::Awaiting),
            confirmed: with(BookingStatus::Confirmed),
            cancelled: with(BookingStatus::Cancelled),
            booked: roster.count_booked(),
            cancelled_with_substitutes,
            game,
        })
    }

    async fn roster(&self, game: GameId) -> Result<GameRoster> {
        self.require_game(game).await?;
        let entries = self.env.ledger.game_entries(game).await?;
        Ok(GameRoster::from_entries(Some(game), &entries))
    }

    async fn players_by_id(&self) -> Result<HashMap<PlayerId, Player>> {
        Ok(self
            .env
            .directory
            .players()
            .await?
            .into_iter()
            .map(|player| (player.id, player))
            .collect())
    }
}

fn resolve(players: &HashMap<PlayerId, Player>, ids: Vec<PlayerId>) -> Vec<Player> {
    ids.into_iter()
        .filter_map(|id| players.get(&id).cloned())
        .collect()
}
