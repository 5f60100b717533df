//! Player and game administration.
//!
//! None of these operations touch the ledger.

use crate::engine::BookingEngine;
use crate::error::{BookingError, Result};
use chrono::NaiveDate;
use futsal_booking_core::{Game, GameId, GameStatus, NewPlayer, Player, PlayerId, Tier};
use serde::Serialize;
use tracing::info;

/// Number of digits in a valid mobile number.
pub const MOBILE_NUMBER_DIGITS: usize = 9;

/// Shortest name filter that is applied.
pub const MIN_NAME_FILTER_LEN: usize = 2;

/// Player totals per tier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TierCounts {
    /// Permanent players
    pub permanent: usize,
    /// Active players
    pub active: usize,
    /// Inactive players
    pub inactive: usize,
    /// All players
    pub total: usize,
}

/// Checks registration data.
///
/// # Errors
///
/// Returns `InvalidPlayer` naming the first offending field.
pub fn validate_new_player(player: &NewPlayer) -> Result<()> {
    if player.username.trim().is_empty() {
        return Err(BookingError::InvalidPlayer("username must not be empty".into()));
    }
    if !player.email.contains('@') {
        return Err(BookingError::InvalidPlayer(format!(
            "email {:?} is not an address",
            player.email
        )));
    }
    let mobile = &player.mobile_number;
    if mobile.len() != MOBILE_NUMBER_DIGITS || !mobile.bytes().all(|b| b.is_ascii_digit()) {
        return Err(BookingError::InvalidPlayer(format!(
            "mobile number must be exactly {MOBILE_NUMBER_DIGITS} digits"
        )));
    }
    Ok(())
}

impl BookingEngine {
    /// Registers a player.
    ///
    /// # Errors
    ///
    /// `InvalidPlayer` for bad data, `Ledger(Duplicate)` for a taken username.
    pub async fn register_player(&self, player: NewPlayer) -> Result<Player> {
        validate_new_player(&player)?;
        let player = self.env.directory.insert_player(player).await?;
        info!(player = %player.id, username = %player.username, tier = %player.tier, "Player registered");
        Ok(player)
    }

    /// Changes a player's tier. Existing bookings are untouched.
    ///
    /// # Errors
    ///
    /// `UnknownPlayer`, or `Ledger` on storage failure.
    pub async fn change_tier(&self, player: PlayerId, tier: Tier) -> Result<Player> {
        let player = self.env.directory.update_tier(player, tier).await?;
        info!(player = %player.id, %tier, "Player tier changed");
        Ok(player)
    }

    /// Players matching an optional name fragment and tier, ordered by id.
    ///
    /// Name fragments shorter than two characters are ignored.
    ///
    /// # Errors
    ///
    /// Returns `Ledger` on storage failure.
    pub async fn find_players(&self, name: Option<&str>, tier: Option<Tier>) -> Result<Vec<Player>> {
        let name = name
            .map(str::trim)
            .filter(|name| name.chars().count() >= MIN_NAME_FILTER_LEN);

        Ok(self
            .env
            .directory
            .players()
            .await?
            .into_iter()
            .filter(|player| tier.is_none_or(|tier| player.tier == tier))
            .filter(|player| name.is_none_or(|name| player.matches_name(name)))
            .collect())
    }

    /// Player totals per tier.
    ///
    /// # Errors
    ///
    /// Returns `Ledger` on storage failure.
    pub async fn tier_counts(&self) -> Result<TierCounts> {
        let players = self.env.directory.players().await?;
        let mut counts = TierCounts {
            total: players.len(),
            ..TierCounts::default()
        };
        for player in &players {
            match player.tier {
                Tier::Permanent => counts.permanent += 1,
                Tier::Active => counts.active += 1,
                Tier::Inactive => counts.inactive += 1,
            }
        }
        Ok(counts)
    }

    /// Updates a game's status and/or description.
    ///
    /// # Errors
    ///
    /// `UnknownGame`, `InvalidGameTransition` when the game already left
    /// `Planned`, or `Ledger` on storage failure.
    pub async fn update_game(
        &self,
        game: GameId,
        status: Option<GameStatus>,
        description: Option<String>,
    ) -> Result<Game> {
        let current = self.require_game(game).await?;
        let status = status.unwrap_or(current.status);

        if !current.status.can_become(status) {
            return Err(BookingError::InvalidGameTransition {
                game,
                from: current.status,
                to: status,
            });
        }

        let description = description.unwrap_or(current.description);
        let updated = self
            .env
            .directory
            .update_game(game, status, description)
            .await?;
        info!(%game, from = %current.status, to = %updated.status, "Game updated");
        Ok(updated)
    }

    /// Games on or after `today` that were not played, soonest first.
    ///
    /// # Errors
    ///
    /// Returns `Ledger` on storage failure.
    pub async fn upcoming_games(&self, today: NaiveDate) -> Result<Vec<Game>> {
        let mut games = self.env.directory.games().await?;
        games.retain(|game| game.is_upcoming(today));
        games.sort_by_key(|game| (game.date, game.id));
        Ok(games)
    }

    /// Games before `today` or already played, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `Ledger` on storage failure.
    pub async fn past_games(&self, today: NaiveDate) -> Result<Vec<Game>> {
        let mut games = self.env.directory.games().await?;
        games.retain(|game| !game.is_upcoming(today));
        games.sort_by_key(|game| std::cmp::Reverse((game.date, game.id)));
        Ok(games)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_player(mobile: &str) -> NewPlayer {
        NewPlayer {
            username: "lolek".into(),
            first_name: String::new(),
            last_name: String::new(),
            email: "lolek@example.com".into(),
            mobile_number: mobile.into(),
            tier: Tier::Active,
        }
    }

    #[test]
    fn mobile_number_needs_nine_digits() {
        assert!(validate_new_player(&new_player("123456789")).is_ok());
        assert!(validate_new_player(&new_player("12345678")).is_err());
        assert!(validate_new_player(&new_player("1234567890")).is_err());
        assert!(validate_new_player(&new_player("12345678a")).is_err());
    }

    #[test]
    fn username_and_email_are_required() {
        let mut player = new_player("123456789");
        player.username = "  ".into();
        assert!(matches!(
            validate_new_player(&player),
            Err(BookingError::InvalidPlayer(_))
        ));

        let mut player = new_player("123456789");
        player.email = "nobody".into();
        assert!(validate_new_player(&player).is_err());
    }
}
