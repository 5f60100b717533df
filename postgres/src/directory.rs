//! `Directory` over the `players`, `games` and `absences` tables.

use crate::{PostgresBookingStore, database_error, parse_column, violated_constraint};
use chrono::{DateTime, NaiveDate, Utc};
use futsal_booking_core::{
    AbsenceId, AbsenceRecord, BoxFuture, DateRange, Directory, Game, GameId, GameStatus,
    LedgerError, NewAbsence, NewGame, NewPlayer, Player, PlayerId, Tier,
};
use sqlx::Row;
use sqlx::postgres::PgRow;

const PLAYER_COLUMNS: &str = "id, username, first_name, last_name, email, mobile_number, tier";
const GAME_COLUMNS: &str = "id, game_date, status, description";
const ABSENCE_COLUMNS: &str = "id, player_id, start_date, end_date, status, reason, created_at";

fn row_to_player(row: &PgRow) -> Result<Player, LedgerError> {
    let tier: String = row.try_get("tier").map_err(database_error)?;
    Ok(Player {
        id: PlayerId::new(row.try_get("id").map_err(database_error)?),
        username: row.try_get("username").map_err(database_error)?,
        first_name: row.try_get("first_name").map_err(database_error)?,
        last_name: row.try_get("last_name").map_err(database_error)?,
        email: row.try_get("email").map_err(database_error)?,
        mobile_number: row.try_get("mobile_number").map_err(database_error)?,
        tier: parse_column(&tier, "tier")?,
    })
}

fn row_to_game(row: &PgRow) -> Result<Game, LedgerError> {
    let status: String = row.try_get("status").map_err(database_error)?;
    Ok(Game {
        id: GameId::new(row.try_get("id").map_err(database_error)?),
        date: row.try_get("game_date").map_err(database_error)?,
        status: parse_column(&status, "game status")?,
        description: row.try_get("description").map_err(database_error)?,
    })
}

fn row_to_absence(row: &PgRow) -> Result<AbsenceRecord, LedgerError> {
    let status: String = row.try_get("status").map_err(database_error)?;
    let start: NaiveDate = row.try_get("start_date").map_err(database_error)?;
    let end: NaiveDate = row.try_get("end_date").map_err(database_error)?;
    Ok(AbsenceRecord {
        id: AbsenceId::new(row.try_get("id").map_err(database_error)?),
        player: PlayerId::new(row.try_get("player_id").map_err(database_error)?),
        range: DateRange::new(start, end)
            .map_err(|e| LedgerError::DatabaseError(e.to_string()))?,
        status: parse_column(&status, "status")?,
        reason: row.try_get("reason").map_err(database_error)?,
        created_at: row.try_get("created_at").map_err(database_error)?,
    })
}

impl PostgresBookingStore {
    async fn insert_player_row(&self, player: NewPlayer) -> Result<Player, LedgerError> {
        let row = sqlx::query(&format!(
            r"
            INSERT INTO players (username, first_name, last_name, email, mobile_number, tier)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PLAYER_COLUMNS}
            "
        ))
        .bind(&player.username)
        .bind(&player.first_name)
        .bind(&player.last_name)
        .bind(&player.email)
        .bind(&player.mobile_number)
        .bind(player.tier.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match violated_constraint(&e).as_deref() {
            Some("players_username_key") => LedgerError::Duplicate {
                field: "username",
                value: player.username.clone(),
            },
            _ => database_error(e),
        })?;

        row_to_player(&row)
    }

    async fn player_row(&self, id: PlayerId) -> Result<Option<Player>, LedgerError> {
        sqlx::query(&format!("SELECT {PLAYER_COLUMNS} FROM players WHERE id = $1"))
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?
            .as_ref()
            .map(row_to_player)
            .transpose()
    }

    async fn player_rows(&self) -> Result<Vec<Player>, LedgerError> {
        let rows = sqlx::query(&format!("SELECT {PLAYER_COLUMNS} FROM players ORDER BY id"))
            .fetch_all(&self.pool)
            .await
            .map_err(database_error)?;
        rows.iter().map(row_to_player).collect()
    }

    async fn update_tier_row(&self, id: PlayerId, tier: Tier) -> Result<Player, LedgerError> {
        let row = sqlx::query(&format!(
            "UPDATE players SET tier = $2 WHERE id = $1 RETURNING {PLAYER_COLUMNS}"
        ))
        .bind(id.get())
        .bind(tier.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?
        .ok_or(LedgerError::UnknownPlayer(id))?;

        row_to_player(&row)
    }

    async fn insert_game_row(&self, game: NewGame) -> Result<Game, LedgerError> {
        let row = sqlx::query(&format!(
            r"
            INSERT INTO games (game_date, status, description)
            VALUES ($1, $2, $3)
            RETURNING {GAME_COLUMNS}
            "
        ))
        .bind(game.date)
        .bind(game.status.as_str())
        .bind(&game.description)
        .fetch_one(&self.pool)
        .await
        .map_err(database_error)?;

        row_to_game(&row)
    }

    async fn game_row(&self, id: GameId) -> Result<Option<Game>, LedgerError> {
        sqlx::query(&format!("SELECT {GAME_COLUMNS} FROM games WHERE id = $1"))
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?
            .as_ref()
            .map(row_to_game)
            .transpose()
    }

    async fn game_rows(
        &self,
        between: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<Vec<Game>, LedgerError> {
        let rows = match between {
            Some((start, end)) => {
                sqlx::query(&format!(
                    r"
                    SELECT {GAME_COLUMNS} FROM games
                    WHERE game_date BETWEEN $1 AND $2
                    ORDER BY game_date, id
                    "
                ))
                .bind(start)
                .bind(end)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!("SELECT {GAME_COLUMNS} FROM games ORDER BY game_date, id"))
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(database_error)?;

        rows.iter().map(row_to_game).collect()
    }

    async fn update_game_row(
        &self,
        id: GameId,
        status: GameStatus,
        description: String,
    ) -> Result<Game, LedgerError> {
        let row = sqlx::query(&format!(
            r"
            UPDATE games SET status = $2, description = $3
            WHERE id = $1
            RETURNING {GAME_COLUMNS}
            "
        ))
        .bind(id.get())
        .bind(status.as_str())
        .bind(&description)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?
        .ok_or(LedgerError::UnknownGame(id))?;

        row_to_game(&row)
    }

    async fn insert_absence_row(
        &self,
        absence: NewAbsence,
        created_at: DateTime<Utc>,
    ) -> Result<AbsenceRecord, LedgerError> {
        let row = sqlx::query(&format!(
            r"
            INSERT INTO absences (player_id, start_date, end_date, status, reason, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ABSENCE_COLUMNS}
            "
        ))
        .bind(absence.player.get())
        .bind(absence.range.start())
        .bind(absence.range.end())
        .bind(absence.status.as_str())
        .bind(&absence.reason)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match violated_constraint(&e).as_deref() {
            Some("absences_player_fk") => LedgerError::UnknownPlayer(absence.player),
            _ => database_error(e),
        })?;

        row_to_absence(&row)
    }

    async fn absence_rows(&self, player: Option<PlayerId>) -> Result<Vec<AbsenceRecord>, LedgerError> {
        let rows = sqlx::query(&format!(
            r"
            SELECT {ABSENCE_COLUMNS} FROM absences
            WHERE $1::BIGINT IS NULL OR player_id = $1
            ORDER BY start_date, id
            "
        ))
        .bind(player.map(PlayerId::get))
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        rows.iter().map(row_to_absence).collect()
    }
}

impl Directory for PostgresBookingStore {
    fn insert_player(&self, player: NewPlayer) -> BoxFuture<'_, Result<Player, LedgerError>> {
        Box::pin(self.insert_player_row(player))
    }

    fn player(&self, id: PlayerId) -> BoxFuture<'_, Result<Option<Player>, LedgerError>> {
        Box::pin(self.player_row(id))
    }

    fn players(&self) -> BoxFuture<'_, Result<Vec<Player>, LedgerError>> {
        Box::pin(self.player_rows())
    }

    fn update_tier(&self, id: PlayerId, tier: Tier) -> BoxFuture<'_, Result<Player, LedgerError>> {
        Box::pin(self.update_tier_row(id, tier))
    }

    fn insert_game(&self, game: NewGame) -> BoxFuture<'_, Result<Game, LedgerError>> {
        Box::pin(self.insert_game_row(game))
    }

    fn game(&self, id: GameId) -> BoxFuture<'_, Result<Option<Game>, LedgerError>> {
        Box::pin(self.game_row(id))
    }

    fn games(&self) -> BoxFuture<'_, Result<Vec<Game>, LedgerError>> {
        Box::pin(self.game_rows(None))
    }

    fn games_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BoxFuture<'_, Result<Vec<Game>, LedgerError>> {
        Box::pin(self.game_rows(Some((start, end))))
    }

    fn update_game(
        &self,
        id: GameId,
        status: GameStatus,
        description: String,
    ) -> BoxFuture<'_, Result<Game, LedgerError>> {
        Box::pin(self.update_game_row(id, status, description))
    }

    fn insert_absence(
        &self,
        absence: NewAbsence,
        created_at: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<AbsenceRecord, LedgerError>> {
        Box::pin(self.insert_absence_row(absence, created_at))
    }

    fn absences(
        &self,
        player: Option<PlayerId>,
    ) -> BoxFuture<'_, Result<Vec<AbsenceRecord>, LedgerError>> {
        Box::pin(self.absence_rows(player))
    }
}
