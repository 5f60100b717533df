//! `BookingLedger` over the `booking_entries` table.

use crate::{PostgresBookingStore, database_error, parse_column, to_i64, to_u64, violated_constraint};
use futsal_booking_core::{
    BookingEntry, BookingLedger, BoxFuture, Expected, GameId, LedgerError, NewBookingEntry,
    PlayerId, Revision, Sequence,
};
use sqlx::Row;
use sqlx::postgres::PgRow;
use std::time::Instant;

const SELECT_ENTRIES: &str = r"
    SELECT sequence, revision, player_id, game_id, status, created_at
    FROM booking_entries
";

impl PostgresBookingStore {
    /// Appends under the game's row lock.
    ///
    /// Every append to a game takes `FOR UPDATE` on its `games` row first, so
    /// appends to one game commit one at a time in sequence order, and the
    /// head and revision read below are current (READ COMMITTED re-reads
    /// after the lock is granted).
    async fn append_entry(
        &self,
        entry: NewBookingEntry,
        expected: Expected,
    ) -> Result<BookingEntry, LedgerError> {
        let started = Instant::now();
        let mut tx = self.pool.begin().await.map_err(database_error)?;

        sqlx::query("SELECT id FROM games WHERE id = $1 FOR UPDATE")
            .bind(entry.game.get())
            .fetch_optional(&mut *tx)
            .await
            .map_err(database_error)?
            .ok_or(LedgerError::UnknownGame(entry.game))?;

        let (head,): (Option<i64>,) =
            sqlx::query_as("SELECT MAX(sequence) FROM booking_entries WHERE game_id = $1")
                .bind(entry.game.get())
                .fetch_one(&mut *tx)
                .await
                .map_err(database_error)?;
        let head = head
            .map(|sequence| to_u64(sequence, "sequence").map(Sequence::new))
            .transpose()?;

        let (current,): (i64,) = sqlx::query_as(
            r"
            SELECT COALESCE(MAX(revision), 0)
            FROM booking_entries
            WHERE player_id = $1 AND game_id = $2
            ",
        )
        .bind(entry.player.get())
        .bind(entry.game.get())
        .fetch_one(&mut *tx)
        .await
        .map_err(database_error)?;
        let actual = Revision::new(to_u64(current, "revision")?);

        match expected {
            Expected::Revision(expected) if expected != actual => {
                return Err(LedgerError::ConcurrencyConflict {
                    player: entry.player,
                    game: entry.game,
                    expected,
                    actual,
                });
            }
            Expected::GameHead(expected) if expected != head => {
                return Err(LedgerError::GameMoved {
                    player: entry.player,
                    game: entry.game,
                    expected,
                    actual: head,
                });
            }
            _ => {}
        }

        let revision = actual.next();
        let (sequence,): (i64,) = sqlx::query_as(
            r"
            INSERT INTO booking_entries (player_id, game_id, revision, status, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING sequence
            ",
        )
        .bind(entry.player.get())
        .bind(entry.game.get())
        .bind(to_i64(revision.value(), "revision")?)
        .bind(entry.status.as_str())
        .bind(entry.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match violated_constraint(&e).as_deref() {
            // A concurrent writer committed the same revision first.
            Some("booking_entries_pair_revision_key") => LedgerError::ConcurrencyConflict {
                player: entry.player,
                game: entry.game,
                expected: actual,
                actual: revision,
            },
            Some("booking_entries_player_fk") => LedgerError::UnknownPlayer(entry.player),
            Some("booking_entries_game_fk") => LedgerError::UnknownGame(entry.game),
            _ => database_error(e),
        })?;

        tx.commit().await.map_err(database_error)?;

        metrics::histogram!("booking_store_append_seconds").record(started.elapsed().as_secs_f64());
        tracing::debug!(
            player = %entry.player,
            game = %entry.game,
            status = %entry.status,
            sequence,
            %revision,
            "Booking entry stored"
        );

        Ok(BookingEntry {
            sequence: Sequence::new(to_u64(sequence, "sequence")?),
            revision,
            player: entry.player,
            game: entry.game,
            status: entry.status,
            created_at: entry.created_at,
        })
    }

    async fn fetch_entries(
        &self,
        filter: &str,
        player: Option<PlayerId>,
        game: Option<GameId>,
    ) -> Result<Vec<BookingEntry>, LedgerError> {
        let sql = format!("{SELECT_ENTRIES} {filter} ORDER BY sequence ASC");
        let mut query = sqlx::query(&sql);
        if let Some(player) = player {
            query = query.bind(player.get());
        }
        if let Some(game) = game {
            query = query.bind(game.get());
        }

        let rows = query.fetch_all(&self.pool).await.map_err(database_error)?;
        rows.iter().map(row_to_entry).collect()
    }
}

fn row_to_entry(row: &PgRow) -> Result<BookingEntry, LedgerError> {
    let status: String = row.try_get("status").map_err(database_error)?;
    Ok(BookingEntry {
        sequence: Sequence::new(to_u64(row.try_get("sequence").map_err(database_error)?, "sequence")?),
        revision: Revision::new(to_u64(row.try_get("revision").map_err(database_error)?, "revision")?),
        player: PlayerId::new(row.try_get("player_id").map_err(database_error)?),
        game: GameId::new(row.try_get("game_id").map_err(database_error)?),
        status: parse_column(&status, "status")?,
        created_at: row.try_get("created_at").map_err(database_error)?,
    })
}

impl BookingLedger for PostgresBookingStore {
    fn append(
        &self,
        entry: NewBookingEntry,
        expected: Expected,
    ) -> BoxFuture<'_, Result<BookingEntry, LedgerError>> {
        Box::pin(self.append_entry(entry, expected))
    }

    fn history(
        &self,
        player: PlayerId,
        game: GameId,
    ) -> BoxFuture<'_, Result<Vec<BookingEntry>, LedgerError>> {
        Box::pin(self.fetch_entries(
            "WHERE player_id = $1 AND game_id = $2",
            Some(player),
            Some(game),
        ))
    }

    fn game_entries(&self, game: GameId) -> BoxFuture<'_, Result<Vec<BookingEntry>, LedgerError>> {
        Box::pin(self.fetch_entries("WHERE game_id = $1", None, Some(game)))
    }

    fn all_entries(&self) -> BoxFuture<'_, Result<Vec<BookingEntry>, LedgerError>> {
        Box::pin(self.fetch_entries("", None, None))
    }
}
