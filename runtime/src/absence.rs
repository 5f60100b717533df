//! Absence propagation.

use crate::engine::{BookingEngine, Committed};
use crate::error::Result;
use crate::metrics::BOOKING_ABSENCE_ENTRIES;
use futsal_booking_core::absence::reconcile;
use futsal_booking_core::{AbsenceRecord, ChangeCause, GameId, NewAbsence, PlayerId};
use tracing::info;

impl BookingEngine {
    /// Records an absence and reconciles every game dated inside it,
    /// past games included.
    ///
    /// Each game is handled under its own lock: the reconciled entry is
    /// appended, the sweep runs if the player's status actually changed, and
    /// notifications go out once the lock is released.
    ///
    /// # Errors
    ///
    /// - `UnknownPlayer`: nothing was stored
    /// - `ConcurrentConflict` / `Ledger`: the record is stored and games
    ///   before the failing one are reconciled
    pub async fn declare_absence(&self, absence: NewAbsence) -> Result<AbsenceRecord> {
        self.require_player(absence.player).await?;

        let record = self
            .env
            .directory
            .insert_absence(absence, self.env.clock.now())
            .await?;
        info!(
            player = %record.player,
            range = %record.range,
            status = %record.status,
            "Absence declared"
        );

        let games = self
            .env
            .directory
            .games_between(record.range.start(), record.range.end())
            .await?;

        for game in games {
            let guard = self.lock_game(game.id).await;
            let mut committed = Vec::new();

            if let Some(entry) = self.reconcile_absence(game.id, &record).await? {
                let changed = entry.changed_status();
                committed.push(entry);
                if changed {
                    committed.extend(self.sweep(game.id).await?);
                }
            }

            drop(guard);
            self.announce(&game, committed).await;
        }

        Ok(record)
    }

    /// Absence records, optionally for one player, ordered by start date.
    ///
    /// # Errors
    ///
    /// Returns `Ledger` on storage failure.
    pub async fn absences(&self, player: Option<PlayerId>) -> Result<Vec<AbsenceRecord>> {
        Ok(self.env.directory.absences(player).await?)
    }

    /// Appends the reconciled entry of `absence` for one game, if any.
    ///
    /// Caller must hold the game's lock.
    pub(crate) async fn reconcile_absence(
        &self,
        game: GameId,
        absence: &AbsenceRecord,
    ) -> Result<Option<Committed>> {
        let player = absence.player;
        let status = absence.status;

        let committed = self
            .commit(game, ChangeCause::Absence, |roster| {
                Ok(reconcile(roster.latest(player), status).map(|next| (player, next)))
            })
            .await?;

        if committed.is_some() {
            metrics::counter!(BOOKING_ABSENCE_ENTRIES).increment(1);
        }
        Ok(committed)
    }
}
