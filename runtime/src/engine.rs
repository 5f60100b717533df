//! The booking engine: player actions, the queue-promotion sweep and game
//! creation.
//!
//! Every write follows the same shape:
//!
//! 1. take the game's lock
//! 2. load the game's ledger entries and build a [`GameRoster`]
//! 3. decide on at most one entry with a pure rule from `futsal-booking-core`
//! 4. append it, expecting the pair's revision read in step 2
//! 5. on a revision conflict, repeat 2-4 under the [`RetryPolicy`]
//! 6. run the sweep if the status changed
//! 7. release the lock, then notify
//!
//! [`RetryPolicy`]: crate::retry::RetryPolicy

use crate::dead_letter::{Audience, DeadLetter, DeadLetterQueue};
use crate::error::{BookingError, Result};
use crate::locks::{GameGuard, GameLocks};
use crate::metrics::{
    BOOKING_CONFLICTS, BOOKING_NOOP_ACTIONS, BOOKING_PROMOTIONS, BOOKING_TRANSITIONS,
    NOTIFICATIONS_FAILED,
};
use crate::retry::retry_when;
use crate::{BookingEnvironment, EngineConfig};
use futsal_booking_core::roster::resolve_latest;
use futsal_booking_core::transition::next_status;
use futsal_booking_core::{
    BookingEntry, BookingStatus, ChangeCause, Clock, Expected, Game, GameId, GameRoster,
    LedgerError, NewBookingEntry, NewGame, NotificationError, Player, PlayerId, StatusChange,
};
use tracing::{debug, info, warn};

/// Result of [`BookingEngine::apply_player_action`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionOutcome {
    /// Latest status before the action
    pub previous: Option<BookingStatus>,
    /// Latest status after the action and the sweep
    pub status: Option<BookingStatus>,
    /// Entry appended for the acting player, `None` for a no-op
    pub entry: Option<BookingEntry>,
    /// Entry appended by the sweep, if it promoted someone
    pub promotion: Option<BookingEntry>,
}

impl ActionOutcome {
    /// Whether the action appended an entry.
    #[must_use]
    pub const fn changed(&self) -> bool {
        self.entry.is_some()
    }
}

/// An entry appended during one engine operation.
#[derive(Clone, Debug)]
pub(crate) struct Committed {
    pub(crate) entry: BookingEntry,
    pub(crate) previous: Option<BookingStatus>,
    pub(crate) cause: ChangeCause,
}

impl Committed {
    /// Whether the append moved the pair to a different status.
    pub(crate) fn changed_status(&self) -> bool {
        self.previous != Some(self.entry.status)
    }
}

/// Decision of a pure rule: append `status` for `player`, or nothing.
pub(crate) type Decision = Option<(PlayerId, BookingStatus)>;

/// The booking status engine.
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
pub struct BookingEngine {
    pub(crate) env: BookingEnvironment,
    pub(crate) config: EngineConfig,
    locks: GameLocks,
    dead_letters: DeadLetterQueue,
}

impl BookingEngine {
    /// Creates an engine over `env`.
    #[must_use]
    pub fn new(env: BookingEnvironment, config: EngineConfig) -> Self {
        let dead_letters = DeadLetterQueue::new(config.dead_letter_capacity);
        Self {
            env,
            config,
            locks: GameLocks::default(),
            dead_letters,
        }
    }

    /// Engine tuning in effect.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The engine's clock.
    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.env.clock.as_ref()
    }

    /// Notifications that failed and were parked.
    #[must_use]
    pub const fn dead_letters(&self) -> &DeadLetterQueue {
        &self.dead_letters
    }

    /// Applies a player's attendance toggle to one game.
    ///
    /// `opt_in = true` means the player wants to play. A change is appended
    /// and announced; an unchanged status appends nothing. After a change the
    /// sweep may confirm the longest-waiting awaiting player.
    ///
    /// # Errors
    ///
    /// - `UnknownPlayer` / `UnknownGame`: nothing was appended
    /// - `InvalidTransition`: the latest status has no table row
    /// - `ConcurrentConflict`: the retry budget ran out
    /// - `Ledger`: storage failure
    pub async fn apply_player_action(
        &self,
        player: PlayerId,
        game: GameId,
        opt_in: bool,
    ) -> Result<ActionOutcome> {
        self.require_player(player).await?;
        let game = self.require_game(game).await?;

        let guard = self.lock_game(game.id).await;

        let Some(committed) = self
            .commit(game.id, ChangeCause::PlayerAction, |roster| {
                let current = roster.latest(player);
                let next = next_status(current, opt_in, roster.has_open_slot())?;
                Ok(next.target().map(|status| (player, status)))
            })
            .await?
        else {
            let status = self.latest_status(player, game.id).await?;
            drop(guard);
            metrics::counter!(BOOKING_NOOP_ACTIONS).increment(1);
            debug!(%player, game = %game.id, opt_in, ?status, "Player action left status unchanged");
            return Ok(ActionOutcome {
                previous: status,
                status,
                entry: None,
                promotion: None,
            });
        };

        let swept = self.sweep(game.id).await;
        drop(guard);

        let promotion = match swept {
            Ok(promotion) => promotion,
            Err(err) => {
                self.announce(&game, vec![committed]).await;
                return Err(err);
            }
        };

        let status = match &promotion {
            Some(promoted) if promoted.entry.player == player => Some(promoted.entry.status),
            _ => Some(committed.entry.status),
        };
        let outcome = ActionOutcome {
            previous: committed.previous,
            status,
            entry: Some(committed.entry.clone()),
            promotion: promotion.as_ref().map(|promoted| promoted.entry.clone()),
        };

        self.announce(&game, std::iter::once(committed).chain(promotion).collect())
            .await;
        Ok(outcome)
    }

    /// Creates a game.
    ///
    /// With `seed_default_bookings`, every player whose tier has a default
    /// status gets it (silently). Absence records covering the game's date
    /// are then reapplied, oldest start first.
    ///
    /// # Errors
    ///
    /// Returns `Ledger` on storage failure.
    pub async fn create_game(&self, new_game: NewGame, seed_default_bookings: bool) -> Result<Game> {
        let game = self.env.directory.insert_game(new_game).await?;
        info!(game = %game.id, date = %game.date, seed_default_bookings, "Game created");

        let guard = self.lock_game(game.id).await;
        let mut committed = Vec::new();

        if seed_default_bookings {
            for player in self.env.directory.players().await? {
                let Some(status) = player.tier.default_status() else {
                    continue;
                };
                let player = player.id;
                committed.extend(
                    self.commit(game.id, ChangeCause::Seeding, |roster| {
                        Ok(roster.latest(player).is_none().then_some((player, status)))
                    })
                    .await?,
                );
            }
        }

        let absences = self.env.directory.absences(None).await?;
        for absence in absences.iter().filter(|a| a.range.contains(game.date)) {
            committed.extend(self.reconcile_absence(game.id, absence).await?);
        }

        committed.extend(self.sweep(game.id).await?);
        drop(guard);

        self.announce(&game, committed).await;
        Ok(game)
    }

    /// Confirms the longest-waiting awaiting player if a slot is open.
    ///
    /// At most one promotion per call. Caller must hold the game's lock.
    pub(crate) async fn sweep(&self, game: GameId) -> Result<Option<Committed>> {
        let promoted = self
            .commit(game, ChangeCause::Promotion, |roster| {
                if !roster.has_open_slot() {
                    return Ok(None);
                }
                Ok(roster
                    .awaiting_head()
                    .map(|player| (player, BookingStatus::Confirmed)))
            })
            .await?;

        if let Some(promoted) = &promoted {
            metrics::counter!(BOOKING_PROMOTIONS).increment(1);
            info!(player = %promoted.entry.player, %game, "Promoted awaiting player");
        }
        Ok(promoted)
    }

    /// Runs one read-decide-append step, retrying when the game moved.
    ///
    /// Caller must hold the game's lock. The lock only orders this
    /// process; the append is conditional on the game's head so writers
    /// elsewhere force a fresh read.
    pub(crate) async fn commit<F>(
        &self,
        game: GameId,
        cause: ChangeCause,
        decide: F,
    ) -> Result<Option<Committed>>
    where
        F: Fn(&GameRoster) -> Result<Decision> + Send + Sync,
    {
        let decide = &decide;
        let result = retry_when(
            &self.config.retry,
            move || async move { self.try_commit(game, cause, decide).await },
            BookingError::is_conflict,
        )
        .await;

        match result {
            Err(BookingError::Ledger(
                LedgerError::ConcurrencyConflict { player, game, .. }
                | LedgerError::GameMoved { player, game, .. },
            )) => Err(BookingError::ConcurrentConflict { player, game }),
            other => other,
        }
    }

    async fn try_commit<F>(
        &self,
        game: GameId,
        cause: ChangeCause,
        decide: &F,
    ) -> Result<Option<Committed>>
    where
        F: Fn(&GameRoster) -> Result<Decision> + Send + Sync,
    {
        let entries = self.env.ledger.game_entries(game).await?;
        let roster = GameRoster::from_entries(Some(game), &entries);

        let Some((player, status)) = decide(&roster)? else {
            return Ok(None);
        };

        let previous = roster.latest(player);
        let entry = NewBookingEntry {
            player,
            game,
            status,
            created_at: self.env.clock.now(),
        };
        let entry = self
            .env
            .ledger
            .append(entry, Expected::GameHead(roster.head()))
            .await
            .inspect_err(|err| match err {
                LedgerError::GameMoved { expected, actual, .. } => {
                    metrics::counter!(BOOKING_CONFLICTS).increment(1);
                    warn!(%player, %game, ?expected, ?actual, "Game changed before append");
                }
                LedgerError::ConcurrencyConflict { expected, actual, .. } => {
                    metrics::counter!(BOOKING_CONFLICTS).increment(1);
                    warn!(%player, %game, %expected, %actual, "Booking append conflicted");
                }
                _ => {}
            })?;

        metrics::counter!(BOOKING_TRANSITIONS, "cause" => cause.as_str(), "status" => status.as_str())
            .increment(1);
        info!(
            %player,
            %game,
            from = previous.map_or("none", |s| s.as_str()),
            to = %status,
            cause = cause.as_str(),
            sequence = entry.sequence.value(),
            "Booking status appended"
        );

        Ok(Some(Committed {
            entry,
            previous,
            cause,
        }))
    }

    /// Notifies player and admins of every announced status change.
    ///
    /// Failures are counted and parked; nothing here returns an error.
    pub(crate) async fn announce(&self, game: &Game, committed: Vec<Committed>) {
        for committed in committed
            .into_iter()
            .filter(|c| c.cause.is_announced() && c.changed_status())
        {
            let player = match self.env.directory.player(committed.entry.player).await {
                Ok(Some(player)) => player,
                Ok(None) => {
                    warn!(player = %committed.entry.player, "Cannot notify unknown player");
                    continue;
                }
                Err(err) => {
                    warn!(player = %committed.entry.player, error = %err, "Cannot load player to notify");
                    continue;
                }
            };

            let change = StatusChange {
                player,
                game: game.clone(),
                previous: committed.previous,
                status: committed.entry.status,
                cause: committed.cause,
            };

            if let Err(err) = self.env.notifier.notify_player(&change).await {
                self.park(change.clone(), Audience::Player, &err);
            }
            if let Err(err) = self.env.notifier.notify_admins(&change).await {
                self.park(change, Audience::Admins, &err);
            }
        }
    }

    fn park(&self, change: StatusChange, audience: Audience, err: &NotificationError) {
        metrics::counter!(NOTIFICATIONS_FAILED, "audience" => audience.as_str()).increment(1);
        self.dead_letters.push(DeadLetter {
            change,
            audience,
            error: err.to_string(),
            failed_at: self.env.clock.now(),
        });
    }

    pub(crate) async fn lock_game(&self, game: GameId) -> GameGuard<'_> {
        self.locks.lock(game).await
    }

    pub(crate) async fn require_player(&self, player: PlayerId) -> Result<Player> {
        self.env
            .directory
            .player(player)
            .await?
            .ok_or(BookingError::UnknownPlayer(player))
    }

    pub(crate) async fn require_game(&self, game: GameId) -> Result<Game> {
        self.env
            .directory
            .game(game)
            .await?
            .ok_or(BookingError::UnknownGame(game))
    }

    pub(crate) async fn latest_status(
        &self,
        player: PlayerId,
        game: GameId,
    ) -> Result<Option<BookingStatus>> {
        let history = self.env.ledger.history(player, game).await?;
        Ok(resolve_latest(&history).map(|entry| entry.status))
    }
}

impl std::fmt::Debug for BookingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingEngine")
            .field("config", &self.config)
            .field("dead_letters", &self.dead_letters.len())
            .finish_non_exhaustive()
    }
}
