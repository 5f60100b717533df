//! A booking engine wired to in-memory capabilities.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Every helper panics on engine errors

use crate::memory::InMemoryBookingStore;
use crate::mocks::{FixedClock, RecordingNotifier, test_clock};
use chrono::{Days, NaiveDate};
use futsal_booking_core::{
    AbsenceRecord, BookingStatus, DateRange, Game, GameId, NewAbsence, NewGame, NewPlayer, Player,
    PlayerId, Tier,
};
use futsal_booking_runtime::{
    ActionOutcome, BookingEngine, BookingEnvironment, EngineConfig, RetryPolicy,
};
use std::sync::Arc;
use std::time::Duration;

/// Engine plus handles on its store, notifier and clock.
///
/// Day offsets are relative to the [`test_clock`] date, 2025-01-01.
#[derive(Clone)]
pub struct BookingHarness {
    /// The engine under test
    pub engine: Arc<BookingEngine>,
    /// Backing ledger and directory
    pub store: InMemoryBookingStore,
    /// Records every notification
    pub notifier: RecordingNotifier,
    /// The engine's clock
    pub clock: FixedClock,
}

impl Default for BookingHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl BookingHarness {
    /// Harness with millisecond retry delays.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EngineConfig {
            retry: RetryPolicy::builder()
                .max_retries(3)
                .initial_delay(Duration::from_millis(1))
                .max_delay(Duration::from_millis(5))
                .build(),
            dead_letter_capacity: 100,
        })
    }

    /// Harness with explicit engine tuning.
    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        let store = InMemoryBookingStore::new();
        let notifier = RecordingNotifier::new();
        let clock = test_clock();
        let env = BookingEnvironment::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(notifier.clone()),
            Arc::new(clock.clone()),
        );
        Self {
            engine: Arc::new(BookingEngine::new(env, config)),
            store,
            notifier,
            clock,
        }
    }

    /// The date `offset` days after 2025-01-01 (negative goes back).
    #[must_use]
    pub fn day(offset: i64) -> NaiveDate {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let days = Days::new(offset.unsigned_abs());
        if offset >= 0 {
            start.checked_add_days(days).unwrap()
        } else {
            start.checked_sub_days(days).unwrap()
        }
    }

    /// Registers a player with valid contact data.
    pub async fn player(&self, username: &str, tier: Tier) -> Player {
        self.engine
            .register_player(NewPlayer {
                username: username.to_string(),
                first_name: String::new(),
                last_name: String::new(),
                email: format!("{username}@example.com"),
                mobile_number: "600700800".to_string(),
                tier,
            })
            .await
            .unwrap()
    }

    /// Creates a planned game `offset` days from 2025-01-01.
    pub async fn game(&self, offset: i64, seed_default_bookings: bool) -> Game {
        self.engine
            .create_game(
                NewGame::planned(Self::day(offset), format!("game on day {offset}")),
                seed_default_bookings,
            )
            .await
            .unwrap()
    }

    /// Declares a `resting` absence over `[from, to]` day offsets.
    pub async fn rest(&self, player: PlayerId, from: i64, to: i64) -> AbsenceRecord {
        self.absence(player, from, to, BookingStatus::Resting).await
    }

    /// Declares an absence with any status over `[from, to]` day offsets.
    pub async fn absence(
        &self,
        player: PlayerId,
        from: i64,
        to: i64,
        status: BookingStatus,
    ) -> AbsenceRecord {
        self.engine
            .declare_absence(NewAbsence {
                player,
                range: DateRange::new(Self::day(from), Self::day(to)).unwrap(),
                status,
                reason: "holiday".to_string(),
            })
            .await
            .unwrap()
    }

    /// Player wants to play.
    pub async fn opt_in(&self, player: PlayerId, game: GameId) -> ActionOutcome {
        self.engine
            .apply_player_action(player, game, true)
            .await
            .unwrap()
    }

    /// Player withdraws.
    pub async fn opt_out(&self, player: PlayerId, game: GameId) -> ActionOutcome {
        self.engine
            .apply_player_action(player, game, false)
            .await
            .unwrap()
    }

    /// Latest status of a pair.
    pub async fn status(&self, player: PlayerId, game: GameId) -> Option<BookingStatus> {
        self.engine.get_current_status(player, game).await.unwrap()
    }

    /// Usernames of players whose latest status is `status`, FIFO order.
    pub async fn usernames_with(&self, status: BookingStatus, game: GameId) -> Vec<String> {
        self.engine
            .list_players_by_status(&[status], game, futsal_booking_core::Order::Ascending)
            .await
            .unwrap()
            .into_iter()
            .map(|player| player.username)
            .collect()
    }

    /// Booked count of a game.
    pub async fn booked(&self, game: GameId) -> usize {
        self.engine.count_booked_players(game).await.unwrap()
    }
}
