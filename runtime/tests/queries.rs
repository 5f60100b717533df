//! Read views and administration of players and games.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use futsal_booking_core::{
    BookingStatus, GameId, GameStatus, LedgerError, NewGame, NewPlayer, PlayerId, Tier,
};
use futsal_booking_runtime::{
    BookingEngine, BookingEnvironment, BookingError, EngineConfig, TierCounts,
};
use futsal_booking_testing::{BookingHarness, InMemoryBookingStore, RecordingNotifier, SteppingClock};
use std::sync::Arc;

fn names(players: &[futsal_booking_core::Player]) -> Vec<&str> {
    players.iter().map(|p| p.username.as_str()).collect()
}

#[tokio::test]
async fn summary_pairs_cancellations_with_substitutes() {
    let h = BookingHarness::new();
    let anna = h.player("anna", Tier::Permanent).await;
    let bart = h.player("bart", Tier::Active).await;
    let cleo = h.player("cleo", Tier::Active).await;
    let dan = h.player("dan", Tier::Permanent).await;
    let game = h.game(7, true).await;

    h.opt_in(bart.id, game.id).await;
    h.opt_out(anna.id, game.id).await;
    h.opt_in(cleo.id, game.id).await;

    let summary = h.engine.game_summary(game.id).await.unwrap();
    assert_eq!(names(&summary.planned), vec!["dan"]);
    assert!(summary.reserved.is_empty());
    assert_eq!(names(&summary.awaiting), vec!["cleo"]);
    assert_eq!(names(&summary.confirmed), vec!["bart"]);
    assert_eq!(names(&summary.cancelled), vec!["anna"]);
    assert_eq!(summary.booked, 2);

    h.opt_out(dan.id, game.id).await;
    h.opt_out(bart.id, game.id).await;

    let summary = h.engine.game_summary(game.id).await.unwrap();
    let pairs: Vec<_> = summary
        .cancelled_with_substitutes
        .iter()
        .map(|(cancelled, substitute)| {
            (
                cancelled.username.as_str(),
                substitute.as_ref().map(|p| p.username.as_str()),
            )
        })
        .collect();
    assert_eq!(pairs, vec![("anna", Some("cleo")), ("dan", None)]);
    assert_eq!(names(&summary.reserved), vec!["bart"]);
    assert_eq!(summary.booked, 1);
}

#[tokio::test]
async fn summary_of_unknown_game_is_rejected() {
    let h = BookingHarness::new();
    let err = h.engine.game_summary(GameId::new(77)).await.unwrap_err();
    assert!(matches!(err, BookingError::UnknownGame(_)));
}

#[tokio::test]
async fn histories_are_oldest_first() {
    let h = BookingHarness::new();
    let anna = h.player("anna", Tier::Permanent).await;
    let bart = h.player("bart", Tier::Active).await;
    let first = h.game(1, true).await;
    let second = h.game(2, true).await;

    h.opt_out(anna.id, second.id).await;
    h.opt_in(bart.id, first.id).await;

    let game_history = h.engine.booking_history(first.id).await.unwrap();
    assert_eq!(game_history.len(), 3);
    assert!(game_history.iter().all(|e| e.game == first.id));
    assert!(game_history.windows(2).all(|w| w[0].sequence < w[1].sequence));

    let all = h.engine.ledger_history().await.unwrap();
    assert_eq!(all.len(), 6);
    assert!(all.windows(2).all(|w| w[0].sequence < w[1].sequence));
    assert_eq!(all.last().map(|e| e.player), Some(bart.id));
}

#[tokio::test]
async fn current_status_requires_known_entities() {
    let h = BookingHarness::new();
    let anna = h.player("anna", Tier::Permanent).await;

    let err = h
        .engine
        .get_current_status(anna.id, GameId::new(5))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::UnknownGame(_)));

    let game = h.game(1, false).await;
    let err = h
        .engine
        .get_current_status(PlayerId::new(500), game.id)
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::UnknownPlayer(_)));
}

#[tokio::test]
async fn games_split_into_upcoming_and_past() {
    let h = BookingHarness::new();
    let past = h.game(-3, false).await;
    let today = h.game(0, false).await;
    let future = h.game(5, false).await;
    let played = h.game(2, false).await;
    h.engine
        .update_game(played.id, Some(GameStatus::Played), None)
        .await
        .unwrap();

    let today_date = BookingHarness::day(0);
    let upcoming: Vec<_> = h
        .engine
        .upcoming_games(today_date)
        .await
        .unwrap()
        .into_iter()
        .map(|g| g.id)
        .collect();
    assert_eq!(upcoming, vec![today.id, future.id]);

    let earlier: Vec<_> = h
        .engine
        .past_games(today_date)
        .await
        .unwrap()
        .into_iter()
        .map(|g| g.id)
        .collect();
    assert_eq!(earlier, vec![played.id, past.id]);
}

#[tokio::test]
async fn games_only_leave_planned_once() {
    let h = BookingHarness::new();
    let game = h.game(3, false).await;

    let cancelled = h
        .engine
        .update_game(game.id, Some(GameStatus::Cancelled), Some("pitch flooded".into()))
        .await
        .unwrap();
    assert_eq!(cancelled.status, GameStatus::Cancelled);
    assert_eq!(cancelled.description, "pitch flooded");

    let err = h
        .engine
        .update_game(game.id, Some(GameStatus::Played), None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BookingError::InvalidGameTransition {
            from: GameStatus::Cancelled,
            to: GameStatus::Played,
            ..
        }
    ));

    let renamed = h
        .engine
        .update_game(game.id, None, Some("moved indoors".into()))
        .await
        .unwrap();
    assert_eq!(renamed.status, GameStatus::Cancelled);
    assert_eq!(renamed.description, "moved indoors");

    let err = h
        .engine
        .update_game(GameId::new(999), Some(GameStatus::Played), None)
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::UnknownGame(_)));
}

#[tokio::test]
async fn players_are_filtered_by_name_and_tier() {
    let h = BookingHarness::new();
    h.player("anna", Tier::Permanent).await;
    h.player("annabel", Tier::Active).await;
    h.player("bart", Tier::Active).await;
    h.player("cleo", Tier::Inactive).await;

    let found = h.engine.find_players(Some("ANN"), None).await.unwrap();
    assert_eq!(names(&found), vec!["anna", "annabel"]);

    let found = h
        .engine
        .find_players(Some("ann"), Some(Tier::Active))
        .await
        .unwrap();
    assert_eq!(names(&found), vec!["annabel"]);

    // Single characters are too short to filter on.
    let found = h.engine.find_players(Some("a"), None).await.unwrap();
    assert_eq!(found.len(), 4);

    assert_eq!(
        h.engine.tier_counts().await.unwrap(),
        TierCounts {
            permanent: 1,
            active: 2,
            inactive: 1,
            total: 4,
        }
    );
}

#[tokio::test]
async fn registration_validates_and_rejects_duplicates() {
    let h = BookingHarness::new();
    h.player("anna", Tier::Permanent).await;

    let duplicate = NewPlayer {
        username: "anna".into(),
        first_name: "Anna".into(),
        last_name: "Kowalska".into(),
        email: "other@example.com".into(),
        mobile_number: "500600700".into(),
        tier: Tier::Active,
    };
    let err = h.engine.register_player(duplicate.clone()).await.unwrap_err();
    assert!(matches!(
        err,
        BookingError::Ledger(LedgerError::Duplicate { field: "username", .. })
    ));

    let bad_mobile = NewPlayer {
        username: "zoe".into(),
        mobile_number: "5006007".into(),
        ..duplicate
    };
    let err = h.engine.register_player(bad_mobile).await.unwrap_err();
    assert!(matches!(err, BookingError::InvalidPlayer(_)));
}

#[tokio::test]
async fn tier_changes_leave_bookings_alone() {
    let h = BookingHarness::new();
    let anna = h.player("anna", Tier::Permanent).await;
    let game = h.game(3, true).await;
    let before = h.store.entry_count();

    let demoted = h.engine.change_tier(anna.id, Tier::Inactive).await.unwrap();

    assert_eq!(demoted.tier, Tier::Inactive);
    assert_eq!(h.store.entry_count(), before);
    assert_eq!(h.status(anna.id, game.id).await, Some(BookingStatus::Planned));

    let err = h
        .engine
        .change_tier(PlayerId::new(404), Tier::Active)
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::UnknownPlayer(_)));
}

#[tokio::test]
async fn entries_carry_the_engine_clock() {
    let store = InMemoryBookingStore::new();
    let start = futsal_booking_testing::test_clock().time();
    let clock = SteppingClock::new(start, chrono::Duration::minutes(1));
    let engine = BookingEngine::new(
        BookingEnvironment::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(RecordingNotifier::new()),
            Arc::new(clock.clone()),
        ),
        EngineConfig::default(),
    );

    let anna = engine
        .register_player(NewPlayer {
            username: "anna".into(),
            first_name: String::new(),
            last_name: String::new(),
            email: "anna@example.com".into(),
            mobile_number: "600700800".into(),
            tier: Tier::Permanent,
        })
        .await
        .unwrap();
    let game = engine
        .create_game(NewGame::planned(BookingHarness::day(3), "friday"), true)
        .await
        .unwrap();
    engine.apply_player_action(anna.id, game.id, false).await.unwrap();

    let history = engine.player_history(anna.id, game.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert!(history[0].created_at < history[1].created_at);
    assert!(history[0].created_at >= start);
}
