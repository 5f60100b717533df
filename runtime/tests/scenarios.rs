//! End-to-end booking scenarios against the in-memory store.
//!
//! Covers default seeding, the transition table through the engine, the
//! queue-promotion sweep and error handling.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use futsal_booking_core::{BookingStatus, GameId, Order, PlayerId, Tier};
use futsal_booking_runtime::{Audience, BookingError};
use futsal_booking_testing::BookingHarness;

use BookingStatus::{Awaiting, Cancelled, Confirmed, Planned, Reserved, Resting};

#[tokio::test]
async fn seeding_follows_tiers() {
    let h = BookingHarness::new();
    let anna = h.player("anna", Tier::Permanent).await;
    let bart = h.player("bart", Tier::Active).await;
    let cleo = h.player("cleo", Tier::Inactive).await;

    let game = h.game(7, true).await;

    assert_eq!(h.status(anna.id, game.id).await, Some(Planned));
    assert_eq!(h.status(bart.id, game.id).await, Some(Reserved));
    assert_eq!(h.status(cleo.id, game.id).await, None);
    assert_eq!(h.booked(game.id).await, 1);
    assert!(h.notifier.attempts().is_empty(), "seeding is silent");
}

#[tokio::test]
async fn unseeded_game_starts_empty() {
    let h = BookingHarness::new();
    let anna = h.player("anna", Tier::Permanent).await;
    let game = h.game(7, false).await;

    assert_eq!(h.status(anna.id, game.id).await, None);
    assert_eq!(h.store.entry_count(), 0);
}

#[tokio::test]
async fn reserved_player_opting_in_waits_without_open_slot() {
    let h = BookingHarness::new();
    h.player("anna", Tier::Permanent).await;
    let bart = h.player("bart", Tier::Active).await;
    let game = h.game(7, true).await;

    let outcome = h.opt_in(bart.id, game.id).await;

    assert_eq!(outcome.previous, Some(Reserved));
    assert_eq!(outcome.status, Some(Awaiting));
    assert!(outcome.promotion.is_none());
    assert_eq!(h.booked(game.id).await, 1);
}

#[tokio::test]
async fn cancellation_promotes_the_awaiting_player() {
    let h = BookingHarness::new();
    let anna = h.player("anna", Tier::Permanent).await;
    let bart = h.player("bart", Tier::Active).await;
    let game = h.game(7, true).await;
    h.opt_in(bart.id, game.id).await;
    h.notifier.clear();

    let outcome = h.opt_out(anna.id, game.id).await;

    assert_eq!(outcome.status, Some(Cancelled));
    let promotion = outcome.promotion.expect("sweep should promote");
    assert_eq!(promotion.player, bart.id);
    assert_eq!(promotion.status, Confirmed);

    assert!(h.usernames_with(Awaiting, game.id).await.is_empty());
    assert_eq!(h.usernames_with(Confirmed, game.id).await, vec!["bart"]);
    assert_eq!(h.booked(game.id).await, 1);

    let told: Vec<_> = h
        .notifier
        .delivered(Audience::Player)
        .into_iter()
        .map(|change| (change.player.username, change.status))
        .collect();
    assert_eq!(
        told,
        vec![("anna".to_string(), Cancelled), ("bart".to_string(), Confirmed)]
    );
    assert_eq!(h.notifier.delivered(Audience::Admins).len(), 2);
}

#[tokio::test]
async fn repeated_opt_in_is_idempotent() {
    let h = BookingHarness::new();
    let anna = h.player("anna", Tier::Permanent).await;
    let game = h.game(7, true).await;
    let before = h.store.entry_count();

    let first = h.opt_in(anna.id, game.id).await;
    let second = h.opt_in(anna.id, game.id).await;

    assert!(!first.changed());
    assert!(!second.changed());
    assert_eq!(second.status, Some(Planned));
    assert_eq!(h.store.entry_count(), before);
    assert!(h.notifier.attempts().is_empty());
}

#[tokio::test]
async fn cancelled_player_can_rejoin() {
    let h = BookingHarness::new();
    let anna = h.player("anna", Tier::Permanent).await;
    let game = h.game(7, true).await;

    h.opt_out(anna.id, game.id).await;
    h.opt_out(anna.id, game.id).await;
    let rejoined = h.opt_in(anna.id, game.id).await;

    assert_eq!(rejoined.previous, Some(Cancelled));
    assert_eq!(rejoined.status, Some(Planned));
    let history: Vec<_> = h
        .engine
        .player_history(anna.id, game.id)
        .await
        .unwrap()
        .into_iter()
        .map(|entry| entry.status)
        .collect();
    assert_eq!(history, vec![Planned, Cancelled, Planned]);
}

#[tokio::test]
async fn late_opt_in_fills_an_existing_vacancy() {
    let h = BookingHarness::new();
    let anna = h.player("anna", Tier::Permanent).await;
    let bart = h.player("bart", Tier::Active).await;
    let game = h.game(7, true).await;

    let cancelled = h.opt_out(anna.id, game.id).await;
    assert!(cancelled.promotion.is_none(), "nobody is waiting yet");

    let outcome = h.opt_in(bart.id, game.id).await;

    assert_eq!(outcome.entry.as_ref().map(|e| e.status), Some(Awaiting));
    assert_eq!(outcome.status, Some(Confirmed));
    assert_eq!(outcome.promotion.map(|e| e.player), Some(bart.id));
}

#[tokio::test]
async fn confirmed_player_withdrawing_returns_to_reserved() {
    let h = BookingHarness::new();
    let anna = h.player("anna", Tier::Permanent).await;
    let bart = h.player("bart", Tier::Active).await;
    let game = h.game(7, true).await;
    h.opt_in(bart.id, game.id).await;
    h.opt_out(anna.id, game.id).await;

    let outcome = h.opt_out(bart.id, game.id).await;

    assert_eq!(outcome.status, Some(Reserved));
    assert_eq!(h.booked(game.id).await, 0);
}

#[tokio::test]
async fn awaiting_players_are_promoted_in_fifo_order() {
    let h = BookingHarness::new();
    let mut permanents = Vec::new();
    for name in ["p1", "p2", "p3"] {
        permanents.push(h.player(name, Tier::Permanent).await);
    }
    let mut actives = Vec::new();
    for name in ["a1", "a2", "a3"] {
        actives.push(h.player(name, Tier::Active).await);
    }
    let game = h.game(7, true).await;

    for player in &actives {
        h.opt_in(player.id, game.id).await;
    }
    assert_eq!(h.usernames_with(Awaiting, game.id).await, vec!["a1", "a2", "a3"]);

    let mut promoted = Vec::new();
    for player in &permanents {
        let outcome = h.opt_out(player.id, game.id).await;
        promoted.push(outcome.promotion.expect("one promotion per vacancy").player);
    }

    let expected: Vec<PlayerId> = actives.iter().map(|p| p.id).collect();
    assert_eq!(promoted, expected);
    assert_eq!(h.booked(game.id).await, 3);
}

#[tokio::test]
async fn sweep_promotes_at_most_one_player() {
    let h = BookingHarness::new();
    let players = [
        h.player("gone1", Tier::Active).await,
        h.player("gone2", Tier::Active).await,
        h.player("wait1", Tier::Active).await,
        h.player("wait2", Tier::Active).await,
        h.player("anna", Tier::Permanent).await,
    ];
    let game = h.game(7, false).await;
    let at = h.clock.time();
    h.store.force_entry(players[0].id, game.id, Cancelled, at);
    h.store.force_entry(players[1].id, game.id, Cancelled, at);
    h.store.force_entry(players[2].id, game.id, Awaiting, at);
    h.store.force_entry(players[3].id, game.id, Awaiting, at);
    h.store.force_entry(players[4].id, game.id, Planned, at);

    let outcome = h.opt_out(players[4].id, game.id).await;

    assert_eq!(outcome.promotion.map(|e| e.player), Some(players[2].id));
    assert_eq!(h.usernames_with(Awaiting, game.id).await, vec!["wait2"]);
    assert_eq!(h.usernames_with(Confirmed, game.id).await, vec!["wait1"]);
}

#[tokio::test]
async fn never_booked_player_action_is_a_no_op() {
    let h = BookingHarness::new();
    let game = h.game(7, true).await;
    let late = h.player("late", Tier::Permanent).await;

    let outcome = h.opt_in(late.id, game.id).await;

    assert!(!outcome.changed());
    assert_eq!(outcome.status, None);
    assert_eq!(h.store.entry_count(), 0);
}

#[tokio::test]
async fn resting_status_is_rejected_without_append() {
    let h = BookingHarness::new();
    let anna = h.player("anna", Tier::Active).await;
    let game = h.game(7, false).await;
    h.store.force_entry(anna.id, game.id, Resting, h.clock.time());

    let err = h
        .engine
        .apply_player_action(anna.id, game.id, true)
        .await
        .unwrap_err();

    assert!(matches!(err, BookingError::InvalidTransition(_)));
    assert_eq!(h.store.entry_count(), 1);
}

#[tokio::test]
async fn unknown_entities_are_rejected_before_append() {
    let h = BookingHarness::new();
    let anna = h.player("anna", Tier::Permanent).await;
    let game = h.game(7, true).await;
    let before = h.store.entry_count();

    let err = h
        .engine
        .apply_player_action(PlayerId::new(999), game.id, false)
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::UnknownPlayer(_)));

    let err = h
        .engine
        .apply_player_action(anna.id, GameId::new(999), false)
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::UnknownGame(_)));

    assert_eq!(h.store.entry_count(), before);
}

#[tokio::test]
async fn latest_entry_wins_even_with_identical_timestamps() {
    let h = BookingHarness::new();
    let anna = h.player("anna", Tier::Permanent).await;
    let game = h.game(7, true).await;

    h.opt_out(anna.id, game.id).await;
    h.opt_in(anna.id, game.id).await;
    h.opt_out(anna.id, game.id).await;

    let history = h.engine.player_history(anna.id, game.id).await.unwrap();
    assert!(history.iter().all(|e| e.created_at == h.clock.time()));
    assert_eq!(h.status(anna.id, game.id).await, Some(Cancelled));
}

#[tokio::test]
async fn players_by_status_supports_descending_order() {
    let h = BookingHarness::new();
    let a = h.player("a", Tier::Active).await;
    let b = h.player("b", Tier::Active).await;
    h.player("anna", Tier::Permanent).await;
    let game = h.game(7, true).await;
    h.opt_in(b.id, game.id).await;
    h.opt_in(a.id, game.id).await;

    let newest_first: Vec<_> = h
        .engine
        .list_players_by_status(&[Awaiting, Reserved], game.id, Order::Descending)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.username)
        .collect();
    assert_eq!(newest_first, vec!["a", "b"]);
}

#[tokio::test]
async fn failed_notifications_are_parked_and_sweep_still_runs() {
    let h = BookingHarness::new();
    let anna = h.player("anna", Tier::Permanent).await;
    let bart = h.player("bart", Tier::Active).await;
    let game = h.game(7, true).await;
    h.opt_in(bart.id, game.id).await;
    h.notifier.set_failing(Audience::Player, true);

    let outcome = h.opt_out(anna.id, game.id).await;

    assert_eq!(outcome.promotion.map(|e| e.player), Some(bart.id));
    assert_eq!(h.status(bart.id, game.id).await, Some(Confirmed));

    let parked = h.engine.dead_letters().snapshot();
    let parked: Vec<_> = parked
        .iter()
        .map(|letter| (letter.audience, letter.change.player.username.as_str(), letter.change.status))
        .collect();
    assert_eq!(
        parked,
        vec![
            (Audience::Player, "anna", Cancelled),
            (Audience::Player, "bart", Confirmed),
        ]
    );
    assert_eq!(h.notifier.delivered(Audience::Admins).len(), 3);
}
