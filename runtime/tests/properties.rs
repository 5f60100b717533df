//! Property tests for engine-level guarantees.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use futsal_booking_core::{BookingEntry, GameId, PlayerId, Tier};
use futsal_booking_testing::BookingHarness;
use proptest::prelude::*;
use tokio::runtime::Runtime;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("test runtime")
}

/// Registers `permanent` permanents and `active` actives, then creates a
/// seeded game.
async fn roster(
    h: &BookingHarness,
    permanent: usize,
    active: usize,
) -> (Vec<PlayerId>, Vec<PlayerId>, GameId) {
    let mut permanents = Vec::new();
    for i in 0..permanent {
        permanents.push(h.player(&format!("p{i}"), Tier::Permanent).await.id);
    }
    let mut actives = Vec::new();
    for i in 0..active {
        actives.push(h.player(&format!("a{i}"), Tier::Active).await.id);
    }
    let game = h.game(7, true).await.id;
    (permanents, actives, game)
}

fn action_strategy(players: usize) -> impl Strategy<Value = Vec<(usize, bool)>> {
    prop::collection::vec((0..players, any::<bool>()), 0..40)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn promotions_follow_opt_in_order(order in Just((0..5_usize).collect::<Vec<_>>()).prop_shuffle()) {
        let (promoted, expected) = runtime().block_on(async {
            let h = BookingHarness::new();
            let (permanents, actives, game) = roster(&h, 5, 5).await;

            for &i in &order {
                h.opt_in(actives[i], game).await;
            }
            let mut promoted = Vec::new();
            for &player in &permanents {
                let outcome = h.opt_out(player, game).await;
                promoted.extend(outcome.promotion.map(|entry| entry.player));
            }
            (promoted, order.iter().map(|&i| actives[i]).collect::<Vec<_>>())
        });

        prop_assert_eq!(promoted, expected);
    }

    #[test]
    fn ledger_only_ever_grows(actions in action_strategy(6)) {
        runtime().block_on(async {
            let h = BookingHarness::new();
            let (permanents, actives, game) = roster(&h, 3, 3).await;
            let players: Vec<PlayerId> = permanents.into_iter().chain(actives).collect();

            let mut before: Vec<BookingEntry> = h.engine.ledger_history().await.unwrap();
            for (index, opt_in) in actions {
                h.engine
                    .apply_player_action(players[index], game, opt_in)
                    .await
                    .unwrap();
                let after = h.engine.ledger_history().await.unwrap();
                assert!(after.len() >= before.len());
                assert_eq!(&after[..before.len()], &before[..]);
                before = after;
            }
        });
    }

    #[test]
    fn absences_never_raise_the_booked_count(
        actions in action_strategy(6),
        resting in 0..6_usize,
    ) {
        let (before, after) = runtime().block_on(async {
            let h = BookingHarness::new();
            let (permanents, actives, game) = roster(&h, 3, 3).await;
            let players: Vec<PlayerId> = permanents.into_iter().chain(actives).collect();

            for (index, opt_in) in actions {
                h.engine
                    .apply_player_action(players[index], game, opt_in)
                    .await
                    .unwrap();
            }
            let before = h.booked(game).await;
            h.rest(players[resting], 0, 30).await;
            (before, h.booked(game).await)
        });

        prop_assert!(after <= before, "booked went from {} to {}", before, after);
    }

    #[test]
    fn awaiting_players_never_coexist_with_an_open_slot(actions in action_strategy(6)) {
        let stranded = runtime().block_on(async {
            let h = BookingHarness::new();
            let (permanents, actives, game) = roster(&h, 3, 3).await;
            let players: Vec<PlayerId> = permanents.into_iter().chain(actives).collect();

            let mut stranded = false;
            for (index, opt_in) in actions {
                h.engine
                    .apply_player_action(players[index], game, opt_in)
                    .await
                    .unwrap();
                let summary = h.engine.game_summary(game).await.unwrap();
                stranded |= summary.cancelled.len() > summary.confirmed.len()
                    && !summary.awaiting.is_empty();
            }
            stranded
        });

        prop_assert!(!stranded);
    }
}
