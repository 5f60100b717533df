//! Per-game serialization.
//!
//! Every read-decide-append step and every sweep on a game runs while holding
//! that game's lock. Different games never contend. Entries are dropped from
//! the map once nobody holds or waits for them.
//!
//! These locks only order work inside one process. Across processes the
//! ledger's game-head check on append does the same job.

use futsal_booking_core::GameId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub(crate) struct GameLocks {
    locks: Mutex<HashMap<GameId, Arc<AsyncMutex<()>>>>,
}

/// Exclusive access to one game; released on drop.
#[derive(Debug)]
pub(crate) struct GameGuard<'a> {
    guard: Option<OwnedMutexGuard<()>>,
    game: GameId,
    locks: &'a GameLocks,
}

impl GameLocks {
    /// Waits for exclusive access to `game`.
    pub(crate) async fn lock(&self, game: GameId) -> GameGuard<'_> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(game).or_default())
        };
        GameGuard {
            guard: Some(lock.lock_owned().await),
            game,
            locks: self,
        }
    }

    // Clones of an entry are only taken under the map lock, so a count of
    // one here means no holder and no waiter.
    fn release(&self, game: GameId) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks.get(&game).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(&game);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[cfg(test)]
    fn handles(&self, game: GameId) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&game)
            .map_or(0, Arc::strong_count)
    }
}

impl Drop for GameGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks.release(self.game);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_game_is_exclusive() {
        let locks = GameLocks::default();
        let guard = locks.lock(GameId::new(1)).await;

        let blocked = tokio::time::timeout(Duration::from_millis(20), locks.lock(GameId::new(1))).await;
        assert!(blocked.is_err());

        drop(guard);
        let reacquired = tokio::time::timeout(Duration::from_millis(20), locks.lock(GameId::new(1))).await;
        assert!(reacquired.is_ok());
    }

    #[tokio::test]
    async fn different_games_do_not_contend() {
        let locks = GameLocks::default();
        let _first = locks.lock(GameId::new(1)).await;
        let second = tokio::time::timeout(Duration::from_millis(20), locks.lock(GameId::new(2))).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn released_locks_are_pruned() {
        let locks = Arc::new(GameLocks::default());
        let first = locks.lock(GameId::new(1)).await;
        let _other = locks.lock(GameId::new(2)).await;

        let waiter = tokio::spawn({
            let locks = Arc::clone(&locks);
            async move {
                let _second = locks.lock(GameId::new(1)).await;
            }
        });
        // Let the waiter queue up behind `first`.
        while locks.handles(GameId::new(1)) < 3 {
            tokio::task::yield_now().await;
        }

        drop(first);
        assert_eq!(locks.len(), 2, "kept while someone waits");

        waiter.await.ok();
        assert_eq!(locks.len(), 1);
    }
}
