//! # Futsal Booking Testing
//!
//! Testing utilities for the futsal booking engine.
//!
//! This crate provides:
//! - [`InMemoryBookingStore`]: ledger and directory without a database
//! - Mock capabilities: [`FixedClock`], [`SteppingClock`], [`RecordingNotifier`]
//! - [`TransitionTest`]: Given-When-Then checks of the transition table
//! - [`BookingHarness`]: an engine wired to all of the above
//!
//! ## Example
//!
//! ```ignore
//! use futsal_booking_testing::BookingHarness;
//!
//! #[tokio::test]
//! async fn cancelling_frees_a_slot() {
//!     let h = BookingHarness::new();
//!     let anna = h.player("anna", Tier::Permanent).await;
//!     let game = h.game(7, true).await;
//!
//!     h.opt_out(anna.id, game.id).await;
//!     assert_eq!(h.status(anna.id, game.id).await, Some(BookingStatus::Cancelled));
//! }
//! ```

use chrono::{DateTime, Utc};
use futsal_booking_core::environment::Clock;

mod harness;
mod memory;

/// Mock implementations of environment capabilities.
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use futsal_booking_core::{BoxFuture, NotificationError, Notifier, StatusChange};
    use futsal_booking_runtime::Audience;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex, PoisonError};

    /// Fixed clock for deterministic tests.
    ///
    /// # Example
    ///
    /// ```
    /// use futsal_booking_testing::mocks::FixedClock;
    /// use futsal_booking_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }

        /// The time this clock reports.
        #[must_use]
        pub const fn time(&self) -> DateTime<Utc> {
            self.time
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// Never in practice; the timestamp is hardcoded.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Clock that moves forward by a fixed step every time it is read.
    ///
    /// Clones share the same position, so an engine and a test can observe
    /// the same timeline.
    #[derive(Debug, Clone)]
    pub struct SteppingClock {
        next: Arc<Mutex<DateTime<Utc>>>,
        step: chrono::Duration,
    }

    impl SteppingClock {
        /// A clock whose first reading is `start`.
        #[must_use]
        pub fn new(start: DateTime<Utc>, step: chrono::Duration) -> Self {
            Self {
                next: Arc::new(Mutex::new(start)),
                step,
            }
        }

        /// The time the next reading will return.
        #[must_use]
        pub fn peek(&self) -> DateTime<Utc> {
            *self.next.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    impl Clock for SteppingClock {
        fn now(&self) -> DateTime<Utc> {
            let mut next = self.next.lock().unwrap_or_else(PoisonError::into_inner);
            let now = *next;
            *next = now + self.step;
            now
        }
    }

    /// One notification attempt.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Sent {
        /// Who was addressed
        pub audience: Audience,
        /// What was announced
        pub change: StatusChange,
        /// Whether the attempt succeeded
        pub delivered: bool,
    }

    /// Notifier that records every attempt and can be told to fail.
    ///
    /// Clones share the same log.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingNotifier {
        sent: Arc<Mutex<Vec<Sent>>>,
        fail_player: Arc<AtomicBool>,
        fail_admins: Arc<AtomicBool>,
    }

    impl RecordingNotifier {
        /// A notifier that delivers everything.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes deliveries to `audience` fail (or succeed again).
        pub fn set_failing(&self, audience: Audience, failing: bool) {
            match audience {
                Audience::Player => self.fail_player.store(failing, Ordering::SeqCst),
                Audience::Admins => self.fail_admins.store(failing, Ordering::SeqCst),
            }
        }

        /// Every attempt, in order.
        #[must_use]
        pub fn attempts(&self) -> Vec<Sent> {
            self.sent
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }

        /// Changes successfully delivered to `audience`, in order.
        #[must_use]
        pub fn delivered(&self, audience: Audience) -> Vec<StatusChange> {
            self.attempts()
                .into_iter()
                .filter(|sent| sent.audience == audience && sent.delivered)
                .map(|sent| sent.change)
                .collect()
        }

        /// Forgets every recorded attempt.
        pub fn clear(&self) {
            self.sent
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clear();
        }

        fn record(
            &self,
            audience: Audience,
            change: &StatusChange,
        ) -> BoxFuture<'_, Result<(), NotificationError>> {
            let failing = match audience {
                Audience::Player => self.fail_player.load(Ordering::SeqCst),
                Audience::Admins => self.fail_admins.load(Ordering::SeqCst),
            };
            self.sent
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(Sent {
                    audience,
                    change: change.clone(),
                    delivered: !failing,
                });

            let result = if failing {
                Err(NotificationError::new(audience.as_str(), "mailbox unavailable"))
            } else {
                Ok(())
            };
            Box::pin(std::future::ready(result))
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify_player(
            &self,
            change: &StatusChange,
        ) -> BoxFuture<'_, Result<(), NotificationError>> {
            self.record(Audience::Player, change)
        }

        fn notify_admins(
            &self,
            change: &StatusChange,
        ) -> BoxFuture<'_, Result<(), NotificationError>> {
            self.record(Audience::Admins, change)
        }
    }
}

// Re-export commonly used items
pub use harness::BookingHarness;
pub use memory::InMemoryBookingStore;
pub use mocks::{FixedClock, RecordingNotifier, Sent, SteppingClock, test_clock};
pub use transition_test::{TransitionTest, assertions};
