//! Bounded queue of notifications that could not be delivered.
//!
//! A failed notification never rolls back the ledger append that caused it.
//! The change is parked here instead, so an operator can inspect it and
//! resend by other means.

use chrono::{DateTime, Utc};
use futsal_booking_core::StatusChange;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Recipient group of a notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Audience {
    /// The affected player
    Player,
    /// The admin observers
    Admins,
}

impl Audience {
    /// Metric label value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Admins => "admins",
        }
    }
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A notification that failed.
#[derive(Debug, Clone)]
pub struct DeadLetter {
    /// The change that was being announced
    pub change: StatusChange,
    /// Who should have been told
    pub audience: Audience,
    /// Error reported by the notifier
    pub error: String,
    /// When the failure happened
    pub failed_at: DateTime<Utc>,
}

/// Thread-safe bounded FIFO of [`DeadLetter`]s.
///
/// When full, the oldest entry is dropped. Clones share the same queue.
#[derive(Debug, Clone)]
pub struct DeadLetterQueue {
    queue: Arc<Mutex<VecDeque<DeadLetter>>>,
    max_size: usize,
}

impl DeadLetterQueue {
    /// Create a queue holding at most `max_size` entries.
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self {
            queue: Arc::new(Mutex::new(VecDeque::new())),
            max_size,
        }
    }

    /// Parks a failed notification.
    pub fn push(&self, letter: DeadLetter) {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);

        if self.max_size == 0 {
            tracing::warn!("Dead letter queue disabled, dropping failed notification");
            return;
        }

        if queue.len() >= self.max_size {
            queue.pop_front();
            tracing::warn!(
                max_size = self.max_size,
                "Dead letter queue full, dropping oldest notification"
            );
        }

        tracing::warn!(
            player = %letter.change.player.id,
            game = %letter.change.game.id,
            audience = %letter.audience,
            error = %letter.error,
            "Notification parked in dead letter queue"
        );
        queue.push_back(letter);

        #[allow(clippy::cast_precision_loss)]
        metrics::gauge!(crate::metrics::NOTIFICATION_DEAD_LETTERS).set(queue.len() as f64);
    }

    /// Number of parked notifications.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing is parked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes and returns every parked notification, oldest first.
    pub fn drain(&self) -> Vec<DeadLetter> {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        let letters: Vec<_> = queue.drain(..).collect();
        metrics::gauge!(crate::metrics::NOTIFICATION_DEAD_LETTERS).set(0.0);
        letters
    }

    /// Copies of the parked notifications, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<DeadLetter> {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Maximum number of entries kept.
    #[must_use]
    pub const fn max_size(&self) -> usize {
        self.max_size
    }
}

impl Default for DeadLetterQueue {
    fn default() -> Self {
        Self::new(1000)
    }
}
