//! Notifier that writes status changes to the log.
//!
//! The CLI has no mail transport; every notification becomes a structured
//! `tracing` event under the `futsal::notify` target.

use futsal_booking_core::{BoxFuture, DisplayNameMode, NotificationError, Notifier, StatusChange};
use std::future::ready;

/// Human-readable summary of a change.
#[must_use]
pub fn describe(change: &StatusChange, mode: DisplayNameMode) -> String {
    let previous = change.previous.map_or("none", |status| status.as_str());
    format!(
        "{}: {} -> {} for {} ({})",
        change.player.display_name(mode),
        previous,
        change.status,
        change.game,
        change.cause.as_str(),
    )
}

/// Logs every notification instead of delivering it.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier {
    admin_emails: Vec<String>,
    display_name_mode: DisplayNameMode,
}

impl LogNotifier {
    /// A notifier addressing `admin_emails`.
    #[must_use]
    pub const fn new(admin_emails: Vec<String>, display_name_mode: DisplayNameMode) -> Self {
        Self {
            admin_emails,
            display_name_mode,
        }
    }

    fn player_message(&self, change: &StatusChange) -> Result<(), NotificationError> {
        let email = change.player.email.trim();
        if email.is_empty() {
            return Err(NotificationError::new(
                change.player.username.clone(),
                "player has no e-mail address",
            ));
        }
        tracing::info!(
            target: "futsal::notify",
            to = email,
            "{}",
            describe(change, self.display_name_mode)
        );
        Ok(())
    }

    fn admin_message(&self, change: &StatusChange) {
        if self.admin_emails.is_empty() {
            tracing::debug!(target: "futsal::notify", "No admin observers configured");
            return;
        }
        let text = describe(change, self.display_name_mode);
        for admin in &self.admin_emails {
            tracing::info!(target: "futsal::notify", to = %admin, "{text}");
        }
    }
}

impl Notifier for LogNotifier {
    fn notify_player(&self, change: &StatusChange) -> BoxFuture<'_, Result<(), NotificationError>> {
        Box::pin(ready(self.player_message(change)))
    }

    fn notify_admins(&self, change: &StatusChange) -> BoxFuture<'_, Result<(), NotificationError>> {
        self.admin_message(change);
        Box::pin(ready(Ok(())))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use futsal_booking_core::{
        BookingStatus, ChangeCause, Game, GameId, GameStatus, Player, PlayerId, Tier,
    };

    fn change(email: &str) -> StatusChange {
        StatusChange {
            player: Player {
                id: PlayerId::new(1),
                username: "bolek".into(),
                first_name: "Bolek".into(),
                last_name: "Nowak".into(),
                email: email.into(),
                mobile_number: "600700800".into(),
                tier: Tier::Active,
            },
            game: Game {
                id: GameId::new(3),
                date: NaiveDate::from_ymd_opt(2025, 3, 7).unwrap(),
                status: GameStatus::Planned,
                description: String::new(),
            },
            previous: Some(BookingStatus::Awaiting),
            status: BookingStatus::Confirmed,
            cause: ChangeCause::Promotion,
        }
    }

    #[test]
    fn description_names_both_statuses() {
        let text = describe(&change("b@example.com"), DisplayNameMode::FullName);
        assert!(text.starts_with("Bolek Nowak: awaiting -> confirmed for 2025-03-07"));
        assert!(text.ends_with("(promotion)"));
    }

    #[tokio::test]
    async fn players_without_email_cannot_be_notified() {
        let notifier = LogNotifier::new(vec!["admin@example.com".into()], DisplayNameMode::Username);

        assert!(notifier.notify_player(&change("b@example.com")).await.is_ok());
        let err = notifier.notify_player(&change("  ")).await.unwrap_err();
        assert_eq!(err.recipient, "bolek");
        assert!(notifier.notify_admins(&change("")).await.is_ok());
    }
}
