//! Metric names and the optional Prometheus exporter.
//!
//! The engine records through the `metrics` facade. Without an installed
//! recorder every call is a no-op, so library users and tests pay nothing.
//!
//! # Example
//!
//! ```rust,no_run
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! futsal_booking_runtime::metrics::install_exporter("0.0.0.0:9090".parse()?)?;
//! // Metrics now served at http://localhost:9090/metrics
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use thiserror::Error;

/// Committed status changes, labelled by `cause` and `status`.
pub const BOOKING_TRANSITIONS: &str = "booking_transitions_total";
/// Player actions that left the status unchanged.
pub const BOOKING_NOOP_ACTIONS: &str = "booking_noop_actions_total";
/// Awaiting players confirmed by the sweep.
pub const BOOKING_PROMOTIONS: &str = "booking_promotions_total";
/// Optimistic-concurrency conflicts seen on append.
pub const BOOKING_CONFLICTS: &str = "booking_conflicts_total";
/// Ledger entries written by absence reconciliation.
pub const BOOKING_ABSENCE_ENTRIES: &str = "booking_absence_entries_total";
/// Notifications that failed, labelled by `audience`.
pub const NOTIFICATIONS_FAILED: &str = "notifications_failed_total";
/// Current size of the notification dead letter queue.
pub const NOTIFICATION_DEAD_LETTERS: &str = "notification_dead_letters";

/// Errors from metrics setup.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// The exporter could not be built or installed.
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Registers descriptions for every engine metric.
pub fn describe_metrics() {
    describe_counter!(BOOKING_TRANSITIONS, "Committed booking status changes");
    describe_counter!(
        BOOKING_NOOP_ACTIONS,
        "Player actions that did not change the booking status"
    );
    describe_counter!(BOOKING_PROMOTIONS, "Awaiting players confirmed by the sweep");
    describe_counter!(
        BOOKING_CONFLICTS,
        "Optimistic concurrency conflicts on ledger append"
    );
    describe_counter!(
        BOOKING_ABSENCE_ENTRIES,
        "Ledger entries written by absence reconciliation"
    );
    describe_counter!(NOTIFICATIONS_FAILED, "Notifications that could not be delivered");
    describe_gauge!(
        NOTIFICATION_DEAD_LETTERS,
        "Notifications waiting in the dead letter queue"
    );
}

/// Installs the Prometheus recorder with an HTTP listener on `addr`.
///
/// Must be called from within a Tokio runtime, once per process.
///
/// # Errors
///
/// Returns [`MetricsError::Install`] if the listener cannot be built or a
/// recorder is already installed.
pub fn install_exporter(addr: SocketAddr) -> Result<(), MetricsError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| MetricsError::Install(e.to_string()))?;

    describe_metrics();
    tracing::info!(%addr, "Metrics available at http://{addr}/metrics");
    Ok(())
}
