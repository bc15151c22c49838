//! # Internal Metrics Module
//!
//! Metric handles for the notification path. The library only records;
//! installing a recorder (Prometheus exporter, logging recorder, ...) is up to
//! the embedding application. Without one, every call is a no-op.

use metrics::{Counter, Histogram, Unit};

pub const NOTIFICATIONS_TOTAL: &str = "alertevent_notifications_total";
pub const ALERTS_TRUNCATED_TOTAL: &str = "alertevent_alerts_truncated_total";
pub const NOTIFICATION_DURATION_SECONDS: &str = "alertevent_notification_duration_seconds";

/// Outcome labels of `alertevent_notifications_total`.
pub const OUTCOMES: [&str; 6] = [
    "delivered",
    "retryable",
    "permanent",
    "undelivered",
    "cancelled",
    "invalid",
];

/// Cloneable handles to the notifier's metrics.
///
/// Handles are registered with the recorder active when `new` is called.
#[derive(Clone)]
pub struct Metrics {
    notifications_total: Vec<(&'static str, Counter)>,
    pub alerts_truncated_total: Counter,
    pub notification_duration_seconds: Histogram,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

impl Metrics {
    /// Creates a new `Metrics` instance and registers descriptions for all
    /// supported metrics with the global recorder.
    pub fn new() -> Self {
        metrics::describe_counter!(
            NOTIFICATIONS_TOTAL,
            Unit::Count,
            "Total number of notifications attempted, labeled by outcome."
        );
        metrics::describe_counter!(
            ALERTS_TRUNCATED_TOTAL,
            Unit::Count,
            "Total number of alerts dropped to respect the per-notification maximum."
        );
        metrics::describe_histogram!(
            NOTIFICATION_DURATION_SECONDS,
            Unit::Seconds,
            "The time taken to build, send and classify one notification."
        );

        Self {
            notifications_total: OUTCOMES
                .iter()
                .map(|outcome| {
                    (
                        *outcome,
                        metrics::counter!(NOTIFICATIONS_TOTAL, "outcome" => *outcome),
                    )
                })
                .collect(),
            alerts_truncated_total: metrics::counter!(ALERTS_TRUNCATED_TOTAL),
            notification_duration_seconds: metrics::histogram!(NOTIFICATION_DURATION_SECONDS),
        }
    }

    /// Increments the notification counter for `outcome`.
    pub fn increment_notifications(&self, outcome: &str) {
        if let Some((_, counter)) = self.notifications_total.iter().find(|(o, _)| *o == outcome) {
            counter.increment(1);
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
