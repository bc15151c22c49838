//! Delivery of alert notifications as events over HTTP.
//!
//! A notification travels through a fixed pipeline: the alert batch is
//! truncated, rendered into a wire message, wrapped in an event envelope,
//! dispatched to the target endpoint, and the response status is classified
//! into delivered, retryable or permanent.
pub mod dispatch;
pub mod envelope;
pub mod event;
pub mod message;
pub mod retrier;
#[cfg(feature = "test-utils")]
pub mod test_utils;
pub mod truncate;

use thiserror::Error;

pub use dispatch::{CancellationPolicy, Dispatcher};
pub use envelope::{EncodedEvent, EnvelopeBinding, EnvelopeBuilder, EventEnvelope};
pub use event::EventNotifier;
pub use message::WireMessage;
pub use retrier::{Outcome, Retrier};
pub use truncate::truncate_alerts;

/// What a successful notification reports back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// HTTP status code returned by the receiver
    pub status: u16,
    /// Id of the event envelope that was delivered
    pub event_id: String,
    /// Number of alerts dropped to respect the configured maximum
    pub truncated_alerts: u64,
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("invalid notifier configuration: {0}")]
    Config(String),

    #[error("failed to build event envelope: {0}")]
    Envelope(String),

    #[error("event was not delivered to {target}")]
    Undelivered {
        target: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected status code {status}{}", detail_suffix(.detail))]
    Retryable { status: u16, detail: String },

    #[error("unexpected status code {status}{}", detail_suffix(.detail))]
    Permanent { status: u16, detail: String },

    #[error("notification cancelled by caller before delivery completed")]
    Cancelled,
}

fn detail_suffix(detail: &str) -> String {
    if detail.is_empty() {
        String::new()
    } else {
        format!(": {}", detail)
    }
}

impl NotifyError {
    /// Whether a later attempt of the same notification may succeed.
    ///
    /// Server errors and requests that never reached the receiver are
    /// retryable; configuration problems and rejected requests are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            NotifyError::Retryable { .. } | NotifyError::Undelivered { .. }
        )
    }

    /// The HTTP status code behind the error, if the receiver answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            NotifyError::Retryable { status, .. } | NotifyError::Permanent { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Label used for the outcome metric.
    pub fn outcome_label(&self) -> &'static str {
        match self {
            NotifyError::Config(_) | NotifyError::Envelope(_) => "invalid",
            NotifyError::Undelivered { .. } => "undelivered",
            NotifyError::Retryable { .. } => "retryable",
            NotifyError::Permanent { .. } => "permanent",
            NotifyError::Cancelled => "cancelled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_errors_include_detail() {
        let err = NotifyError::Retryable {
            status: 503,
            detail: "http://receiver:8080/events".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "unexpected status code 503: http://receiver:8080/events"
        );
        assert!(err.is_retryable());
        assert_eq!(err.status(), Some(503));

        let err = NotifyError::Permanent {
            status: 404,
            detail: String::new(),
        };
        assert_eq!(err.to_string(), "unexpected status code 404");
        assert!(!err.is_retryable());
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_local_errors_are_not_retryable() {
        assert!(!NotifyError::Config("bad url".into()).is_retryable());
        assert!(!NotifyError::Envelope("empty source".into()).is_retryable());
        assert!(!NotifyError::Cancelled.is_retryable());
        assert_eq!(NotifyError::Cancelled.status(), None);
        assert_eq!(NotifyError::Cancelled.outcome_label(), "cancelled");
    }
}
