//! Core domain types and service traits for alertevent
//!
//! This module defines the alert record handed to notifiers, the per-call
//! notification context, and the `Notifier` contract every delivery channel
//! implements.

use crate::notification::{Delivery, NotifyError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tokio::sync::watch;

/// A sorted set of label (or annotation) name/value pairs.
pub type LabelSet = BTreeMap<String, String>;

const FNV_OFFSET_64: u64 = 14695981039346656037;
const FNV_PRIME_64: u64 = 1099511628211;
const LABEL_SEPARATOR: u8 = 0xff;

/// A single firing or resolved alert, as handed over by the routing pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Identifying labels of the alert
    #[serde(default)]
    pub labels: LabelSet,
    /// Free-form annotations (summary, description, runbook, ...)
    #[serde(default)]
    pub annotations: LabelSet,
    /// When the alert started firing
    #[serde(default)]
    pub starts_at: DateTime<Utc>,
    /// When the alert resolved, if it has
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
    /// Link back to the entity that generated the alert
    #[serde(
        rename = "generatorURL",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub generator_url: Option<String>,
}

impl Alert {
    /// Creates a firing alert with the given labels, starting now.
    pub fn new(labels: LabelSet) -> Self {
        Self {
            labels,
            starts_at: Utc::now(),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(name.into(), value.into());
        self
    }

    pub fn with_annotation(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(name.into(), value.into());
        self
    }

    /// Marks the alert as ending at `ends_at`.
    pub fn with_end(mut self, ends_at: DateTime<Utc>) -> Self {
        self.ends_at = Some(ends_at);
        self
    }

    /// Returns the alert status as of `now`.
    ///
    /// An alert is resolved once its end time is set and not in the future.
    pub fn status_at(&self, now: DateTime<Utc>) -> AlertStatus {
        match self.ends_at {
            Some(ends_at) if ends_at <= now => AlertStatus::Resolved,
            _ => AlertStatus::Firing,
        }
    }

    pub fn status(&self) -> AlertStatus {
        self.status_at(Utc::now())
    }

    /// Computes the label-set fingerprint (64-bit FNV-1a over the sorted
    /// labels), compatible with Prometheus fingerprints.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut sum = FNV_OFFSET_64;
        let mut add = |bytes: &[u8]| {
            for b in bytes {
                sum ^= u64::from(*b);
                sum = sum.wrapping_mul(FNV_PRIME_64);
            }
        };
        // BTreeMap iterates in name order.
        for (name, value) in &self.labels {
            add(name.as_bytes());
            add(&[LABEL_SEPARATOR]);
            add(value.as_bytes());
            add(&[LABEL_SEPARATOR]);
        }
        Fingerprint(sum)
    }
}

/// A 64-bit label-set fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(pub u64);

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Whether an alert (or a group of alerts) is firing or resolved.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    #[default]
    Firing,
    Resolved,
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertStatus::Firing => write!(f, "firing"),
            AlertStatus::Resolved => write!(f, "resolved"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("group key missing")]
    MissingGroupKey,
}

/// Per-call context for a notification.
///
/// Carries what the routing pipeline knows about the alert group being
/// notified, plus an optional cancellation signal owned by the caller.
#[derive(Debug, Clone, Default)]
pub struct NotifyContext {
    group_key: Option<String>,
    receiver: Option<String>,
    group_labels: LabelSet,
    cancel: Option<watch::Receiver<()>>,
}

impl NotifyContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group_key(mut self, group_key: impl Into<String>) -> Self {
        self.group_key = Some(group_key.into());
        self
    }

    pub fn with_receiver(mut self, receiver: impl Into<String>) -> Self {
        self.receiver = Some(receiver.into());
        self
    }

    pub fn with_group_labels(mut self, group_labels: LabelSet) -> Self {
        self.group_labels = group_labels;
        self
    }

    /// Attaches the caller's cancellation signal. Sending on the paired
    /// `watch::Sender` cancels the call.
    pub fn with_cancellation(mut self, cancel: watch::Receiver<()>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Extracts the group key of the alert group being notified.
    pub fn group_key(&self) -> Result<&str, ContextError> {
        self.group_key
            .as_deref()
            .ok_or(ContextError::MissingGroupKey)
    }

    pub fn receiver(&self) -> Option<&str> {
        self.receiver.as_deref()
    }

    pub fn group_labels(&self) -> &LabelSet {
        &self.group_labels
    }

    /// Resolves once the caller signals cancellation.
    ///
    /// Never resolves when no signal is attached, or when the sender is
    /// dropped without ever signalling.
    pub async fn cancelled(&self) {
        if let Some(rx) = &self.cancel {
            let mut rx = rx.clone();
            if rx.changed().await.is_ok() {
                return;
            }
        }
        std::future::pending::<()>().await
    }
}

// =============================================================================
// Service Traits
// =============================================================================

/// Delivers a batch of alerts to one notification channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short name of the channel type (e.g. "event").
    fn name(&self) -> &str;

    /// Sends one notification for `alerts`.
    ///
    /// # Returns
    /// * `Ok(Delivery)` when the receiver accepted the notification
    /// * `Err(NotifyError)` otherwise; `NotifyError::is_retryable` tells the
    ///   caller whether a later attempt may succeed
    async fn notify(&self, ctx: &NotifyContext, alerts: &[Alert])
        -> Result<Delivery, NotifyError>;
}
