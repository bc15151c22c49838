//! Fixtures shared by integration tests.

use super::{EventNotifier, NotifyError};
use crate::config::EventConfig;
use crate::core::Alert;
use crate::template::DefaultTemplate;
use std::sync::Arc;

/// A firing alert with `alertname` and `instance` labels.
pub fn firing_alert(name: &str, instance: &str) -> Alert {
    Alert::new(Default::default())
        .with_label("alertname", name)
        .with_label("instance", instance)
        .with_annotation("summary", format!("{} on {}", name, instance))
}

/// `count` alerts, numbered in order through their `instance` label.
pub fn numbered_alerts(count: usize) -> Vec<Alert> {
    (0..count)
        .map(|i| firing_alert("TestAlert", &format!("host-{}", i)))
        .collect()
}

/// An `EventConfig` targeting `url`, all other settings default.
pub fn event_config(url: impl Into<String>) -> EventConfig {
    EventConfig {
        url: url.into(),
        ..Default::default()
    }
}

/// An `EventNotifier` for `config` using the default template.
pub fn event_notifier(config: EventConfig) -> Result<EventNotifier, NotifyError> {
    EventNotifier::new(
        config,
        Arc::new(DefaultTemplate::new("test-receiver", "http://alertmanager.test")),
    )
}
