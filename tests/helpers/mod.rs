#![allow(dead_code)] // Not every test binary uses every helper

pub mod mock_endpoint;
pub mod test_metrics;

use alertevent::config::EventConfig;
use alertevent::notification::test_utils::{event_config, event_notifier};
use alertevent::EventNotifier;
use wiremock::MockServer;

/// An `EventNotifier` sending to `server`, with `configure` applied to the
/// default configuration first.
pub fn notifier_for<F>(server: &MockServer, configure: F) -> EventNotifier
where
    F: FnOnce(&mut EventConfig),
{
    let mut config = event_config(mock_endpoint::events_url(server));
    configure(&mut config);
    event_notifier(config).expect("notifier should build")
}
