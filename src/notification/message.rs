//! The JSON message sent to event endpoints.

use crate::template::TemplateData;
use serde::{Deserialize, Serialize};

/// Version of the message layout understood by receivers.
pub const PROTOCOL_VERSION: &str = "4";

/// The wire message: template data with the notification metadata inlined.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WireMessage {
    #[serde(flatten)]
    data: TemplateData,
    version: String,
    group_key: String,
    truncated_alerts: u64,
}

impl WireMessage {
    /// Builds the message for one notification.
    ///
    /// `group_key` is empty when the key could not be determined.
    pub fn new(data: TemplateData, group_key: impl Into<String>, truncated_alerts: u64) -> Self {
        Self {
            data,
            version: PROTOCOL_VERSION.to_string(),
            group_key: group_key.into(),
            truncated_alerts,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn group_key(&self) -> &str {
        &self.group_key
    }

    pub fn truncated_alerts(&self) -> u64 {
        self.truncated_alerts
    }
}
