// src/template.rs

use crate::config::TemplateConfig;
use crate::core::{Alert, AlertStatus, LabelSet, NotifyContext};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Renders a batch of alerts into the structured data carried by a
/// notification.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, ctx: &NotifyContext, alerts: &[Alert]) -> TemplateData;
}

/// Structured template data describing one alert group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TemplateData {
    pub receiver: String,
    pub status: AlertStatus,
    pub alerts: Vec<AlertData>,
    pub group_labels: LabelSet,
    pub common_labels: LabelSet,
    pub common_annotations: LabelSet,
    #[serde(rename = "externalURL")]
    pub external_url: String,
}

/// Template view of a single alert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AlertData {
    pub status: AlertStatus,
    pub labels: LabelSet,
    pub annotations: LabelSet,
    pub starts_at: DateTime<Utc>,
    #[serde(with = "zero_time")]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(rename = "generatorURL")]
    pub generator_url: String,
    pub fingerprint: String,
}

impl AlertData {
    fn from_alert(alert: &Alert, now: DateTime<Utc>) -> Self {
        Self {
            status: alert.status_at(now),
            labels: alert.labels.clone(),
            annotations: alert.annotations.clone(),
            starts_at: alert.starts_at,
            ends_at: alert.ends_at,
            generator_url: alert.generator_url.clone().unwrap_or_default(),
            fingerprint: alert.fingerprint().to_string(),
        }
    }
}

/// The built-in renderer, producing Alertmanager-compatible template data.
#[derive(Debug, Clone, Default)]
pub struct DefaultTemplate {
    receiver: String,
    external_url: String,
}

impl DefaultTemplate {
    pub fn new(receiver: impl Into<String>, external_url: impl Into<String>) -> Self {
        Self {
            receiver: receiver.into(),
            external_url: external_url.into(),
        }
    }

    pub fn from_config(config: &TemplateConfig) -> Self {
        Self::new(config.receiver.clone(), config.external_url.clone())
    }
}

impl TemplateRenderer for DefaultTemplate {
    fn render(&self, ctx: &NotifyContext, alerts: &[Alert]) -> TemplateData {
        let now = Utc::now();
        let alerts: Vec<AlertData> = alerts
            .iter()
            .map(|alert| AlertData::from_alert(alert, now))
            .collect();

        let status = if alerts.iter().any(|a| a.status == AlertStatus::Firing) {
            AlertStatus::Firing
        } else {
            AlertStatus::Resolved
        };

        TemplateData {
            receiver: ctx.receiver().unwrap_or(&self.receiver).to_string(),
            status,
            common_labels: common_pairs(alerts.iter().map(|a| &a.labels)),
            common_annotations: common_pairs(alerts.iter().map(|a| &a.annotations)),
            group_labels: ctx.group_labels().clone(),
            external_url: self.external_url.clone(),
            alerts,
        }
    }
}

/// Returns the pairs present with an equal value in every set.
fn common_pairs<'a>(mut sets: impl Iterator<Item = &'a LabelSet>) -> LabelSet {
    let Some(first) = sets.next() else {
        return LabelSet::new();
    };
    let mut common = first.clone();
    for set in sets {
        common.retain(|name, value| set.get(name) == Some(value));
    }
    common
}

/// Serializes a missing time as the zero timestamp receivers expect.
mod zero_time {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    const ZERO: &str = "0001-01-01T00:00:00Z";
    const ZERO_UNIX_SECONDS: i64 = -62135596800;

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(time) => time.serialize(serializer),
            None => serializer.serialize_str(ZERO),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let time = DateTime::<Utc>::deserialize(deserializer)?;
        if time.timestamp() == ZERO_UNIX_SECONDS {
            Ok(None)
        } else {
            Ok(Some(time))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn create_test_alert(name: &str, instance: &str) -> Alert {
        Alert::default()
            .with_label("alertname", name)
            .with_label("instance", instance)
            .with_label("severity", "page")
            .with_annotation("runbook", "https://runbooks/disk")
    }

    #[test]
    fn test_render_collects_common_labels_and_annotations() {
        let template = DefaultTemplate::new("ops", "http://alertmanager:9093");
        let alerts = vec![
            create_test_alert("DiskFull", "db-1"),
            create_test_alert("DiskFull", "db-2"),
        ];

        let data = template.render(&NotifyContext::new(), &alerts);

        assert_eq!(data.receiver, "ops");
        assert_eq!(data.external_url, "http://alertmanager:9093");
        assert_eq!(data.alerts.len(), 2);
        assert_eq!(data.common_labels.len(), 2);
        assert_eq!(data.common_labels["alertname"], "DiskFull");
        assert_eq!(data.common_labels["severity"], "page");
        assert!(!data.common_labels.contains_key("instance"));
        assert_eq!(data.common_annotations["runbook"], "https://runbooks/disk");
    }

    #[test]
    fn test_group_status_is_firing_if_any_alert_fires() {
        let template = DefaultTemplate::default();
        let past = Utc::now() - Duration::minutes(1);
        let resolved = create_test_alert("DiskFull", "db-1").with_end(past);
        let firing = create_test_alert("DiskFull", "db-2");

        let data = template.render(&NotifyContext::new(), &[resolved.clone(), firing]);
        assert_eq!(data.status, AlertStatus::Firing);

        let data = template.render(&NotifyContext::new(), &[resolved]);
        assert_eq!(data.status, AlertStatus::Resolved);
        assert_eq!(data.alerts[0].status, AlertStatus::Resolved);
    }

    #[test]
    fn test_context_overrides_receiver_and_sets_group_labels() {
        let template = DefaultTemplate::new("default", "");
        let mut group_labels = LabelSet::new();
        group_labels.insert("alertname".to_string(), "DiskFull".to_string());
        let ctx = NotifyContext::new()
            .with_receiver("team-db")
            .with_group_labels(group_labels.clone());

        let data = template.render(&ctx, &[create_test_alert("DiskFull", "db-1")]);

        assert_eq!(data.receiver, "team-db");
        assert_eq!(data.group_labels, group_labels);
    }

    #[test]
    fn test_empty_alert_list_renders_empty_data() {
        let data = DefaultTemplate::default().render(&NotifyContext::new(), &[]);
        assert!(data.alerts.is_empty());
        assert!(data.common_labels.is_empty());
        assert_eq!(data.status, AlertStatus::Resolved);
    }

    #[test]
    fn test_alert_data_serializes_zero_end_time_and_fingerprint() {
        let alert = create_test_alert("DiskFull", "db-1");
        let data = DefaultTemplate::default().render(&NotifyContext::new(), &[alert.clone()]);
        let json = serde_json::to_value(&data).unwrap();

        let rendered = &json["alerts"][0];
        assert_eq!(rendered["endsAt"], "0001-01-01T00:00:00Z");
        assert_eq!(rendered["generatorURL"], "");
        assert_eq!(rendered["fingerprint"], alert.fingerprint().to_string());
        assert_eq!(rendered["status"], "firing");
        assert!(json.get("externalURL").is_some());
        assert!(json.get("commonLabels").is_some());

        let back: TemplateData = serde_json::from_value(json).unwrap();
        assert_eq!(back.alerts[0].ends_at, None);
    }
}
