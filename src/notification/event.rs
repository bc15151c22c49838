//! The event notifier: delivers alert batches as CloudEvents over HTTP.

use super::dispatch::Dispatcher;
use super::envelope::EnvelopeBuilder;
use super::message::WireMessage;
use super::retrier::Retrier;
use super::truncate::truncate_alerts;
use super::{Delivery, NotifyError};
use crate::config::EventConfig;
use crate::core::{Alert, Notifier, NotifyContext};
use crate::internal_metrics::Metrics;
use crate::template::TemplateRenderer;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// Sends alert notifications to one configured event endpoint.
///
/// The notifier is immutable once built and can be shared across tasks
/// behind an `Arc`; every `notify` call is an independent attempt.
pub struct EventNotifier {
    config: EventConfig,
    template: Arc<dyn TemplateRenderer>,
    envelopes: EnvelopeBuilder,
    dispatcher: Dispatcher,
    retrier: Retrier,
    metrics: Metrics,
}

impl EventNotifier {
    /// Creates a new `EventNotifier`.
    ///
    /// Fails with `NotifyError::Config` when the target URL, source or HTTP
    /// settings are invalid.
    pub fn new(
        config: EventConfig,
        template: Arc<dyn TemplateRenderer>,
    ) -> Result<Self, NotifyError> {
        let dispatcher = Dispatcher::from_config(&config)?;
        let envelopes = EnvelopeBuilder::new(config.source.clone())?;

        // Receivers are expected to answer 2xx on success; 5xx is treated as
        // recoverable. Failures carry the target address as detail.
        let target = dispatcher.target().to_string();
        let retrier = Retrier::new()
            .with_retry_codes(config.retry_codes.clone())
            .with_details(move |_| target.clone());

        Ok(Self {
            config,
            template,
            envelopes,
            dispatcher,
            retrier,
            metrics: Metrics::new(),
        })
    }

    async fn deliver(
        &self,
        ctx: &NotifyContext,
        alerts: &[Alert],
    ) -> Result<Delivery, NotifyError> {
        let (alerts, truncated) = truncate_alerts(self.config.max_alerts, alerts);
        if truncated > 0 {
            warn!(
                truncated,
                max_alerts = self.config.max_alerts,
                "Truncated alert batch"
            );
            self.metrics.alerts_truncated_total.increment(truncated);
        }

        let data = self.template.render(ctx, alerts);

        let group_key = match ctx.group_key() {
            Ok(key) => key.to_string(),
            Err(e) => {
                error!(error = %e, "Failed to extract group key, sending with an empty key");
                String::new()
            }
        };

        let message = WireMessage::new(data, group_key, truncated);
        let envelope = self.envelopes.build(&message)?;
        let event_id = envelope.id().to_string();
        let encoded = envelope.encode(self.config.binding)?;
        debug!(event_id = %event_id, body_len = encoded.body.len(), "Event envelope built");

        let status = self.dispatcher.send(encoded, ctx).await?;
        let status = self.retrier.check(status).into_result()?;

        Ok(Delivery {
            status,
            event_id,
            truncated_alerts: truncated,
        })
    }
}

#[async_trait]
impl Notifier for EventNotifier {
    fn name(&self) -> &str {
        "event"
    }

    /// Truncates, renders, wraps and sends `alerts`, then classifies the
    /// receiver's answer.
    #[instrument(skip_all, fields(alerts = alerts.len(), target = %self.dispatcher.target()))]
    async fn notify(
        &self,
        ctx: &NotifyContext,
        alerts: &[Alert],
    ) -> Result<Delivery, NotifyError> {
        let start = Instant::now();
        let result = self.deliver(ctx, alerts).await;
        self.metrics
            .notification_duration_seconds
            .record(start.elapsed().as_secs_f64());

        match &result {
            Ok(delivery) => {
                info!(
                    status = delivery.status,
                    event_id = %delivery.event_id,
                    "Event delivered"
                );
                self.metrics.increment_notifications("delivered");
            }
            Err(e) => {
                warn!(
                    error = %e,
                    retryable = e.is_retryable(),
                    "Event notification failed"
                );
                self.metrics.increment_notifications(e.outcome_label());
            }
        }
        result
    }
}

impl std::fmt::Debug for EventNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The URL and HTTP settings may carry credentials.
        f.debug_struct("EventNotifier")
            .field("source", &self.envelopes.source())
            .field("binding", &self.config.binding)
            .field("max_alerts", &self.config.max_alerts)
            .finish_non_exhaustive()
    }
}
