//! alertevent - sends one alert notification as a CloudEvents event.
//!
//! Reads a JSON array of alerts, delivers it to the configured endpoint and
//! prints a JSON summary of the outcome. The exit code tells a calling
//! scheduler what to do next: 0 delivered, 75 retry later, 1 give up.

use alertevent::{
    cli::Cli,
    config::Config,
    core::{Alert, Notifier, NotifyContext},
    notification::EventNotifier,
    template::DefaultTemplate,
};
use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Exit code for failures a later attempt may overcome (sysexits EX_TEMPFAIL).
const EXIT_RETRYABLE: i32 = 75;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment, and CLI args.
    let config = Config::load(&cli).context("Failed to load configuration")?;

    // Logs go to stderr; stdout carries the JSON summary.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!("Event Source: {}", config.event.source);
    info!("Max Alerts: {}", config.event.max_alerts);
    info!("Envelope Binding: {:?}", config.event.binding);
    info!("Cancellation: {:?}", config.event.cancellation);
    info!("Receiver: {}", config.template.receiver);
    info!("-------------------------------------------------------");

    let alerts = read_alerts(&cli.alerts)?;
    info!("Loaded {} alerts", alerts.len());

    let template = Arc::new(DefaultTemplate::from_config(&config.template));
    let notifier = EventNotifier::new(config.event.clone(), template)?;

    let mut ctx = NotifyContext::new().with_receiver(config.template.receiver.clone());
    if let Some(group_key) = &cli.group_key {
        ctx = ctx.with_group_key(group_key.clone());
    }

    let (summary, code) = match notifier.notify(&ctx, &alerts).await {
        Ok(delivery) => (
            json!({
                "delivered": true,
                "status": delivery.status,
                "eventId": delivery.event_id,
                "truncatedAlerts": delivery.truncated_alerts,
            }),
            0,
        ),
        Err(e) => {
            let status = e.status();
            let retryable = e.is_retryable();
            // Render the whole cause chain, e.g. the transport error behind
            // an undelivered event.
            let message = format!("{:#}", anyhow::Error::new(e));
            error!(error = %message, "Notification was not delivered");
            let code = if retryable { EXIT_RETRYABLE } else { 1 };
            (
                json!({
                    "delivered": false,
                    "status": status,
                    "retryable": retryable,
                    "error": message,
                }),
                code,
            )
        }
    };

    println!("{}", summary);
    std::process::exit(code);
}

/// Reads the alert batch from `path`, or from stdin when `path` is "-".
fn read_alerts(path: &Path) -> Result<Vec<Alert>> {
    let mut raw = String::new();
    if path == Path::new("-") {
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("Failed to read alerts from stdin")?;
    } else {
        raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read alerts file {}", path.display()))?;
    }
    serde_json::from_str(&raw).context("Failed to parse alerts JSON")
}
