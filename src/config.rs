//! Configuration management for alertevent
//!
//! This module defines the main `Config` struct and its sub-structs. It uses
//! the `figment` crate to layer built-in defaults, an optional TOML file,
//! environment variables and command-line flags, in that order.

use crate::cli::Cli;
use crate::notification::{CancellationPolicy, EnvelopeBinding};
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// The logging level for the application.
    pub log_level: String,
    /// Configuration for the event notifier.
    pub event: EventConfig,
    /// Configuration for the default template renderer.
    pub template: TemplateConfig,
}

/// Configuration for the event notifier.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct EventConfig {
    /// The endpoint events are sent to.
    pub url: String,
    /// The `source` attribute of every event.
    pub source: String,
    /// Maximum number of alerts per notification; 0 means unbounded.
    pub max_alerts: u64,
    /// How the envelope is carried over HTTP.
    pub binding: EnvelopeBinding,
    /// Whether the caller's cancellation aborts an in-flight send.
    pub cancellation: CancellationPolicy,
    /// Status codes treated as retryable in addition to 5xx.
    pub retry_codes: Vec<u16>,
    /// HTTP client settings.
    pub http: HttpClientConfig,
}

/// HTTP client settings for the notifier.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct HttpClientConfig {
    /// Total request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Connection timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Whether to accept invalid TLS certificates (for testing).
    pub allow_invalid_certs: bool,
    /// Bearer token sent in the `Authorization` header.
    pub bearer_token: Option<String>,
    /// Basic auth credentials.
    pub basic_auth: Option<BasicAuth>,
    /// Extra headers sent with every request.
    pub headers: BTreeMap<String, String>,
    /// Proxy for all outbound requests.
    pub proxy_url: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BasicAuth {
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
}

/// Configuration for the default template renderer.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct TemplateConfig {
    /// Receiver name used when the caller does not provide one.
    pub receiver: String,
    /// Link back to the alerting system, exposed to receivers.
    pub external_url: String,
}

impl Config {
    /// Loads the application configuration.
    ///
    /// Sources are merged in increasing priority: defaults, the TOML file
    /// given by `--config`, `ALERTEVENT_`-prefixed environment variables
    /// (nested keys separated by `__`), and command-line flags.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if let Some(path) = &cli.config {
            figment = figment.merge(Toml::file(path));
        }
        let config: Config = figment
            .merge(Env::prefixed("ALERTEVENT_").split("__"))
            .merge(cli.clone())
            .extract()?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            event: EventConfig::default(),
            template: TemplateConfig::default(),
        }
    }
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            source: "alertevent".to_string(),
            max_alerts: 0,
            binding: EnvelopeBinding::Binary,
            cancellation: CancellationPolicy::Detached,
            retry_codes: vec![],
            http: HttpClientConfig::default(),
        }
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            connect_timeout_ms: 5_000,
            allow_invalid_certs: false,
            bearer_token: None,
            basic_auth: None,
            headers: BTreeMap::new(),
            proxy_url: None,
        }
    }
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            receiver: "event".to_string(),
            external_url: String::new(),
        }
    }
}
