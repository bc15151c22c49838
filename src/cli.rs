//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the application using the
//! `clap` crate. Arguments that override configuration are merged on top of
//! the TOML file and environment variables through the `figment::Provider`
//! implementation below.

use clap::Parser;
use figment::{
    providers::Serialized,
    value::{Dict, Map},
    Error, Metadata, Profile, Provider,
};
use serde::Serialize;
use std::path::PathBuf;

/// Sends a batch of alerts to an HTTP endpoint as a CloudEvents event.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// JSON file holding the array of alerts to send ("-" for stdin).
    #[arg(short, long, value_name = "FILE", default_value = "-")]
    pub alerts: PathBuf,

    /// Group key of the alert batch.
    #[arg(long, value_name = "KEY")]
    pub group_key: Option<String>,

    /// Target endpoint URL.
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Source attribute of the event.
    #[arg(long, value_name = "SOURCE")]
    pub source: Option<String>,

    /// Maximum number of alerts per notification (0 for unbounded).
    #[arg(long, value_name = "COUNT")]
    pub max_alerts: Option<u64>,

    /// Logging level (error, warn, info, debug, trace).
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

#[derive(Serialize)]
struct Overrides<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    log_level: Option<&'a str>,
    event: EventOverrides<'a>,
}

#[derive(Serialize)]
struct EventOverrides<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_alerts: Option<u64>,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        // Only flags that were given end up in the dict.
        let overrides = Overrides {
            log_level: self.log_level.as_deref(),
            event: EventOverrides {
                url: self.url.as_deref(),
                source: self.source.as_deref(),
                max_alerts: self.max_alerts,
            },
        };
        Serialized::defaults(overrides).data()
    }
}
