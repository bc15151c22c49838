/// alertevent - delivers alert notifications as CloudEvents over HTTP
///
/// This library bounds a batch of alerts, renders it into a versioned JSON
/// message, wraps the message in an event envelope, sends it to a configured
/// endpoint and classifies the answer as delivered, retryable or permanent.
pub mod cli;
pub mod config;
pub mod core;
pub mod internal_metrics;
pub mod notification;
pub mod template;

// Re-export core types for convenience
pub use crate::core::*;
pub use notification::{Delivery, EventNotifier, NotifyError};
