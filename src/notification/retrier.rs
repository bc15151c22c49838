//! Classification of HTTP status codes into delivery outcomes.

use super::NotifyError;
use std::fmt;
use std::sync::Arc;

type DetailsFn = Arc<dyn Fn(u16) -> String + Send + Sync>;

/// The verdict for one HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The receiver accepted the event.
    Delivered { status: u16 },
    /// The receiver failed in a way a later attempt may overcome.
    Retryable { status: u16, detail: String },
    /// The receiver rejected the event; retrying will not help.
    Permanent { status: u16, detail: String },
}

impl Outcome {
    pub fn status(&self) -> u16 {
        match self {
            Outcome::Delivered { status }
            | Outcome::Retryable { status, .. }
            | Outcome::Permanent { status, .. } => *status,
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, Outcome::Delivered { .. })
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Outcome::Retryable { .. })
    }

    /// `Ok(status)` when delivered, the matching `NotifyError` otherwise.
    pub fn into_result(self) -> Result<u16, NotifyError> {
        match self {
            Outcome::Delivered { status } => Ok(status),
            Outcome::Retryable { status, detail } => Err(NotifyError::Retryable { status, detail }),
            Outcome::Permanent { status, detail } => Err(NotifyError::Permanent { status, detail }),
        }
    }
}

/// Decides whether a response status means delivered, retryable or
/// permanent.
///
/// 2xx is delivered, 5xx and any extra configured codes are retryable,
/// everything else is permanent. The retrier keeps no state between calls.
#[derive(Clone)]
pub struct Retrier {
    retry_codes: Vec<u16>,
    details: DetailsFn,
}

impl Retrier {
    pub fn new() -> Self {
        Self {
            retry_codes: Vec::new(),
            details: Arc::new(|_| String::new()),
        }
    }

    /// Treats `codes` as retryable in addition to 5xx.
    pub fn with_retry_codes(mut self, codes: Vec<u16>) -> Self {
        self.retry_codes = codes;
        self
    }

    /// Sets the function producing the detail attached to failed outcomes.
    pub fn with_details<F>(mut self, details: F) -> Self
    where
        F: Fn(u16) -> String + Send + Sync + 'static,
    {
        self.details = Arc::new(details);
        self
    }

    pub fn check(&self, status: u16) -> Outcome {
        if (200..300).contains(&status) {
            return Outcome::Delivered { status };
        }

        let detail = (self.details)(status);
        if (500..600).contains(&status) || self.retry_codes.contains(&status) {
            Outcome::Retryable { status, detail }
        } else {
            Outcome::Permanent { status, detail }
        }
    }
}

impl Default for Retrier {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Retrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retrier")
            .field("retry_codes", &self.retry_codes)
            .finish_non_exhaustive()
    }
}
