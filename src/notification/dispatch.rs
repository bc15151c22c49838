//! HTTP transport for encoded events.

use super::envelope::EncodedEvent;
use super::NotifyError;
use crate::config::{EventConfig, HttpClientConfig};
use crate::core::NotifyContext;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Whether the caller's cancellation signal aborts an in-flight send.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CancellationPolicy {
    /// The send runs to completion (or timeout) regardless of the caller.
    #[default]
    Detached,
    /// The send is abandoned as soon as the caller cancels.
    Inherit,
}

#[derive(Debug, Clone)]
enum Auth {
    None,
    Bearer(String),
    Basic {
        username: String,
        password: Option<String>,
    },
}

impl Auth {
    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Auth::None => request,
            Auth::Bearer(token) => request.bearer_auth(token),
            Auth::Basic { username, password } => request.basic_auth(username, password.as_ref()),
        }
    }
}

/// Sends encoded events to one target endpoint.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: reqwest::Client,
    url: Url,
    /// `url` without userinfo, safe for logs and error details.
    target: Url,
    auth: Auth,
    cancellation: CancellationPolicy,
}

impl Dispatcher {
    /// Builds the dispatcher and its HTTP client from configuration.
    pub fn from_config(config: &EventConfig) -> Result<Self, NotifyError> {
        let url = parse_target(&config.url)?;
        let target = redact(&url);
        let client = build_client(&config.http)?;
        let auth = match (&config.http.bearer_token, &config.http.basic_auth) {
            (Some(_), Some(_)) => {
                return Err(NotifyError::Config(
                    "at most one of bearer_token and basic_auth may be configured".to_string(),
                ))
            }
            (Some(token), None) => Auth::Bearer(token.clone()),
            (None, Some(basic)) => Auth::Basic {
                username: basic.username.clone(),
                password: basic.password.clone(),
            },
            (None, None) => Auth::None,
        };

        Ok(Self {
            client,
            url,
            target,
            auth,
            cancellation: config.cancellation,
        })
    }

    /// The target endpoint with any credentials stripped.
    pub fn target(&self) -> &Url {
        &self.target
    }

    /// POSTs `event` to the target and returns the response status code.
    ///
    /// Fails with `Undelivered` when no response was obtained, and with
    /// `Cancelled` when the policy is `Inherit` and the caller cancels first.
    #[instrument(skip_all, fields(target = %self.target, event_id = %event.id))]
    pub async fn send(&self, event: EncodedEvent, ctx: &NotifyContext) -> Result<u16, NotifyError> {
        let request = self
            .client
            .post(self.url.clone())
            .headers(event.headers)
            .body(event.body);
        let send = self.auth.apply(request).send();

        let response = match self.cancellation {
            CancellationPolicy::Detached => send.await,
            CancellationPolicy::Inherit => {
                tokio::select! {
                    biased;
                    _ = ctx.cancelled() => {
                        warn!("Caller cancelled the notification, abandoning send");
                        return Err(NotifyError::Cancelled);
                    }
                    response = send => response,
                }
            }
        };

        match response {
            Ok(res) => {
                let status = res.status();
                debug!(status = %status, "Received response from event endpoint");
                Ok(status.as_u16())
            }
            Err(e) => {
                let e = e.with_url(self.target.clone());
                warn!(error = %e, "HTTP request to event endpoint failed");
                Err(NotifyError::Undelivered {
                    target: self.target.to_string(),
                    source: e,
                })
            }
        }
    }
}

fn parse_target(url: &str) -> Result<Url, NotifyError> {
    if url.is_empty() {
        return Err(NotifyError::Config("target URL is not set".to_string()));
    }
    let target = Url::parse(url)
        .map_err(|e| NotifyError::Config(format!("invalid target URL '{}': {}", url, e)))?;
    match target.scheme() {
        "http" | "https" => Ok(target),
        scheme => Err(NotifyError::Config(format!(
            "unsupported target URL scheme '{}'",
            scheme
        ))),
    }
}

fn redact(url: &Url) -> Url {
    let mut redacted = url.clone();
    // Only fails for URLs that cannot carry credentials in the first place.
    let _ = redacted.set_username("");
    let _ = redacted.set_password(None);
    redacted
}

fn build_client(config: &HttpClientConfig) -> Result<reqwest::Client, NotifyError> {
    let mut headers = HeaderMap::new();
    for (key, value) in &config.headers {
        let name = HeaderName::from_str(key)
            .map_err(|_| NotifyError::Config(format!("invalid header name: {}", key)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| NotifyError::Config(format!("invalid header value for '{}'", key)))?;
        headers.insert(name, value);
    }

    let mut builder = reqwest::Client::builder()
        .timeout(Duration::from_millis(config.timeout_ms))
        .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
        .danger_accept_invalid_certs(config.allow_invalid_certs)
        .default_headers(headers);

    if let Some(proxy_url) = &config.proxy_url {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| NotifyError::Config(format!("invalid proxy URL '{}': {}", proxy_url, e)))?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| NotifyError::Config(format!("failed to build HTTP client: {}", e)))
}
