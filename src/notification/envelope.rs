//! CloudEvents envelope wrapping the wire message.
//!
//! Each send gets a fresh envelope with its own id. The envelope is encoded
//! for HTTP in either binary mode (metadata in `ce-*` headers, message as the
//! body) or structured mode (the whole envelope as a JSON body).

use super::message::WireMessage;
use super::NotifyError;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const SPEC_VERSION: &str = "1.0";
pub const EVENT_TYPE: &str = "alert";
pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_CLOUDEVENTS_JSON: &str = "application/cloudevents+json";

/// How the envelope is carried over HTTP.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeBinding {
    /// Metadata in `ce-*` headers, wire message as the body.
    #[default]
    Binary,
    /// Whole envelope as an `application/cloudevents+json` body.
    Structured,
}

/// A single event ready to be sent.
#[derive(Debug, Clone, Serialize)]
pub struct EventEnvelope {
    specversion: &'static str,
    id: String,
    source: String,
    #[serde(rename = "type")]
    event_type: &'static str,
    datacontenttype: &'static str,
    time: DateTime<Utc>,
    data: serde_json::Value,
}

impl EventEnvelope {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn event_type(&self) -> &str {
        self.event_type
    }

    pub fn data_content_type(&self) -> &str {
        self.datacontenttype
    }

    pub fn data(&self) -> &serde_json::Value {
        &self.data
    }

    /// Encodes the envelope into HTTP headers and body for `binding`.
    pub fn encode(&self, binding: EnvelopeBinding) -> Result<EncodedEvent, NotifyError> {
        let mut headers = HeaderMap::new();
        let body = match binding {
            EnvelopeBinding::Binary => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON));
                headers.insert("ce-specversion", HeaderValue::from_static(SPEC_VERSION));
                headers.insert("ce-id", header_value("id", &self.id)?);
                headers.insert("ce-source", header_value("source", &self.source)?);
                headers.insert("ce-type", HeaderValue::from_static(EVENT_TYPE));
                let time = self.time.to_rfc3339_opts(SecondsFormat::AutoSi, true);
                headers.insert("ce-time", header_value("time", &time)?);
                serde_json::to_vec(&self.data)
            }
            EnvelopeBinding::Structured => {
                headers.insert(
                    CONTENT_TYPE,
                    HeaderValue::from_static(CONTENT_TYPE_CLOUDEVENTS_JSON),
                );
                serde_json::to_vec(self)
            }
        }
        .map_err(|e| NotifyError::Envelope(format!("JSON serialization error: {}", e)))?;

        Ok(EncodedEvent {
            id: self.id.clone(),
            headers,
            body,
        })
    }
}

fn header_value(attribute: &str, value: &str) -> Result<HeaderValue, NotifyError> {
    HeaderValue::from_str(value).map_err(|_| {
        NotifyError::Envelope(format!(
            "{} attribute '{}' cannot be carried in an HTTP header",
            attribute, value
        ))
    })
}

/// An envelope encoded for the HTTP transport.
#[derive(Debug, Clone)]
pub struct EncodedEvent {
    pub id: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// Builds envelopes for one configured event source.
#[derive(Debug, Clone)]
pub struct EnvelopeBuilder {
    source: String,
}

impl EnvelopeBuilder {
    /// Creates a builder for `source`, which must not be empty.
    pub fn new(source: impl Into<String>) -> Result<Self, NotifyError> {
        let source = source.into();
        if source.trim().is_empty() {
            return Err(NotifyError::Config(
                "event source must not be empty".to_string(),
            ));
        }
        Ok(Self { source })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Wraps `message` in a new envelope with a freshly generated id.
    pub fn build(&self, message: &WireMessage) -> Result<EventEnvelope, NotifyError> {
        let data = serde_json::to_value(message)
            .map_err(|e| NotifyError::Envelope(format!("JSON serialization error: {}", e)))?;

        Ok(EventEnvelope {
            specversion: SPEC_VERSION,
            id: Uuid::new_v4().to_string(),
            source: self.source.clone(),
            event_type: EVENT_TYPE,
            datacontenttype: CONTENT_TYPE_JSON,
            time: Utc::now(),
            data,
        })
    }
}
