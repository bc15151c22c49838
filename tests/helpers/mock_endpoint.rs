//! A mock event endpoint built on `wiremock`.

use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const EVENTS_PATH: &str = "/events";

/// Starts an endpoint answering every event POST with `status`.
pub async fn start_endpoint(status: u16) -> MockServer {
    start_endpoint_with(ResponseTemplate::new(status)).await
}

/// Starts an endpoint answering with `status` after `delay`.
pub async fn start_slow_endpoint(status: u16, delay: Duration) -> MockServer {
    start_endpoint_with(ResponseTemplate::new(status).set_delay(delay)).await
}

async fn start_endpoint_with(response: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(EVENTS_PATH))
        .respond_with(response)
        .mount(&server)
        .await;
    server
}

/// The URL events should be sent to on `server`.
pub fn events_url(server: &MockServer) -> String {
    format!("{}{}", server.uri(), EVENTS_PATH)
}

/// A URL on localhost where nothing is listening.
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}{}", addr, EVENTS_PATH)
}

/// All requests the endpoint has received so far.
pub async fn received(server: &MockServer) -> Vec<Request> {
    server.received_requests().await.unwrap_or_default()
}

/// The JSON bodies of all requests received so far.
pub async fn received_bodies(server: &MockServer) -> Vec<serde_json::Value> {
    received(server)
        .await
        .iter()
        .map(|request| serde_json::from_slice(&request.body).unwrap())
        .collect()
}

/// Value of header `name` on `request`, if present and valid UTF-8.
pub fn header<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
    request.headers.get(name).and_then(|v| v.to_str().ok())
}
