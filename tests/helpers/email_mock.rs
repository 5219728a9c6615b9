//! Mock transactional email API
//!
//! Wraps a wiremock server that answers `POST /emails` the way the real
//! provider does, and lets tests inspect what was sent.

use serde_json::{json, Value};
use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const TEST_EMAIL_API_KEY: &str = "test-email-key";

pub struct EmailMockServer {
    pub server: MockServer,
}

impl EmailMockServer {
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Endpoint to configure as `email.api_url`
    pub fn api_url(&self) -> String {
        format!("{}/emails", self.server.uri())
    }

    /// Accept every message and answer with `message_id`
    pub async fn mock_accept(&self, message_id: &str) {
        Mock::given(method("POST"))
            .and(path("/emails"))
            .and(header("authorization", format!("Bearer {}", TEST_EMAIL_API_KEY).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": message_id })))
            .mount(&self.server)
            .await;
    }

    /// Reject every message with the given status
    pub async fn mock_reject(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path("/emails"))
            .respond_with(
                ResponseTemplate::new(status)
                    .set_body_json(json!({ "message": "sender domain not verified" })),
            )
            .mount(&self.server)
            .await;
    }

    /// JSON bodies of every message received so far
    pub async fn sent_messages(&self) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter_map(|request| serde_json::from_slice(&request.body).ok())
            .collect()
    }

    pub async fn reset(&self) {
        self.server.reset().await;
    }
}
