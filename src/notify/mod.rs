//! Operator notifications (lead captured, unanswered question).

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::TwinError;
use crate::provider::http::{shared_client, status_to_error};

const PUSHOVER_URL: &str = "https://api.pushover.net/1/messages.json";

/// Sink for short operator-facing messages.
///
/// Callers never consume a return value beyond success/failure; a failed
/// notification surfaces as a tool error, not a failed turn.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str) -> Result<(), TwinError>;
}

/// Sends notifications through the Pushover API.
#[derive(Debug, Clone)]
pub struct PushoverNotifier {
    token: String,
    user: String,
    endpoint: String,
}

impl PushoverNotifier {
    pub fn new(token: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user: user.into(),
            endpoint: PUSHOVER_URL.to_string(),
        }
    }

    /// Override the API endpoint (used for testing against a local server).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl Notifier for PushoverNotifier {
    async fn notify(&self, message: &str) -> Result<(), TwinError> {
        debug!(endpoint = %self.endpoint, "Sending push notification");
        let resp = shared_client()
            .post(&self.endpoint)
            .form(&[
                ("token", self.token.as_str()),
                ("user", self.user.as_str()),
                ("message", message),
            ])
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            let body = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body));
        }
        Ok(())
    }
}

/// Writes notifications to the log instead of sending them anywhere.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, message: &str) -> Result<(), TwinError> {
        info!(notification = %message, "Notification");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn pushover_posts_form_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/1/messages.json"))
            .and(body_string_contains("token=tok"))
            .and(body_string_contains("user=usr"))
            .and(body_string_contains("message=Recording+hello"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":1}"#))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = PushoverNotifier::new("tok", "usr")
            .with_endpoint(format!("{}/1/messages.json", server.uri()));
        notifier.notify("Recording hello").await.unwrap();
    }

    #[tokio::test]
    async fn pushover_rejection_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"status":0}"#))
            .mount(&server)
            .await;

        let notifier = PushoverNotifier::new("tok", "usr").with_endpoint(server.uri());
        let err = notifier.notify("x").await.unwrap_err();
        assert!(matches!(err, TwinError::Api { status: 400, .. }));
    }

    #[tokio::test]
    async fn log_notifier_always_succeeds() {
        assert!(LogNotifier.notify("anything").await.is_ok());
    }
}
