//! Notification transports
//!
//! The dispatcher talks to a [`NotificationPort`]; concrete transports are
//! chosen when the tracker is built.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, error, info};

use crate::error::TrackerError;
use crate::types::OutboundMessage;

/// Anything able to deliver a rendered message to its recipient
#[async_trait]
pub trait NotificationPort: Send + Sync {
    /// Short transport name for logs
    fn name(&self) -> &str;

    /// Deliver the message or fail with `TransportFailure`
    async fn send(&self, message: &OutboundMessage) -> Result<(), TrackerError>;
}

#[async_trait]
impl<T: NotificationPort + ?Sized> NotificationPort for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn send(&self, message: &OutboundMessage) -> Result<(), TrackerError> {
        (**self).send(message).await
    }
}

/// Posts messages as JSON to an HTTP mail relay, authenticated as the sender
pub struct RelayTransport {
    client: Client,
    endpoint: String,
    username: String,
    password: String,
}

impl RelayTransport {
    pub fn new(endpoint: &str, username: &str, password: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        }
    }
}

#[async_trait]
impl NotificationPort for RelayTransport {
    fn name(&self) -> &str {
        "relay"
    }

    async fn send(&self, message: &OutboundMessage) -> Result<(), TrackerError> {
        let body = json!({
            "id": message.id,
            "from": message.from,
            "to": message.to,
            "subject": message.subject,
            "text": message.body,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.username, Some(&self.password))
            .json(&body)
            .send()
            .await
            .map_err(|e| TrackerError::TransportFailure(format!("Failed to send message: {e}")))?;

        let status = response.status();
        debug!("Relay response status: {status}");

        if !status.is_success() {
            error!(message_id = %message.id, "Relay rejected message with HTTP {status}");
            return Err(TrackerError::TransportFailure(format!(
                "Relay returned HTTP {status}"
            )));
        }

        Ok(())
    }
}

/// Logs messages instead of delivering them
#[derive(Debug, Default)]
pub struct LogTransport;

#[async_trait]
impl NotificationPort for LogTransport {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, message: &OutboundMessage) -> Result<(), TrackerError> {
        info!(
            message_id = %message.id,
            to = %message.to,
            subject = %message.subject,
            "Dry run, message not delivered\n{}",
            message.body
        );
        Ok(())
    }
}
