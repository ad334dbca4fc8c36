//! Live notifiers: a JSON webhook, or the log when no webhook is configured.

use reqwest::Client;
use tracing::info;

use crate::ports::{Notification, Notifier, PortError, PortFuture};

/// Posts each notification as JSON to a webhook.
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    /// Creates a notifier posting to `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { client: Client::new(), url: url.into() }
    }

    async fn post(&self, notification: &Notification) -> Result<(), PortError> {
        let response = self
            .client
            .post(&self.url)
            .json(notification)
            .send()
            .await
            .map_err(|e| -> PortError { format!("Notification webhook failed: {e}").into() })?;
        if !response.status().is_success() {
            return Err(
                format!("Notification webhook returned {}", response.status().as_u16()).into()
            );
        }
        Ok(())
    }
}

impl Notifier for WebhookNotifier {
    fn notify<'a>(&'a self, notification: &'a Notification) -> PortFuture<'a, ()> {
        Box::pin(self.post(notification))
    }
}

/// Writes notifications to the log instead of delivering them.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify<'a>(&'a self, notification: &'a Notification) -> PortFuture<'a, ()> {
        info!(
            recipients = ?notification.recipients,
            subject = %notification.subject,
            body = %notification.html_body,
            "Notification (no webhook configured)"
        );
        Box::pin(std::future::ready(Ok(())))
    }
}
