//! In-memory `Notifier` that keeps every notification it is given.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::ports::{Notification, Notifier, PortError, PortFuture};

#[derive(Debug, Default)]
struct Outbox {
    sent: Vec<Notification>,
    failure: Option<String>,
}

/// Collects notifications instead of delivering them.
///
/// Clones share the same outbox.
#[derive(Debug, Clone, Default)]
pub struct CollectingNotifier {
    outbox: Arc<Mutex<Outbox>>,
}

impl CollectingNotifier {
    /// An empty notifier that accepts every notification.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later send fail with `message`.
    pub fn fail_with(&self, message: &str) {
        self.outbox().failure = Some(message.to_string());
    }

    /// Notifications accepted so far.
    #[must_use]
    pub fn sent(&self) -> Vec<Notification> {
        self.outbox().sent.clone()
    }

    fn outbox(&self) -> MutexGuard<'_, Outbox> {
        self.outbox.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Notifier for CollectingNotifier {
    fn notify<'a>(&'a self, notification: &'a Notification) -> PortFuture<'a, ()> {
        let mut outbox = self.outbox();
        let result: Result<(), PortError> = if let Some(message) = outbox.failure.clone() {
            Err(message.into())
        } else {
            outbox.sent.push(notification.clone());
            Ok(())
        };
        Box::pin(std::future::ready(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Notification {
        Notification {
            recipients: vec!["U1".into()],
            subject: "subject".into(),
            html_body: "<p>body</p>".into(),
        }
    }

    #[tokio::test]
    async fn collects_until_told_to_fail() {
        let notifier = CollectingNotifier::new();
        let handle = notifier.clone();
        notifier.notify(&sample()).await.unwrap();
        assert_eq!(handle.sent().len(), 1);

        handle.fail_with("SMTP down");
        assert!(notifier.notify(&sample()).await.is_err());
        assert_eq!(handle.sent().len(), 1);
    }
}
