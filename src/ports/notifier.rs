//! Notification port.

use serde::{Deserialize, Serialize};

use super::PortFuture;

/// An HTML notification addressed to vault users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Recipient user ids.
    pub recipients: Vec<String>,
    /// Subject line.
    pub subject: String,
    /// HTML message body.
    pub html_body: String,
}

/// Sends notifications to vault users.
///
/// Callers treat delivery as fire-and-forget: a failed send is logged and
/// never changes the outcome of the work that triggered it.
pub trait Notifier: Send + Sync {
    /// Sends one notification.
    ///
    /// # Errors
    ///
    /// Returns an error if delivery fails.
    fn notify<'a>(&'a self, notification: &'a Notification) -> PortFuture<'a, ()>;
}
