//! Recording adapter for the `Notifier` port.

use super::record_result;
use crate::cassette::session::SharedRecorder;
use crate::cassette::NOTIFIER_PORT;
use crate::ports::{Notification, Notifier, PortFuture};

/// Records notifications while delegating to an inner notifier.
pub struct RecordingNotifier {
    inner: Box<dyn Notifier>,
    recorder: SharedRecorder,
}

impl RecordingNotifier {
    /// Wraps `inner`, recording into `recorder`.
    pub fn new(inner: Box<dyn Notifier>, recorder: SharedRecorder) -> Self {
        Self { inner, recorder }
    }
}

impl Notifier for RecordingNotifier {
    fn notify<'a>(&'a self, notification: &'a Notification) -> PortFuture<'a, ()> {
        Box::pin(async move {
            let result = self.inner.notify(notification).await;
            record_result(&self.recorder, NOTIFIER_PORT, "notify", notification, &result);
            result
        })
    }
}
