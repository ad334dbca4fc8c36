//! Replaying adapter for the `Notifier` port.

use super::{next_output, replay_result};
use crate::cassette::config::SharedReplayer;
use crate::cassette::NOTIFIER_PORT;
use crate::ports::{Notification, Notifier, PortFuture};

/// Serves recorded notification outcomes from a cassette.
pub struct ReplayingNotifier {
    replayer: Option<SharedReplayer>,
}

impl ReplayingNotifier {
    /// A notifier backed by the given replayer.
    #[must_use]
    pub fn new(replayer: SharedReplayer) -> Self {
        Self { replayer: Some(replayer) }
    }

    /// A notifier with no cassette. Panics when called.
    #[must_use]
    pub fn unconfigured() -> Self {
        Self { replayer: None }
    }
}

impl Notifier for ReplayingNotifier {
    fn notify<'a>(&'a self, _notification: &'a Notification) -> PortFuture<'a, ()> {
        let output = next_output(self.replayer.as_ref(), NOTIFIER_PORT, "notify");
        Box::pin(std::future::ready(replay_result(output)))
    }
}
