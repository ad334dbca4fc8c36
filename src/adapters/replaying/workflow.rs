//! Replaying adapter for the `WorkflowStarter` port.

use super::{next_output, replay_result};
use crate::cassette::config::SharedReplayer;
use crate::cassette::WORKFLOW_PORT;
use crate::ports::{PortFuture, WorkflowRequest, WorkflowStarter};

/// Serves recorded workflow start outcomes from a cassette.
pub struct ReplayingWorkflowStarter {
    replayer: Option<SharedReplayer>,
}

impl ReplayingWorkflowStarter {
    /// A starter backed by the given replayer.
    #[must_use]
    pub fn new(replayer: SharedReplayer) -> Self {
        Self { replayer: Some(replayer) }
    }

    /// A starter with no cassette. Panics when called.
    #[must_use]
    pub fn unconfigured() -> Self {
        Self { replayer: None }
    }
}

impl WorkflowStarter for ReplayingWorkflowStarter {
    fn start_workflow<'a>(&'a self, _request: &'a WorkflowRequest) -> PortFuture<'a, ()> {
        let output = next_output(self.replayer.as_ref(), WORKFLOW_PORT, "start_workflow");
        Box::pin(std::future::ready(replay_result(output)))
    }
}
