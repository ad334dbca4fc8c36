//! Recording adapter for the `WorkflowStarter` port.

use super::record_result;
use crate::cassette::session::SharedRecorder;
use crate::cassette::WORKFLOW_PORT;
use crate::ports::{PortFuture, WorkflowRequest, WorkflowStarter};

/// Records workflow starts while delegating to an inner starter.
pub struct RecordingWorkflowStarter {
    inner: Box<dyn WorkflowStarter>,
    recorder: SharedRecorder,
}

impl RecordingWorkflowStarter {
    /// Wraps `inner`, recording into `recorder`.
    pub fn new(inner: Box<dyn WorkflowStarter>, recorder: SharedRecorder) -> Self {
        Self { inner, recorder }
    }
}

impl WorkflowStarter for RecordingWorkflowStarter {
    fn start_workflow<'a>(&'a self, request: &'a WorkflowRequest) -> PortFuture<'a, ()> {
        Box::pin(async move {
            let result = self.inner.start_workflow(request).await;
            record_result(&self.recorder, WORKFLOW_PORT, "start_workflow", request, &result);
            result
        })
    }
}
