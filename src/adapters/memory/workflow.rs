//! In-memory `WorkflowStarter` that keeps every start request.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::ports::{PortError, PortFuture, WorkflowRequest, WorkflowStarter};

#[derive(Debug, Default)]
struct Started {
    requests: Vec<WorkflowRequest>,
    failure: Option<String>,
}

/// Records workflow start requests instead of starting anything.
///
/// Clones share the same request list.
#[derive(Debug, Clone, Default)]
pub struct CollectingWorkflowStarter {
    started: Arc<Mutex<Started>>,
}

impl CollectingWorkflowStarter {
    /// A starter that accepts every request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later start fail with `message`.
    pub fn fail_with(&self, message: &str) {
        self.lock().failure = Some(message.to_string());
    }

    /// Requests accepted so far.
    #[must_use]
    pub fn started(&self) -> Vec<WorkflowRequest> {
        self.lock().requests.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Started> {
        self.started.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl WorkflowStarter for CollectingWorkflowStarter {
    fn start_workflow<'a>(&'a self, request: &'a WorkflowRequest) -> PortFuture<'a, ()> {
        let mut started = self.lock();
        let result: Result<(), PortError> = if let Some(message) = started.failure.clone() {
            Err(message.into())
        } else {
            started.requests.push(request.clone());
            Ok(())
        };
        Box::pin(std::future::ready(result))
    }
}
