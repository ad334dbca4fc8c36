//! Workflow starter port.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::PortFuture;

/// A request to start a document workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRequest {
    /// Workflow API name, e.g. `pmf_draft__c`.
    pub template: String,
    /// Start parameters by name.
    pub params: BTreeMap<String, String>,
}

/// Starts vault workflows.
pub trait WorkflowStarter: Send + Sync {
    /// Starts a workflow instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the vault refuses to start the workflow.
    fn start_workflow<'a>(&'a self, request: &'a WorkflowRequest) -> PortFuture<'a, ()>;
}
