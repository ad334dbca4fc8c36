//! Live `WorkflowStarter` backed by the vault REST API.

use tracing::info;

use super::client::VaultClient;
use crate::ports::{PortError, PortFuture, WorkflowRequest, WorkflowStarter};

/// Starts document workflows through the vault REST API.
pub struct LiveWorkflowStarter {
    client: VaultClient,
}

impl LiveWorkflowStarter {
    /// Creates a starter using `client`.
    #[must_use]
    pub fn new(client: VaultClient) -> Self {
        Self { client }
    }

    async fn start(&self, request: &WorkflowRequest) -> Result<(), PortError> {
        let form: Vec<(String, String)> =
            request.params.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        let path = format!("/objects/documents/actions/{}", request.template);
        self.client.post_form(&path, &form).await?;
        info!(template = %request.template, "Started workflow");
        Ok(())
    }
}

impl WorkflowStarter for LiveWorkflowStarter {
    fn start_workflow<'a>(&'a self, request: &'a WorkflowRequest) -> PortFuture<'a, ()> {
        Box::pin(self.start(request))
    }
}
