//! `pmf-artwork reconcile` command.

use super::finish_report;
use crate::batch::run_job;
use crate::config::PmfConfig;
use crate::context::ServiceContext;
use crate::reconcile::{Reconciler, UpVersionJob};

/// Execute the `reconcile` command for one PMF.
///
/// # Errors
///
/// Returns an error string if the field schema or the artwork links cannot
/// be read, or if any artwork link failed.
pub async fn run(ctx: &ServiceContext, config: &PmfConfig, pmf_id: &str) -> Result<(), String> {
    let reconciler = Reconciler::prepare(ctx, config).await.map_err(|e| e.to_string())?;
    let job = UpVersionJob::new(ctx, reconciler, pmf_id);
    let report = run_job(&job).await.map_err(|e| e.to_string())?;
    finish_report(&report)
}

#[cfg(test)]
mod tests {
    use super::run;
    use crate::adapters::memory::{CollectingNotifier, CollectingWorkflowStarter, MemoryStore};
    use crate::config::PmfConfig;
    use crate::context::ServiceContext;
    use crate::names::parameter_set;
    use crate::record::Row;

    #[tokio::test]
    async fn pmf_without_links_succeeds() {
        let store = MemoryStore::new();
        store.add_record(
            parameter_set::OBJECT,
            Row::new()
                .with(parameter_set::NAME, PmfConfig::default().parameter_set)
                .with(parameter_set::ARTWORK_FIELDS, "brand__c|Picklist"),
        );
        let notifier = CollectingNotifier::new();
        let ctx = ServiceContext::in_memory(store, notifier, CollectingWorkflowStarter::new());
        assert!(run(&ctx, &PmfConfig::default(), "PMF-1").await.is_ok());
    }

    #[tokio::test]
    async fn missing_parameter_set_stops_the_run() {
        let ctx = ServiceContext::in_memory(
            MemoryStore::new(),
            CollectingNotifier::new(),
            CollectingWorkflowStarter::new(),
        );
        let err = run(&ctx, &PmfConfig::default(), "PMF-1").await.unwrap_err();
        assert!(err.contains("parameter set not found"));
    }
}
