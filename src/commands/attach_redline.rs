//! `pmf-artwork attach-redline` command.

use crate::config::PmfConfig;
use crate::context::ServiceContext;
use crate::error::ReconcileError;
use crate::reconcile::ArtworkLink;
use crate::redline::RedlineManager;

/// Execute the `attach-redline` command for one artwork link.
///
/// # Errors
///
/// Returns an error string if the link does not exist or the redline
/// companion cannot be created, shared or linked.
pub async fn run(ctx: &ServiceContext, config: &PmfConfig, link_id: &str) -> Result<(), String> {
    let rows = ctx
        .store
        .query(&ArtworkLink::query_by_id(link_id))
        .await
        .map_err(|e| {
            ReconcileError::query(format!("reading artwork link {link_id}"), e).to_string()
        })?;
    let row = rows.first().ok_or_else(|| {
        ReconcileError::NotFound { what: format!("artwork link {link_id}") }.to_string()
    })?;
    let link = ArtworkLink::from_row(row).map_err(|e| e.to_string())?;

    let redline = RedlineManager::new(ctx, config).attach(&link).await.map_err(|e| e.to_string())?;
    println!("{link_id}: redline {redline}");
    if !config.vault.domain.is_empty() {
        println!("  {}", redline.ui_url(&config.vault.domain));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::run;
    use crate::adapters::memory::{CollectingNotifier, CollectingWorkflowStarter, MemoryStore};
    use crate::config::PmfConfig;
    use crate::context::ServiceContext;

    #[tokio::test]
    async fn unknown_link_is_not_found() {
        let ctx = ServiceContext::in_memory(
            MemoryStore::new(),
            CollectingNotifier::new(),
            CollectingWorkflowStarter::new(),
        );
        let err = run(&ctx, &PmfConfig::default(), "L404").await.unwrap_err();
        assert_eq!(err, "Not found: artwork link L404");
    }
}
