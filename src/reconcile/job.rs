//! The per-PMF up-version job.

use tracing::{info, warn};

use super::engine::Reconciler;
use super::link::ArtworkLink;
use super::outcome::ItemOutcome;
use crate::batch::{Job, JobFuture, Outcome};
use crate::context::ServiceContext;
use crate::error::{ReconcileError, ReconcileResult};

impl Outcome for ItemOutcome {
    fn label(&self) -> String {
        format!("{} ({})", self.link_id, self.snapshot)
    }

    fn failure(&self) -> Option<String> {
        self.error().map(ToString::to_string)
    }

    fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

/// Reconciles every artwork link of one PMF, one link per task.
pub struct UpVersionJob<'a> {
    reconciler: Reconciler<'a>,
    ctx: &'a ServiceContext,
    pmf_id: String,
}

impl<'a> UpVersionJob<'a> {
    /// A job over the artwork links of `pmf_id`.
    #[must_use]
    pub fn new(
        ctx: &'a ServiceContext,
        reconciler: Reconciler<'a>,
        pmf_id: impl Into<String>,
    ) -> Self {
        Self { reconciler, ctx, pmf_id: pmf_id.into() }
    }

    async fn links(&self) -> ReconcileResult<Vec<ArtworkLink>> {
        info!(pmf = %self.pmf_id, "Processing PMF");
        let rows = self
            .ctx
            .store
            .query(&ArtworkLink::query_for_pmf(&self.pmf_id))
            .await
            .map_err(|e| {
                ReconcileError::query(format!("listing artwork links of PMF {}", self.pmf_id), e)
            })?;
        info!(pmf = %self.pmf_id, count = rows.len(), "Artwork links found");

        let mut links = Vec::with_capacity(rows.len());
        for row in &rows {
            match ArtworkLink::from_row(row) {
                Ok(link) => links.push(link),
                Err(e) => warn!(pmf = %self.pmf_id, error = %e, "Skipping unreadable artwork link"),
            }
        }
        Ok(links)
    }
}

impl Job for UpVersionJob<'_> {
    type Item = ArtworkLink;
    type Output = ItemOutcome;

    fn name(&self) -> &str {
        "up_version_artworks"
    }

    fn init(&self) -> JobFuture<'_, ReconcileResult<Vec<ArtworkLink>>> {
        Box::pin(self.links())
    }

    fn process<'a>(&'a self, item: &'a ArtworkLink) -> JobFuture<'a, ItemOutcome> {
        Box::pin(self.reconciler.reconcile(item))
    }
}
