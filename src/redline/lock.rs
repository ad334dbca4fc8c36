//! Locking and unlocking a PMF's redline documents.

use std::fmt;

use tracing::info;

use crate::batch::{Job, JobFuture, Outcome};
use crate::config::PmfConfig;
use crate::context::ServiceContext;
use crate::error::{ReconcileError, ReconcileResult};
use crate::names::{doc, redline_link};
use crate::query::Query;
use crate::version::VersionId;

/// Direction of a lock job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// Move redlines into the locked state.
    Lock,
    /// Reopen locked redlines.
    Unlock,
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Lock => "lock",
            Self::Unlock => "unlock",
        })
    }
}

/// Result of locking or unlocking one redline document.
#[derive(Debug, Clone, PartialEq)]
pub struct LockOutcome {
    /// Redline version id as stored on the link record.
    pub redline: String,
    /// `Ok(true)` if the document changed state, `Ok(false)` if it was
    /// already where it should be.
    pub result: Result<bool, ReconcileError>,
}

impl fmt::Display for LockOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.result {
            Ok(true) => write!(f, "{}: changed", self.redline),
            Ok(false) => write!(f, "{}: already in place", self.redline),
            Err(e) => write!(f, "{}: failed: {e}", self.redline),
        }
    }
}

impl Outcome for LockOutcome {
    fn label(&self) -> String {
        self.redline.clone()
    }

    fn failure(&self) -> Option<String> {
        self.result.as_ref().err().map(ToString::to_string)
    }
}

/// Locks or unlocks every redline document attached to a PMF.
pub struct RedlineLockJob<'a> {
    ctx: &'a ServiceContext,
    config: &'a PmfConfig,
    pmf_id: String,
    mode: LockMode,
}

impl<'a> RedlineLockJob<'a> {
    /// A job over the redlines of `pmf_id`.
    #[must_use]
    pub fn new(
        ctx: &'a ServiceContext,
        config: &'a PmfConfig,
        pmf_id: impl Into<String>,
        mode: LockMode,
    ) -> Self {
        Self { ctx, config, pmf_id: pmf_id.into(), mode }
    }

    async fn list(&self) -> ReconcileResult<Vec<String>> {
        let query = Query::object(redline_link::OBJECT)
            .select(redline_link::REDLINE_DOCUMENT)
            .where_eq(redline_link::PMF, self.pmf_id.as_str());
        let rows = self
            .ctx
            .store
            .query(&query)
            .await
            .map_err(|e| {
                ReconcileError::query(format!("listing redlines of PMF {}", self.pmf_id), e)
            })?;
        Ok(rows.iter().filter_map(|row| row.text(redline_link::REDLINE_DOCUMENT)).collect())
    }

    async fn apply(&self, redline: &str) -> ReconcileResult<bool> {
        let version = VersionId::parse(redline)?;
        let query =
            Query::all_versions().select_name(doc::STATUS).where_eq(doc::VERSION_ID, &version);
        let state = self
            .ctx
            .store
            .query(&query)
            .await
            .map_err(|e| ReconcileError::query(format!("reading state of redline {version}"), e))?
            .first()
            .and_then(|row| row.text(doc::STATUS))
            .ok_or_else(|| ReconcileError::NotFound {
                what: format!("redline document {version}"),
            })?;

        let lifecycle = &self.config.lifecycle;
        let locked = state == lifecycle.redline_locked;
        let action = match (self.mode, locked) {
            (LockMode::Lock, true) | (LockMode::Unlock, false) => {
                info!(redline = %version, %state, mode = %self.mode, "Redline already in place");
                return Ok(false);
            }
            (LockMode::Lock, false) => &lifecycle.lock_action,
            (LockMode::Unlock, true) => &lifecycle.unlock_action,
        };

        self.ctx
            .store
            .user_action(&version, action)
            .await
            .map_err(|e| {
                ReconcileError::rejected(format!("Redline {} action {action}", self.mode), e)
            })?;
        info!(redline = %version, action = action.as_str(), "Redline state changed");
        Ok(true)
    }
}

impl Job for RedlineLockJob<'_> {
    type Item = String;
    type Output = LockOutcome;

    fn name(&self) -> &str {
        match self.mode {
            LockMode::Lock => "lock_redline_artworks",
            LockMode::Unlock => "unlock_redline_artworks",
        }
    }

    fn init(&self) -> JobFuture<'_, ReconcileResult<Vec<String>>> {
        Box::pin(self.list())
    }

    fn process<'a>(&'a self, item: &'a String) -> JobFuture<'a, LockOutcome> {
        Box::pin(async move {
            LockOutcome { redline: item.clone(), result: self.apply(item).await }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        CollectingNotifier, CollectingWorkflowStarter, MemoryStore, Rejection,
    };
    use crate::batch::run_job;
    use crate::record::Row;

    fn setup(states: &[&str]) -> (MemoryStore, ServiceContext) {
        let store = MemoryStore::new();
        for (i, state) in states.iter().enumerate() {
            let id = format!("R{i}");
            let version = store.add_version(&id, 0, 1, Row::new().with(doc::STATUS, *state));
            store.add_record(
                redline_link::OBJECT,
                Row::new()
                    .with(redline_link::PMF, "PMF-1")
                    .with(redline_link::REDLINE_DOCUMENT, version.to_string()),
            );
        }
        let ctx = ServiceContext::in_memory(
            store.clone(),
            CollectingNotifier::new(),
            CollectingWorkflowStarter::new(),
        );
        (store, ctx)
    }

    #[tokio::test]
    async fn lock_skips_already_locked_redlines() {
        let (store, ctx) = setup(&["draft__c", "locked__c"]);
        let config = PmfConfig::default();
        let job = RedlineLockJob::new(&ctx, &config, "PMF-1", LockMode::Lock);
        let report = run_job(&job).await.unwrap();

        assert!(report.all_succeeded());
        assert_eq!(report.outcomes[0].result, Ok(true));
        assert_eq!(report.outcomes[1].result, Ok(false));
        assert_eq!(store.head("R0").unwrap().text(doc::STATUS).as_deref(), Some("locked__c"));
        assert_eq!(store.writes().len(), 1);
    }

    #[tokio::test]
    async fn unlock_reopens_only_locked_redlines() {
        let (store, ctx) = setup(&["locked__c", "draft__c"]);
        let config = PmfConfig::default();
        let job = RedlineLockJob::new(&ctx, &config, "PMF-1", LockMode::Unlock);
        let report = run_job(&job).await.unwrap();

        assert_eq!(report.outcomes[0].result, Ok(true));
        assert_eq!(report.outcomes[1].result, Ok(false));
        assert_eq!(store.head("R0").unwrap().text(doc::STATUS).as_deref(), Some("draft__c"));
    }

    #[tokio::test]
    async fn one_failing_redline_does_not_stop_the_others() {
        let (store, ctx) = setup(&["draft__c", "draft__c"]);
        store.reject_writes("R0", Rejection::Error("OPERATION_NOT_ALLOWED: checked out".into()));
        let config = PmfConfig::default();
        let job = RedlineLockJob::new(&ctx, &config, "PMF-1", LockMode::Lock);
        let report = run_job(&job).await.unwrap();

        assert_eq!(report.failed_count(), 1);
        assert!(report.outcomes[0].failure().unwrap().contains("checked out"));
        assert_eq!(report.outcomes[1].result, Ok(true));
    }
}
