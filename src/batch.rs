//! Batch job driver.
//!
//! A job lists its work items once, then processes them one at a time. Each
//! item produces its own outcome, so a failing item never stops the ones
//! after it. Completion hooks see the full report.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use tracing::{info, warn};

use crate::error::ReconcileResult;

/// A boxed future returned by job methods.
pub type JobFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The result of processing one work item.
pub trait Outcome {
    /// Short description of the item for logs and reports.
    fn label(&self) -> String;

    /// Why the item failed, or `None` if it succeeded.
    fn failure(&self) -> Option<String>;

    /// Problems that did not fail the item.
    fn warnings(&self) -> &[String] {
        &[]
    }
}

/// A batch job over independent work items.
pub trait Job: Sync {
    /// One unit of work.
    type Item: Send + Sync;
    /// Result of one unit of work.
    type Output: Outcome + Send;

    /// Job name used in logs.
    fn name(&self) -> &str;

    /// Lists the work items.
    ///
    /// # Errors
    ///
    /// Returns an error if the items cannot be listed; no item is processed then.
    fn init(&self) -> JobFuture<'_, ReconcileResult<Vec<Self::Item>>>;

    /// Processes one item. Failures are reported in the output, never raised.
    fn process<'a>(&'a self, item: &'a Self::Item) -> JobFuture<'a, Self::Output>;

    /// Called once every item has succeeded.
    fn on_all_succeeded(&self, report: &JobReport<Self::Output>) {
        info!(job = self.name(), tasks = report.len(), "All tasks completed successfully");
    }

    /// Called once when at least one item failed.
    fn on_any_failed(&self, report: &JobReport<Self::Output>) {
        warn!(
            job = self.name(),
            failed = report.failed_count(),
            tasks = report.len(),
            "Job completed with errors"
        );
        for outcome in report.failures() {
            warn!(
                job = self.name(),
                item = %outcome.label(),
                error = %outcome.failure().unwrap_or_default(),
                "Task failed"
            );
        }
    }
}

/// Outcomes of every item of a job run, in processing order.
#[derive(Debug, Clone, PartialEq)]
pub struct JobReport<O> {
    /// Job name.
    pub job: String,
    /// One outcome per item.
    pub outcomes: Vec<O>,
}

impl<O: Outcome> JobReport<O> {
    /// Number of processed items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Whether the job had no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Outcomes of failed items.
    pub fn failures(&self) -> impl Iterator<Item = &O> {
        self.outcomes.iter().filter(|o| o.failure().is_some())
    }

    /// Number of failed items.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.failures().count()
    }

    /// Whether every item succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failed_count() == 0
    }
}

impl<O: Outcome> fmt::Display for JobReport<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} item(s), {} succeeded, {} failed",
            self.job,
            self.len(),
            self.len() - self.failed_count(),
            self.failed_count()
        )
    }
}

/// Runs `job`: lists its items, processes them one by one, then calls the
/// matching completion hook.
///
/// # Errors
///
/// Returns the error from [`Job::init`]. Item failures are in the report.
pub async fn run_job<J: Job>(job: &J) -> ReconcileResult<JobReport<J::Output>> {
    let items = job.init().await?;
    info!(job = job.name(), items = items.len(), "Starting job");

    let mut outcomes = Vec::with_capacity(items.len());
    for item in &items {
        let outcome = job.process(item).await;
        match outcome.failure() {
            Some(error) => {
                warn!(job = job.name(), item = %outcome.label(), %error, "Task unsuccessful");
            }
            None => info!(job = job.name(), item = %outcome.label(), "Task successful"),
        }
        outcomes.push(outcome);
    }

    let report = JobReport { job: job.name().to_string(), outcomes };
    if report.all_succeeded() {
        job.on_all_succeeded(&report);
    } else {
        job.on_any_failed(&report);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReconcileError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Doubled {
        value: i64,
        error: Option<String>,
    }

    impl Outcome for Doubled {
        fn label(&self) -> String {
            self.value.to_string()
        }

        fn failure(&self) -> Option<String> {
            self.error.clone()
        }
    }

    struct DoublingJob {
        items: Result<Vec<i64>, ReconcileError>,
        completed: AtomicUsize,
        failed: AtomicUsize,
    }

    impl DoublingJob {
        fn over(items: Result<Vec<i64>, ReconcileError>) -> Self {
            Self { items, completed: AtomicUsize::new(0), failed: AtomicUsize::new(0) }
        }
    }

    impl Job for DoublingJob {
        type Item = i64;
        type Output = Doubled;

        fn name(&self) -> &str {
            "doubling"
        }

        fn init(&self) -> JobFuture<'_, ReconcileResult<Vec<i64>>> {
            Box::pin(std::future::ready(self.items.clone()))
        }

        fn process<'a>(&'a self, item: &'a i64) -> JobFuture<'a, Doubled> {
            let error = (*item < 0).then(|| format!("negative input {item}"));
            Box::pin(std::future::ready(Doubled { value: item * 2, error }))
        }

        fn on_all_succeeded(&self, _report: &JobReport<Doubled>) {
            self.completed.fetch_add(1, Ordering::SeqCst);
        }

        fn on_any_failed(&self, _report: &JobReport<Doubled>) {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn a_failing_item_does_not_stop_the_rest() {
        let job = DoublingJob::over(Ok(vec![1, -2, 3]));
        let report = run_job(&job).await.unwrap();
        assert_eq!(report.len(), 3);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.outcomes[2].value, 6);
        assert_eq!(job.failed.load(Ordering::SeqCst), 1);
        assert_eq!(job.completed.load(Ordering::SeqCst), 0);
        assert_eq!(report.to_string(), "doubling: 3 item(s), 2 succeeded, 1 failed");
    }

    #[tokio::test]
    async fn success_hook_runs_when_nothing_fails() {
        let job = DoublingJob::over(Ok(vec![]));
        let report = run_job(&job).await.unwrap();
        assert!(report.is_empty());
        assert_eq!(job.completed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn init_failure_processes_nothing() {
        let job = DoublingJob::over(Err(ReconcileError::NotFound { what: "PMF".into() }));
        assert!(run_job(&job).await.is_err());
        assert_eq!(job.completed.load(Ordering::SeqCst) + job.failed.load(Ordering::SeqCst), 0);
    }
}
