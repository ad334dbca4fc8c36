//! `pmf-artwork lock-redlines` and `unlock-redlines` commands.

use super::finish_report;
use crate::batch::run_job;
use crate::config::PmfConfig;
use crate::context::ServiceContext;
use crate::redline::{LockMode, RedlineLockJob};

/// Execute a lock or unlock run over the redlines of one PMF.
///
/// # Errors
///
/// Returns an error string if the redlines cannot be listed or any of them
/// failed to change state.
pub async fn run(
    ctx: &ServiceContext,
    config: &PmfConfig,
    pmf_id: &str,
    mode: LockMode,
) -> Result<(), String> {
    let job = RedlineLockJob::new(ctx, config, pmf_id, mode);
    let report = run_job(&job).await.map_err(|e| e.to_string())?;
    finish_report(&report)
}
