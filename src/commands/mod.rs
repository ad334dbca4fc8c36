//! Command dispatch and handlers.

pub mod attach_redline;
pub mod check_config;
pub mod lock;
pub mod reconcile;

use std::env;
use std::fmt::Display;
use std::path::Path;

use crate::adapters::live::LogNotifier;
use crate::adapters::memory::{CollectingWorkflowStarter, MemoryStore};
use crate::batch::{JobReport, Outcome};
use crate::cassette::config::CassetteConfig;
use crate::cassette::session::{RecordingSession, RECORD_ENV};
use crate::cli::{Cli, Command, SourceArgs};
use crate::config::PmfConfig;
use crate::context::ServiceContext;
use crate::redline::LockMode;

/// Dispatch a parsed command line to its handler.
///
/// When `PMF_ARTWORK_RECORD` is set to a directory path, all port
/// interactions are recorded to per-port cassette files under it.
///
/// # Errors
///
/// Returns an error string if the configuration is invalid, the adapters
/// cannot be set up, or the selected command fails.
pub fn dispatch(cli: &Cli) -> Result<(), String> {
    let config = PmfConfig::load(cli.source.config.as_deref()).map_err(|e| e.to_string())?;
    let ctx = context_for(&cli.source, &config)?;

    let (ctx, session) = match env::var(RECORD_ENV) {
        Ok(path) => {
            let session = RecordingSession::under(Path::new(&path))?;
            (ServiceContext::recording(ctx, &session), Some(session))
        }
        Err(_) => (ctx, None),
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start async runtime: {e}"))?;
    let result = runtime.block_on(dispatch_with_context(&cli.command, &ctx, &config));

    // Finish recording after command completes (even on error)
    if let Some(session) = session {
        // Drop context first to release Arc references
        drop(ctx);
        finish_recording(session)?;
    }

    result
}

/// Dispatch a command with the given service context.
///
/// # Errors
///
/// Returns an error string if the command fails or any of its items failed.
pub async fn dispatch_with_context(
    command: &Command,
    ctx: &ServiceContext,
    config: &PmfConfig,
) -> Result<(), String> {
    match command {
        Command::Reconcile { pmf } => reconcile::run(ctx, config, pmf).await,
        Command::AttachRedline { link } => attach_redline::run(ctx, config, link).await,
        Command::LockRedlines { pmf } => lock::run(ctx, config, pmf, LockMode::Lock).await,
        Command::UnlockRedlines { pmf } => lock::run(ctx, config, pmf, LockMode::Unlock).await,
        Command::CheckConfig => check_config::run(ctx, config).await,
    }
}

/// Builds the context selected by the source options: a fixture-seeded
/// dry run, a cassette replay, or the live vault.
fn context_for(source: &SourceArgs, config: &PmfConfig) -> Result<ServiceContext, String> {
    if let Some(fixture) = &source.fixture {
        let store = MemoryStore::load_fixture(fixture)?;
        return Ok(ServiceContext::new(
            Box::new(store),
            Box::new(LogNotifier),
            Box::new(CollectingWorkflowStarter::new()),
        ));
    }
    if let Some(dir) = &source.replay {
        return ServiceContext::replaying_from(&CassetteConfig::in_dir(dir));
    }
    ServiceContext::live(config)
}

/// Prints every outcome of a job run and turns failed items into an error.
fn finish_report<O: Outcome + Display>(report: &JobReport<O>) -> Result<(), String> {
    for outcome in &report.outcomes {
        println!("{outcome}");
        for warning in outcome.warnings() {
            println!("  warning: {warning}");
        }
    }
    println!("{report}");

    if report.all_succeeded() {
        Ok(())
    } else {
        Err(format!("{} of {} item(s) failed", report.failed_count(), report.len()))
    }
}

/// Finish a recording session and print the output directory.
fn finish_recording(session: RecordingSession) -> Result<(), String> {
    let output_dir = session.finish()?;
    eprintln!("Recording saved to: {}", output_dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Item(Option<&'static str>);

    impl Outcome for Item {
        fn label(&self) -> String {
            "item".into()
        }

        fn failure(&self) -> Option<String> {
            self.0.map(String::from)
        }
    }

    impl Display for Item {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("item")
        }
    }

    #[test]
    fn report_with_failures_is_an_error() {
        let report =
            JobReport { job: "job".into(), outcomes: vec![Item(None), Item(Some("boom"))] };
        assert_eq!(finish_report(&report), Err("1 of 2 item(s) failed".to_string()));

        let report = JobReport { job: "job".into(), outcomes: vec![Item(None)] };
        assert!(finish_report(&report).is_ok());
    }

    #[test]
    fn missing_fixture_is_reported() {
        let source =
            SourceArgs { fixture: Some("does/not/exist.yaml".into()), ..SourceArgs::default() };
        let err = context_for(&source, &PmfConfig::default()).err().unwrap();
        assert!(err.contains("Failed to read fixture"));
    }
}
