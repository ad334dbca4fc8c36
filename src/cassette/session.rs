//! Recording session managing per-port cassette recorders.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::warn;

use super::config::cassette_file_name;
use super::recorder::CassetteRecorder;
use super::{NOTIFIER_PORT, STORE_PORT, WORKFLOW_PORT};

/// Environment variable naming the directory recordings are written under.
pub const RECORD_ENV: &str = "PMF_ARTWORK_RECORD";

/// A recorder shared between a recording adapter and its session.
pub type SharedRecorder = Arc<Mutex<CassetteRecorder>>;

/// One recorder per port, all writing into a timestamped directory.
pub struct RecordingSession {
    /// Record store interactions.
    pub store: SharedRecorder,
    /// Notifier interactions.
    pub notifier: SharedRecorder,
    /// Workflow starter interactions.
    pub workflow: SharedRecorder,
    output_dir: PathBuf,
}

impl RecordingSession {
    /// Starts a session in a new `<base>/<timestamp>/` directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory already exists or cannot be created.
    pub fn under(base: &Path) -> Result<Self, String> {
        let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%S").to_string();
        let output_dir = base.join(&timestamp);
        if output_dir.exists() {
            return Err(format!("Cassette directory already exists: {}", output_dir.display()));
        }
        Self::in_dir(output_dir, &timestamp)
    }

    /// Starts a session writing directly into `output_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn in_dir(output_dir: PathBuf, name: &str) -> Result<Self, String> {
        std::fs::create_dir_all(&output_dir)
            .map_err(|e| format!("Failed to create cassette directory: {e}"))?;

        let commit = commit_hash();
        let make_recorder = |port: &str| -> SharedRecorder {
            let path = output_dir.join(cassette_file_name(port));
            Arc::new(Mutex::new(CassetteRecorder::new(path, format!("{name}-{port}"), &commit)))
        };

        Ok(Self {
            store: make_recorder(STORE_PORT),
            notifier: make_recorder(NOTIFIER_PORT),
            workflow: make_recorder(WORKFLOW_PORT),
            output_dir,
        })
    }

    /// Directory the cassettes are written to.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Writes every port's cassette.
    ///
    /// The recording adapters must have been dropped first.
    ///
    /// # Errors
    ///
    /// Returns an error if an adapter still holds its recorder or a file
    /// cannot be written.
    pub fn finish(self) -> Result<PathBuf, String> {
        fn finish_one(arc: SharedRecorder, port: &str) -> Result<(), String> {
            let recorder = Arc::try_unwrap(arc)
                .map_err(|_| format!("Recording adapter for {port} still has references"))?
                .into_inner()
                .map_err(|e| format!("Recorder lock for {port} poisoned: {e}"))?;
            recorder.finish().map_err(|e| format!("Failed to write {port} cassette: {e}"))?;
            Ok(())
        }

        finish_one(self.store, STORE_PORT)?;
        finish_one(self.notifier, NOTIFIER_PORT)?;
        finish_one(self.workflow, WORKFLOW_PORT)?;
        Ok(self.output_dir)
    }
}

/// The current git commit, or `unknown` when git is unavailable.
fn commit_hash() -> String {
    let hash = std::process::Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string());

    hash.unwrap_or_else(|| {
        warn!("Could not get git commit hash, using 'unknown'");
        "unknown".to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::config::CassetteConfig;
    use serde_json::json;

    #[test]
    fn session_writes_one_cassette_per_port() {
        let base = std::env::temp_dir().join("pmf_artwork_session_test");
        let _ = std::fs::remove_dir_all(&base);

        let session = RecordingSession::under(&base).unwrap();
        let dir = session.output_dir().to_path_buf();
        assert!(dir.starts_with(&base));
        session.store.lock().unwrap().record("store", "query", json!({}), json!({"Ok": []}));

        let written = session.finish().unwrap();
        assert_eq!(written, dir);
        let config = CassetteConfig::in_dir(&dir);
        assert!(config.store.is_some());
        assert!(config.notifier.is_some());
        assert!(config.workflow.is_some());

        let _ = std::fs::remove_dir_all(&base);
    }

    #[test]
    fn finish_fails_while_an_adapter_holds_a_recorder() {
        let dir = std::env::temp_dir().join("pmf_artwork_session_held");
        let _ = std::fs::remove_dir_all(&dir);
        let session = RecordingSession::in_dir(dir.clone(), "held").unwrap();
        let _held = Arc::clone(&session.store);
        let err = session.finish().unwrap_err();
        assert!(err.contains("still has references"));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
