//! Per-port cassette selection for replay.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::format::Cassette;
use super::replayer::CassetteReplayer;
use super::{NOTIFIER_PORT, STORE_PORT, WORKFLOW_PORT};

/// A replayer shared between adapters.
pub type SharedReplayer = Arc<Mutex<CassetteReplayer>>;

/// Cassette file per port. A port without a file panics when called
/// during replay.
#[derive(Debug, Clone, Default)]
pub struct CassetteConfig {
    /// Record store cassette.
    pub store: Option<PathBuf>,
    /// Notifier cassette.
    pub notifier: Option<PathBuf>,
    /// Workflow starter cassette.
    pub workflow: Option<PathBuf>,
}

/// Loaded replayers, one per configured port.
pub struct PortReplayers {
    /// Record store replayer.
    pub store: Option<SharedReplayer>,
    /// Notifier replayer.
    pub notifier: Option<SharedReplayer>,
    /// Workflow starter replayer.
    pub workflow: Option<SharedReplayer>,
}

/// File name a recording session uses for a port's cassette.
#[must_use]
pub fn cassette_file_name(port: &str) -> String {
    format!("{port}.cassette.yaml")
}

impl CassetteConfig {
    /// A config with no cassettes; every port panics when called.
    #[must_use]
    pub fn panic_on_unspecified() -> Self {
        Self::default()
    }

    /// Picks up the per-port cassettes a recording session left in `dir`.
    /// Ports whose file is absent stay unconfigured.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        let existing = |port: &str| {
            let path = dir.join(cassette_file_name(port));
            path.exists().then_some(path)
        };
        Self {
            store: existing(STORE_PORT),
            notifier: existing(NOTIFIER_PORT),
            workflow: existing(WORKFLOW_PORT),
        }
    }

    /// Loads one cassette file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_cassette(path: &Path) -> Result<Cassette, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read cassette file {}: {e}", path.display()))?;
        serde_yaml::from_str(&content)
            .map_err(|e| format!("Failed to parse cassette file {}: {e}", path.display()))
    }

    /// Loads a cassette file into a shareable replayer.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_replayer(path: &Path) -> Result<SharedReplayer, String> {
        let cassette = Self::load_cassette(path)?;
        Ok(Arc::new(Mutex::new(CassetteReplayer::new(&cassette))))
    }

    /// Loads every configured cassette.
    ///
    /// # Errors
    ///
    /// Returns an error if any configured file cannot be read or parsed.
    pub fn load_all(&self) -> Result<PortReplayers, String> {
        Ok(PortReplayers {
            store: self.store.as_deref().map(Self::load_replayer).transpose()?,
            notifier: self.notifier.as_deref().map(Self::load_replayer).transpose()?,
            workflow: self.workflow.as_deref().map(Self::load_replayer).transpose()?,
        })
    }
}
