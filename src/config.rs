//! Run configuration.
//!
//! Loaded once per run from `pmf-artwork.yaml` (or the file named by
//! `--config` / `PMF_ARTWORK_CONFIG`), then overlaid with credentials from
//! the environment and validated before any item is touched.

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ReconcileError, ReconcileResult};

/// Config file looked up in the working directory when none is named.
pub const DEFAULT_CONFIG_FILE: &str = "pmf-artwork.yaml";

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "PMF_ARTWORK_CONFIG";

/// Top-level run configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PmfConfig {
    /// Key of the parameter set holding the artwork field list.
    #[serde(default = "default_parameter_set")]
    pub parameter_set: String,
    /// Vault connection.
    #[serde(default)]
    pub vault: VaultConfig,
    /// Lifecycle state and action names.
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
    /// Redline companion documents.
    #[serde(default)]
    pub redline: RedlineConfig,
    /// Draft-review workflow.
    #[serde(default)]
    pub workflow: WorkflowConfig,
}

/// Vault connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Vault host name, used for API calls and document links.
    #[serde(default)]
    pub domain: String,
    /// REST API version segment, e.g. `v24.1`.
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Session id sent in the `Authorization` header.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Webhook receiving failure notifications as JSON. Logged when unset.
    #[serde(default)]
    pub notify_webhook: Option<String>,
}

/// Lifecycle state and user action names (API names, not labels).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Approved for distribution.
    #[serde(default = "default_approved")]
    pub approved: String,
    /// Draft.
    #[serde(default = "default_draft")]
    pub draft: String,
    /// Locked state of redline documents.
    #[serde(default = "default_locked")]
    pub redline_locked: String,
    /// User action moving a redline document to locked.
    #[serde(default = "default_lock_action")]
    pub lock_action: String,
    /// User action reopening a locked redline document.
    #[serde(default = "default_unlock_action")]
    pub unlock_action: String,
}

/// Redline companion document settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedlineConfig {
    /// Document type label, used both to create and to find companions.
    #[serde(default = "default_redline_label")]
    pub type_label: String,
    /// Lifecycle label used when creating companions.
    #[serde(default = "default_redline_label")]
    pub lifecycle_label: String,
    /// Rendition of the artwork copied as the companion's source file.
    #[serde(default = "default_rendition")]
    pub rendition: String,
    /// Group granted access to companions.
    #[serde(default = "default_reviewer_group")]
    pub reviewer_group: String,
    /// Roles granted to the group.
    #[serde(default = "default_roles")]
    pub roles: Vec<String>,
    /// Prefix of the companion document name.
    #[serde(default = "default_name_prefix")]
    pub name_prefix: String,
    /// Maximum companion name length, in characters.
    #[serde(default = "default_name_max_len")]
    pub name_max_len: usize,
    /// Create a missing companion during reconciliation instead of leaving
    /// the annotation link unset.
    #[serde(default = "default_true")]
    pub ensure_on_reconcile: bool,
}

/// Draft-review workflow settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Workflow started on each new draft.
    #[serde(default = "default_workflow_template")]
    pub template: String,
    /// Description passed to the workflow.
    #[serde(default = "default_workflow_description")]
    pub description: String,
}

fn default_parameter_set() -> String {
    "pmf".to_string()
}

fn default_api_version() -> String {
    "v24.1".to_string()
}

fn default_approved() -> String {
    "approved_for_distribution__c".to_string()
}

fn default_draft() -> String {
    "draft__c".to_string()
}

fn default_locked() -> String {
    "locked__c".to_string()
}

fn default_lock_action() -> String {
    "lock__c".to_string()
}

fn default_unlock_action() -> String {
    "open__c".to_string()
}

fn default_redline_label() -> String {
    "PMF Redline Artwork".to_string()
}

fn default_rendition() -> String {
    "viewable_rendition__v".to_string()
}

fn default_reviewer_group() -> String {
    "all_internal_users__v".to_string()
}

fn default_roles() -> Vec<String> {
    vec!["reviewer__v".to_string(), "viewer__v".to_string()]
}

fn default_name_prefix() -> String {
    "Redline: ".to_string()
}

fn default_name_max_len() -> usize {
    100
}

fn default_true() -> bool {
    true
}

fn default_workflow_template() -> String {
    "pmf_draft__c".to_string()
}

fn default_workflow_description() -> String {
    "PMF Draft".to_string()
}

impl Default for PmfConfig {
    fn default() -> Self {
        Self {
            parameter_set: default_parameter_set(),
            vault: VaultConfig::default(),
            lifecycle: LifecycleConfig::default(),
            redline: RedlineConfig::default(),
            workflow: WorkflowConfig::default(),
        }
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            domain: String::new(),
            api_version: default_api_version(),
            session_id: None,
            notify_webhook: None,
        }
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            approved: default_approved(),
            draft: default_draft(),
            redline_locked: default_locked(),
            lock_action: default_lock_action(),
            unlock_action: default_unlock_action(),
        }
    }
}

impl Default for RedlineConfig {
    fn default() -> Self {
        Self {
            type_label: default_redline_label(),
            lifecycle_label: default_redline_label(),
            rendition: default_rendition(),
            reviewer_group: default_reviewer_group(),
            roles: default_roles(),
            name_prefix: default_name_prefix(),
            name_max_len: default_name_max_len(),
            ensure_on_reconcile: true,
        }
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            template: default_workflow_template(),
            description: default_workflow_description(),
        }
    }
}

impl PmfConfig {
    /// Loads, overlays environment credentials and validates the configuration.
    ///
    /// Resolution order for the file: `path`, then `PMF_ARTWORK_CONFIG`, then
    /// `pmf-artwork.yaml` in the working directory. With none of them present
    /// the defaults are used.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Config`] if a named file cannot be read or
    /// parsed, or the result fails validation.
    pub fn load(path: Option<&Path>) -> ReconcileResult<Self> {
        let named = path
            .map(Path::to_path_buf)
            .or_else(|| env::var(CONFIG_ENV).ok().map(PathBuf::from));

        let mut config = match named {
            Some(path) => Self::from_file(&path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        config.apply_env(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Reads a YAML config file without validating it.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Config`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> ReconcileResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ReconcileError::Config {
            message: format!("failed to read {}: {e}", path.display()),
        })?;
        let config = serde_yaml::from_str(&content).map_err(|e| ReconcileError::Config {
            message: format!("failed to parse {}: {e}", path.display()),
        })?;
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Overlays `VAULT_DOMAIN`, `VAULT_SESSION_ID`, `VAULT_API_VERSION` and
    /// `PMF_NOTIFY_WEBHOOK` from `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(domain) = lookup("VAULT_DOMAIN") {
            self.vault.domain = domain;
        }
        if let Some(session) = lookup("VAULT_SESSION_ID") {
            self.vault.session_id = Some(session);
        }
        if let Some(version) = lookup("VAULT_API_VERSION") {
            self.vault.api_version = version;
        }
        if let Some(webhook) = lookup("PMF_NOTIFY_WEBHOOK") {
            self.vault.notify_webhook = Some(webhook);
        }
    }

    /// Checks the configuration for values that would make every item fail.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Config`] describing the first problem found.
    pub fn validate(&self) -> ReconcileResult<()> {
        let required = [
            ("parameter_set", &self.parameter_set),
            ("lifecycle.approved", &self.lifecycle.approved),
            ("lifecycle.draft", &self.lifecycle.draft),
            ("lifecycle.redline_locked", &self.lifecycle.redline_locked),
            ("lifecycle.lock_action", &self.lifecycle.lock_action),
            ("lifecycle.unlock_action", &self.lifecycle.unlock_action),
            ("redline.type_label", &self.redline.type_label),
            ("redline.rendition", &self.redline.rendition),
            ("workflow.template", &self.workflow.template),
        ];
        if let Some((key, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(config_error(format!("{key} must not be empty")));
        }

        if self.lifecycle.approved == self.lifecycle.draft {
            return Err(config_error("lifecycle.approved and lifecycle.draft must differ"));
        }

        let prefix_len = self.redline.name_prefix.chars().count();
        if self.redline.name_max_len <= prefix_len + 3 {
            return Err(config_error(format!(
                "redline.name_max_len ({}) leaves no room after the name prefix",
                self.redline.name_max_len
            )));
        }
        Ok(())
    }

    /// Checks that the settings needed to talk to a real vault are present.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Config`] if the domain or session id is missing.
    pub fn require_live(&self) -> ReconcileResult<()> {
        if self.vault.domain.trim().is_empty() {
            return Err(config_error("vault.domain is not set (or VAULT_DOMAIN)"));
        }
        if self.vault.session_id.as_deref().filter(|s| !s.trim().is_empty()).is_none() {
            return Err(config_error("vault.session_id is not set (or VAULT_SESSION_ID)"));
        }
        Ok(())
    }
}

fn config_error(message: impl Into<String>) -> ReconcileError {
    ReconcileError::Config { message: message.into() }
}
