//! Service context bundling all port trait objects.

use std::path::Path;

use crate::adapters::live::{
    LiveVaultStore, LiveWorkflowStarter, LogNotifier, VaultClient, WebhookNotifier,
};
use crate::adapters::memory::{CollectingNotifier, CollectingWorkflowStarter, MemoryStore};
use crate::adapters::recording::{RecordingNotifier, RecordingStore, RecordingWorkflowStarter};
use crate::adapters::replaying::{ReplayingNotifier, ReplayingStore, ReplayingWorkflowStarter};
use crate::cassette::config::CassetteConfig;
use crate::cassette::session::RecordingSession;
use crate::config::PmfConfig;
use crate::ports::{Notifier, RecordStore, WorkflowStarter};

/// Bundles all port trait objects into a single context.
///
/// Constructors wire up different adapter implementations (live,
/// in-memory, recording, replaying).
pub struct ServiceContext {
    /// Vault records and documents.
    pub store: Box<dyn RecordStore>,
    /// Notifications to vault users.
    pub notifier: Box<dyn Notifier>,
    /// Workflow kick-off.
    pub workflow: Box<dyn WorkflowStarter>,
}

impl ServiceContext {
    /// Bundles the given adapters.
    #[must_use]
    pub fn new(
        store: Box<dyn RecordStore>,
        notifier: Box<dyn Notifier>,
        workflow: Box<dyn WorkflowStarter>,
    ) -> Self {
        Self { store, notifier, workflow }
    }

    /// Creates a context talking to the configured vault.
    ///
    /// Notifications go to the configured webhook, or to the log when none is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the vault domain or session id is missing.
    pub fn live(config: &PmfConfig) -> Result<Self, String> {
        config.require_live().map_err(|e| e.to_string())?;
        let client = VaultClient::new(&config.vault)?;
        let notifier: Box<dyn Notifier> = match &config.vault.notify_webhook {
            Some(url) => Box::new(WebhookNotifier::new(url.clone())),
            None => Box::new(LogNotifier),
        };
        Ok(Self::new(
            Box::new(LiveVaultStore::new(client.clone())),
            notifier,
            Box::new(LiveWorkflowStarter::new(client)),
        ))
    }

    /// Creates a context over in-memory adapters. The caller keeps clones
    /// of the adapters to inspect what happened.
    #[must_use]
    pub fn in_memory(
        store: MemoryStore,
        notifier: CollectingNotifier,
        workflow: CollectingWorkflowStarter,
    ) -> Self {
        Self::new(Box::new(store), Box::new(notifier), Box::new(workflow))
    }

    /// Wraps every port of `inner` so its calls are recorded into `session`.
    #[must_use]
    pub fn recording(inner: Self, session: &RecordingSession) -> Self {
        Self {
            store: Box::new(RecordingStore::new(inner.store, session.store.clone())),
            notifier: Box::new(RecordingNotifier::new(inner.notifier, session.notifier.clone())),
            workflow: Box::new(RecordingWorkflowStarter::new(
                inner.workflow,
                session.workflow.clone(),
            )),
        }
    }

    /// Creates a replaying context from a single cassette holding every port.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be read or parsed.
    pub fn replaying(path: &Path) -> Result<Self, String> {
        let replayer = CassetteConfig::load_replayer(path)?;
        Ok(Self::new(
            Box::new(ReplayingStore::new(replayer.clone())),
            Box::new(ReplayingNotifier::new(replayer.clone())),
            Box::new(ReplayingWorkflowStarter::new(replayer)),
        ))
    }

    /// Creates a replaying context from per-port cassette files.
    ///
    /// Ports without a cassette panic with a clear message when called.
    ///
    /// # Errors
    ///
    /// Returns an error if any configured cassette cannot be read or parsed.
    pub fn replaying_from(config: &CassetteConfig) -> Result<Self, String> {
        let replayers = config.load_all()?;
        let store =
            replayers.store.map_or_else(ReplayingStore::unconfigured, ReplayingStore::new);
        let notifier =
            replayers.notifier.map_or_else(ReplayingNotifier::unconfigured, ReplayingNotifier::new);
        let workflow = replayers
            .workflow
            .map_or_else(ReplayingWorkflowStarter::unconfigured, ReplayingWorkflowStarter::new);
        Ok(Self::new(Box::new(store), Box::new(notifier), Box::new(workflow)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::recorder::CassetteRecorder;
    use crate::ports::Notification;
    use crate::query::Query;
    use serde_json::json;

    #[test]
    fn live_context_requires_credentials() {
        let err = ServiceContext::live(&PmfConfig::default()).err().unwrap();
        assert!(err.contains("vault.domain"));
    }

    #[tokio::test]
    async fn replaying_context_from_single_cassette() {
        let dir = std::env::temp_dir().join("pmf_artwork_ctx_mono");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("run.cassette.yaml");
        let mut recorder = CassetteRecorder::new(&path, "run", "abc");
        recorder.record("store", "query", json!({}), json!({"Ok": [{"id": "PMF-1"}]}));
        recorder.record("notifier", "notify", json!({}), json!({"Ok": null}));
        recorder.finish().unwrap();

        let ctx = ServiceContext::replaying(&path).unwrap();
        let rows = ctx.store.query(&Query::object("pmf__c").select("id")).await.unwrap();
        assert_eq!(rows[0].text("id").as_deref(), Some("PMF-1"));
        let notification =
            Notification { recipients: vec![], subject: "s".into(), html_body: String::new() };
        assert!(ctx.notifier.notify(&notification).await.is_ok());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    #[should_panic(expected = "not configured in CassetteConfig")]
    async fn unspecified_port_panics_with_clear_message() {
        let ctx = ServiceContext::replaying_from(&CassetteConfig::panic_on_unspecified()).unwrap();
        let _ = ctx.store.query(&Query::documents()).await;
    }
}
