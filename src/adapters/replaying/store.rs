//! Replaying adapter for the `RecordStore` port.

use super::{next_output, replay_result};
use crate::cassette::config::SharedReplayer;
use crate::cassette::STORE_PORT;
use crate::ports::{FileSource, PortFuture, RecordStore, SaveResult};
use crate::query::Query;
use crate::record::{Fields, Row};
use crate::version::VersionId;

/// Serves recorded store results from a cassette.
pub struct ReplayingStore {
    replayer: Option<SharedReplayer>,
}

impl ReplayingStore {
    /// A store backed by the given replayer.
    #[must_use]
    pub fn new(replayer: SharedReplayer) -> Self {
        Self { replayer: Some(replayer) }
    }

    /// A store with no cassette. Panics when called.
    #[must_use]
    pub fn unconfigured() -> Self {
        Self { replayer: None }
    }

    fn replay<'a, T>(&self, method: &str) -> PortFuture<'a, T>
    where
        T: serde::de::DeserializeOwned + Send + 'a,
    {
        let output = next_output(self.replayer.as_ref(), STORE_PORT, method);
        Box::pin(std::future::ready(replay_result(output)))
    }
}

impl RecordStore for ReplayingStore {
    fn query<'a>(&'a self, _query: &'a Query) -> PortFuture<'a, Vec<Row>> {
        self.replay("query")
    }

    fn create_version<'a>(
        &'a self,
        _document_id: &'a str,
        _fields: &'a Fields,
        _source: &'a FileSource,
    ) -> PortFuture<'a, SaveResult> {
        self.replay("create_version")
    }

    fn update_version<'a>(
        &'a self,
        _document_id: &'a str,
        _fields: &'a Fields,
    ) -> PortFuture<'a, SaveResult> {
        self.replay("update_version")
    }

    fn create_document<'a>(
        &'a self,
        _fields: &'a Fields,
        _source: &'a FileSource,
    ) -> PortFuture<'a, SaveResult> {
        self.replay("create_document")
    }

    fn create_record<'a>(
        &'a self,
        _object: &'a str,
        _fields: &'a Fields,
    ) -> PortFuture<'a, String> {
        self.replay("create_record")
    }

    fn grant_roles<'a>(
        &'a self,
        _version: &'a VersionId,
        _roles: &'a [String],
        _group: &'a str,
    ) -> PortFuture<'a, ()> {
        self.replay("grant_roles")
    }

    fn user_action<'a>(&'a self, _version: &'a VersionId, _action: &'a str) -> PortFuture<'a, ()> {
        self.replay("user_action")
    }
}
