//! Recording adapter for the `RecordStore` port.

use serde_json::json;

use super::record_result;
use crate::cassette::session::SharedRecorder;
use crate::cassette::STORE_PORT;
use crate::ports::{FileSource, PortFuture, RecordStore, SaveResult};
use crate::query::Query;
use crate::record::{Fields, Row};
use crate::version::VersionId;

/// Records store calls while delegating to an inner store.
pub struct RecordingStore {
    inner: Box<dyn RecordStore>,
    recorder: SharedRecorder,
}

impl RecordingStore {
    /// Wraps `inner`, recording into `recorder`.
    pub fn new(inner: Box<dyn RecordStore>, recorder: SharedRecorder) -> Self {
        Self { inner, recorder }
    }
}

impl RecordStore for RecordingStore {
    fn query<'a>(&'a self, query: &'a Query) -> PortFuture<'a, Vec<Row>> {
        Box::pin(async move {
            let result = self.inner.query(query).await;
            let input = json!({ "vql": query.to_vql() });
            record_result(&self.recorder, STORE_PORT, "query", &input, &result);
            result
        })
    }

    fn create_version<'a>(
        &'a self,
        document_id: &'a str,
        fields: &'a Fields,
        source: &'a FileSource,
    ) -> PortFuture<'a, SaveResult> {
        Box::pin(async move {
            let result = self.inner.create_version(document_id, fields, source).await;
            let input = json!({ "document_id": document_id, "fields": fields, "source": source });
            record_result(&self.recorder, STORE_PORT, "create_version", &input, &result);
            result
        })
    }

    fn update_version<'a>(
        &'a self,
        document_id: &'a str,
        fields: &'a Fields,
    ) -> PortFuture<'a, SaveResult> {
        Box::pin(async move {
            let result = self.inner.update_version(document_id, fields).await;
            let input = json!({ "document_id": document_id, "fields": fields });
            record_result(&self.recorder, STORE_PORT, "update_version", &input, &result);
            result
        })
    }

    fn create_document<'a>(
        &'a self,
        fields: &'a Fields,
        source: &'a FileSource,
    ) -> PortFuture<'a, SaveResult> {
        Box::pin(async move {
            let result = self.inner.create_document(fields, source).await;
            let input = json!({ "fields": fields, "source": source });
            record_result(&self.recorder, STORE_PORT, "create_document", &input, &result);
            result
        })
    }

    fn create_record<'a>(&'a self, object: &'a str, fields: &'a Fields) -> PortFuture<'a, String> {
        Box::pin(async move {
            let result = self.inner.create_record(object, fields).await;
            let input = json!({ "object": object, "fields": fields });
            record_result(&self.recorder, STORE_PORT, "create_record", &input, &result);
            result
        })
    }

    fn grant_roles<'a>(
        &'a self,
        version: &'a VersionId,
        roles: &'a [String],
        group: &'a str,
    ) -> PortFuture<'a, ()> {
        Box::pin(async move {
            let result = self.inner.grant_roles(version, roles, group).await;
            let input = json!({ "version": version, "roles": roles, "group": group });
            record_result(&self.recorder, STORE_PORT, "grant_roles", &input, &result);
            result
        })
    }

    fn user_action<'a>(&'a self, version: &'a VersionId, action: &'a str) -> PortFuture<'a, ()> {
        Box::pin(async move {
            let result = self.inner.user_action(version, action).await;
            let input = json!({ "version": version, "action": action });
            record_result(&self.recorder, STORE_PORT, "user_action", &input, &result);
            result
        })
    }
}
