//! Record and document store port.

use serde::{Deserialize, Serialize};

use super::PortFuture;
use crate::query::Query;
use crate::record::{Fields, Row};
use crate::version::VersionId;

/// Where the source file of a new document or version comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileSource {
    /// Copy the source file of an existing version.
    Version(VersionId),
    /// Copy a rendition of an existing version.
    Rendition {
        /// Version whose rendition is copied.
        version: VersionId,
        /// Rendition type, e.g. `viewable_rendition__v`.
        rendition: String,
    },
}

/// Outcome of a document save.
///
/// The vault reports partial results instead of failing the call, so a
/// save can return without error yet have saved nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResult {
    /// Versions that were written.
    pub successes: Vec<VersionId>,
    /// Messages for rejected writes.
    pub errors: Vec<String>,
}

impl SaveResult {
    /// A single successful save.
    #[must_use]
    pub fn saved(version: VersionId) -> Self {
        Self { successes: vec![version], errors: Vec::new() }
    }

    /// A single rejected save.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self { successes: Vec::new(), errors: vec![message.into()] }
    }

    /// The first saved version, if any.
    #[must_use]
    pub fn first_success(&self) -> Option<&VersionId> {
        self.successes.first()
    }

    /// All rejection messages joined, or `None` when there were none.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        (!self.errors.is_empty()).then(|| self.errors.join("; "))
    }
}

/// Reads and writes vault records and document versions.
///
/// Abstracting the vault lets the reconciliation engine run against an
/// in-memory store, a live vault, or a replayed cassette.
pub trait RecordStore: Send + Sync {
    /// Runs a query and returns its rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the vault rejects the query.
    fn query<'a>(&'a self, query: &'a Query) -> PortFuture<'a, Vec<Row>>;

    /// Creates a new version of `document_id` with the given fields.
    ///
    /// The version number is taken from the major/minor fields in `fields`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails outright.
    fn create_version<'a>(
        &'a self,
        document_id: &'a str,
        fields: &'a Fields,
        source: &'a FileSource,
    ) -> PortFuture<'a, SaveResult>;

    /// Updates fields on the head version of `document_id` without versioning.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails outright.
    fn update_version<'a>(
        &'a self,
        document_id: &'a str,
        fields: &'a Fields,
    ) -> PortFuture<'a, SaveResult>;

    /// Creates a new document.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails outright.
    fn create_document<'a>(
        &'a self,
        fields: &'a Fields,
        source: &'a FileSource,
    ) -> PortFuture<'a, SaveResult>;

    /// Creates an object record and returns its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the vault rejects the record.
    fn create_record<'a>(&'a self, object: &'a str, fields: &'a Fields) -> PortFuture<'a, String>;

    /// Grants `roles` on a document version to `group`.
    ///
    /// # Errors
    ///
    /// Returns an error if the vault rejects the grant.
    fn grant_roles<'a>(
        &'a self,
        version: &'a VersionId,
        roles: &'a [String],
        group: &'a str,
    ) -> PortFuture<'a, ()>;

    /// Runs a lifecycle user action on a document version.
    ///
    /// # Errors
    ///
    /// Returns an error if the action is not available or fails.
    fn user_action<'a>(&'a self, version: &'a VersionId, action: &'a str) -> PortFuture<'a, ()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_result_reports_errors() {
        let ok = SaveResult::saved(VersionId::new("D1", 2, 1));
        assert_eq!(ok.first_success(), Some(&VersionId::new("D1", 2, 1)));
        assert_eq!(ok.error_message(), None);

        let mut failed = SaveResult::rejected("INVALID_DATA: barcode");
        failed.errors.push("PARAMETER_REQUIRED: product".into());
        assert!(failed.first_success().is_none());
        assert_eq!(
            failed.error_message().as_deref(),
            Some("INVALID_DATA: barcode; PARAMETER_REQUIRED: product")
        );
    }

    #[test]
    fn file_source_serializes_with_tag() {
        let source = FileSource::Rendition {
            version: VersionId::new("D1", 2, 0),
            rendition: "viewable_rendition__v".into(),
        };
        let json = serde_json::to_value(&source).unwrap();
        assert_eq!(json["rendition"]["version"], "D1_2_0");
        let back: FileSource = serde_json::from_value(json).unwrap();
        assert_eq!(back, source);
    }
}
