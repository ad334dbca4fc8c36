//! PMF artwork link records.

use serde::{Deserialize, Serialize};

use crate::error::{ReconcileError, ReconcileResult};
use crate::names::artwork_link;
use crate::query::Query;
use crate::record::Row;
use crate::version::VersionId;

/// A `pmf_artwork_document__c` record: one artwork selected for a PMF.
///
/// The snapshot version id is kept as text so that a malformed value fails
/// only the item that carries it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtworkLink {
    /// Record id.
    pub id: String,
    /// Owning PMF.
    pub pmf_id: String,
    /// Artwork version selected when the link was created.
    pub snapshot: String,
    /// Artwork document number.
    pub document_number: Option<String>,
    /// Brand display value.
    pub brand: Option<String>,
    /// Packaging type display value.
    pub packaging_type: Option<String>,
    /// Packaging number.
    pub packaging_number: Option<String>,
}

impl ArtworkLink {
    /// Query selecting every link of `pmf_id`.
    #[must_use]
    pub fn query_for_pmf(pmf_id: &str) -> Query {
        Self::select().where_eq(artwork_link::PMF, pmf_id)
    }

    /// Query selecting one link by id.
    #[must_use]
    pub fn query_by_id(link_id: &str) -> Query {
        Self::select().where_eq(artwork_link::ID, link_id)
    }

    fn select() -> Query {
        Query::object(artwork_link::OBJECT).select_all([
            artwork_link::ID,
            artwork_link::PMF,
            artwork_link::ARTWORK_DOCUMENT,
            artwork_link::DOCUMENT_NUMBER,
            artwork_link::BRAND,
            artwork_link::PACKAGING_TYPE,
            artwork_link::PACKAGING_NUMBER,
        ])
    }

    /// Reads a link from a query row.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::NotFound`] if the id, PMF or artwork
    /// version is missing.
    pub fn from_row(row: &Row) -> ReconcileResult<Self> {
        let required = |field: &str| {
            row.text(field).ok_or_else(|| ReconcileError::NotFound {
                what: format!("{field} on {} record", artwork_link::OBJECT),
            })
        };
        Ok(Self {
            id: required(artwork_link::ID)?,
            pmf_id: required(artwork_link::PMF)?,
            snapshot: required(artwork_link::ARTWORK_DOCUMENT)?,
            document_number: row.text(artwork_link::DOCUMENT_NUMBER),
            brand: row.text(artwork_link::BRAND),
            packaging_type: row.text(artwork_link::PACKAGING_TYPE),
            packaging_number: row.text(artwork_link::PACKAGING_NUMBER),
        })
    }

    /// The snapshot version, parsed.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::MalformedIdentifier`] if the stored id is malformed.
    pub fn snapshot_version(&self) -> ReconcileResult<VersionId> {
        VersionId::parse(&self.snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_link_rows() {
        let row = Row::new()
            .with("id", "L1")
            .with("pmf__c", "PMF-1")
            .with("artwork_document__c", "D1_2_0")
            .with("brand__c", json!(["Acme"]));
        let link = ArtworkLink::from_row(&row).unwrap();
        assert_eq!(link.pmf_id, "PMF-1");
        assert_eq!(link.brand.as_deref(), Some("Acme"));
        assert!(link.packaging_number.is_none());
        assert_eq!(link.snapshot_version().unwrap(), VersionId::new("D1", 2, 0));
    }

    #[test]
    fn missing_snapshot_is_not_found() {
        let row = Row::new().with("id", "L1").with("pmf__c", "PMF-1");
        assert!(matches!(ArtworkLink::from_row(&row), Err(ReconcileError::NotFound { .. })));
    }

    #[test]
    fn malformed_snapshot_fails_on_parse_only() {
        let row = Row::new()
            .with("id", "L1")
            .with("pmf__c", "PMF-1")
            .with("artwork_document__c", "D1");
        let link = ArtworkLink::from_row(&row).unwrap();
        assert!(matches!(link.snapshot_version(), Err(ReconcileError::MalformedIdentifier { .. })));
    }

    #[test]
    fn pmf_query_filters_on_pmf() {
        assert!(ArtworkLink::query_for_pmf("PMF-1").to_vql().ends_with("where pmf__c = 'PMF-1'"));
    }
}
