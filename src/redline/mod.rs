//! Redline companion documents.
//!
//! Reviewers annotate a copy of each artwork instead of the artwork itself.
//! The copy is a separate document created from the artwork's viewable
//! rendition, linked to the PMF through a `pmf_redline_artwork_document__c`
//! record, and never deleted: selecting the same artwork again for the same
//! PMF reuses it.

mod lock;

pub use lock::{LockMode, LockOutcome, RedlineLockJob};

use tracing::{debug, info};

use crate::config::PmfConfig;
use crate::context::ServiceContext;
use crate::error::{ReconcileError, ReconcileResult};
use crate::names::{doc, pmf, redline_link};
use crate::ports::FileSource;
use crate::query::{Param, Query};
use crate::reconcile::ArtworkLink;
use crate::record::{FieldValue, Fields};
use crate::version::VersionId;

/// Creates, finds and attaches redline companion documents.
pub struct RedlineManager<'a> {
    ctx: &'a ServiceContext,
    config: &'a PmfConfig,
}

impl<'a> RedlineManager<'a> {
    /// Creates a manager working through `ctx`.
    #[must_use]
    pub fn new(ctx: &'a ServiceContext, config: &'a PmfConfig) -> Self {
        Self { ctx, config }
    }

    /// The companion recorded for an artwork link, if one was attached.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Query`] if the lookup fails and
    /// [`ReconcileError::MalformedIdentifier`] if the stored id is malformed.
    pub async fn find_for_link(&self, link_id: &str) -> ReconcileResult<Option<VersionId>> {
        let query = Query::object(redline_link::OBJECT)
            .select(redline_link::REDLINE_DOCUMENT)
            .where_eq(redline_link::ARTWORK_LINK_ID, link_id);
        let rows = self
            .ctx
            .store
            .query(&query)
            .await
            .map_err(|e| {
                ReconcileError::query(format!("looking up redline for link {link_id}"), e)
            })?;
        rows.first()
            .and_then(|row| row.text(redline_link::REDLINE_DOCUMENT))
            .map(|id| VersionId::parse(&id))
            .transpose()
    }

    /// An existing companion of `artwork` for `pmf_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Query`] if the lookup fails.
    pub async fn find_existing(
        &self,
        pmf_id: &str,
        artwork: &VersionId,
    ) -> ReconcileResult<Option<VersionId>> {
        let query = Query::documents()
            .select(doc::VERSION_ID)
            .where_eq(doc::TYPE, self.config.redline.type_label.as_str())
            .where_eq(doc::ARTWORK_VERSION_ID, artwork)
            .where_eq(doc::PMF, pmf_id);
        let rows = self
            .ctx
            .store
            .query(&query)
            .await
            .map_err(|e| ReconcileError::query(format!("looking for a redline of {artwork}"), e))?;
        rows.first()
            .and_then(|row| row.text(doc::VERSION_ID))
            .map(|id| VersionId::parse(&id))
            .transpose()
    }

    /// Returns the companion of `artwork` for `pmf_id`, creating it when
    /// none exists yet.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::NotFound`] if the artwork version does not
    /// exist and [`ReconcileError::StoreWriteRejected`] if the vault refuses
    /// the new document.
    pub async fn ensure_companion(
        &self,
        pmf_id: &str,
        artwork: &VersionId,
    ) -> ReconcileResult<VersionId> {
        if let Some(existing) = self.find_existing(pmf_id, artwork).await? {
            debug!(%artwork, redline = %existing, "Reusing redline document");
            return Ok(existing);
        }

        let artwork_query = Query::all_versions()
            .select(doc::NAME)
            .select(doc::NUMBER)
            .where_eq(doc::VERSION_ID, artwork);
        let artwork_row = self
            .ctx
            .store
            .query(&artwork_query)
            .await
            .map_err(|e| ReconcileError::query(format!("reading artwork {artwork}"), e))?
            .into_iter()
            .next()
            .ok_or_else(|| ReconcileError::NotFound {
                what: format!("artwork version {artwork}"),
            })?;
        let artwork_name = artwork_row.text(doc::NAME).unwrap_or_default();
        let document_number = artwork_row.text(doc::NUMBER).unwrap_or_default();

        let redline = &self.config.redline;
        let mut fields = Fields::new();
        fields.insert(doc::TYPE.into(), FieldValue::picklist(&redline.type_label));
        fields.insert(doc::LIFECYCLE.into(), FieldValue::picklist(&redline.lifecycle_label));
        let name = companion_name(&redline.name_prefix, &artwork_name, redline.name_max_len);
        fields.insert(doc::NAME.into(), FieldValue::text(name));
        fields.insert(doc::ARTWORK_VERSION_ID.into(), FieldValue::text(artwork.to_string()));
        fields.insert(doc::PMF.into(), FieldValue::reference(pmf_id));
        if let Some(requestor) = self.requestor(pmf_id).await? {
            fields.insert(doc::OWNER.into(), FieldValue::reference(requestor));
        }
        fields.insert(
            doc::TITLE.into(),
            FieldValue::text(format!(
                "This document was created by the System for the purpose of redlining \
                 artwork document {document_number}"
            )),
        );

        let source = FileSource::Rendition {
            version: artwork.clone(),
            rendition: redline.rendition.clone(),
        };
        let saved = self
            .ctx
            .store
            .create_document(&fields, &source)
            .await
            .map_err(|e| ReconcileError::rejected("Create redline document", e))?;
        let created = saved.first_success().cloned().ok_or_else(|| {
            ReconcileError::StoreWriteRejected {
                operation: "Create redline document".to_string(),
                message: saved
                    .error_message()
                    .unwrap_or_else(|| "no document was created".to_string()),
            }
        })?;
        info!(%artwork, redline = %created, pmf = pmf_id, "Created redline document");
        Ok(created)
    }

    /// Grants the configured roles on `redline` to the reviewer group.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::StoreWriteRejected`] if the grant fails.
    pub async fn grant_access(&self, redline: &VersionId) -> ReconcileResult<()> {
        let config = &self.config.redline;
        self.ctx
            .store
            .grant_roles(redline, &config.roles, &config.reviewer_group)
            .await
            .map_err(|e| ReconcileError::rejected("Grant redline roles", e))
    }

    /// Ensures the companion of `link`'s artwork, grants access to it, and
    /// records it against the link. Attaching an already attached link only
    /// re-grants access.
    ///
    /// # Errors
    ///
    /// Propagates lookup, creation and grant failures, and returns
    /// [`ReconcileError::StoreWriteRejected`] if the link record is refused.
    pub async fn attach(&self, link: &ArtworkLink) -> ReconcileResult<VersionId> {
        if let Some(existing) = self.find_for_link(&link.id).await? {
            self.grant_access(&existing).await?;
            debug!(link = %link.id, redline = %existing, "Redline already attached");
            return Ok(existing);
        }

        let artwork = link.snapshot_version()?;
        let redline = self.ensure_companion(&link.pmf_id, &artwork).await?;
        self.grant_access(&redline).await?;

        let mut fields = Fields::new();
        fields.insert(redline_link::PMF.into(), FieldValue::text(&link.pmf_id));
        fields.insert(redline_link::REDLINE_DOCUMENT.into(), FieldValue::text(redline.to_string()));
        fields.insert(redline_link::ARTWORK_LINK_ID.into(), FieldValue::text(&link.id));
        let optional = [
            (redline_link::ARTWORK_DOCUMENT_NUMBER, &link.document_number),
            (redline_link::BRAND, &link.brand),
            (redline_link::PACKAGING_TYPE, &link.packaging_type),
            (redline_link::PACKAGING_NUMBER, &link.packaging_number),
        ];
        for (field, value) in optional {
            if let Some(value) = value {
                fields.insert(field.into(), FieldValue::text(value));
            }
        }

        self.ctx
            .store
            .create_record(redline_link::OBJECT, &fields)
            .await
            .map_err(|e| ReconcileError::rejected("Attach redline document", e))?;
        info!(link = %link.id, redline = %redline, "Attached redline document");
        Ok(redline)
    }

    async fn requestor(&self, pmf_id: &str) -> ReconcileResult<Option<String>> {
        let query = Query::object(pmf::OBJECT)
            .select(pmf::REQUESTOR)
            .where_eq(pmf::ID, Param::id(pmf_id));
        let rows = self
            .ctx
            .store
            .query(&query)
            .await
            .map_err(|e| ReconcileError::query(format!("reading PMF {pmf_id}"), e))?;
        Ok(rows.first().and_then(|row| row.text(pmf::REQUESTOR)))
    }
}

/// `prefix` + `artwork_name`, cut to `max_len` characters with a trailing
/// `...` when longer.
#[must_use]
pub fn companion_name(prefix: &str, artwork_name: &str, max_len: usize) -> String {
    let name = format!("{prefix}{artwork_name}");
    if name.chars().count() <= max_len {
        return name;
    }
    let mut cut: String = name.chars().take(max_len.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_names_are_kept() {
        assert_eq!(companion_name("Redline: ", "Carton 12", 100), "Redline: Carton 12");
    }

    #[test]
    fn long_names_are_cut_to_the_limit() {
        let name = companion_name("Redline: ", &"x".repeat(120), 100);
        assert_eq!(name.chars().count(), 100);
        assert!(name.ends_with("..."));
        assert!(name.starts_with("Redline: xxx"));

        let exact = companion_name("Redline: ", &"x".repeat(91), 100);
        assert_eq!(exact.chars().count(), 100);
        assert!(!exact.ends_with("..."));
    }

    #[test]
    fn cutting_respects_character_boundaries() {
        let name = companion_name("Redline: ", &"é".repeat(120), 100);
        assert_eq!(name.chars().count(), 100);
        assert!(name.ends_with("é..."));
    }
}
