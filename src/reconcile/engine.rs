//! The reconciliation engine: observe, classify, act.

use std::collections::BTreeMap;

use tracing::{debug, error, info, warn};

use super::classify::{classify, Action, ArtworkState};
use super::link::ArtworkLink;
use super::notice::{FailureNotice, FailureReason};
use super::outcome::{ItemOutcome, Resolution};
use crate::config::PmfConfig;
use crate::context::ServiceContext;
use crate::error::{ReconcileError, ReconcileResult};
use crate::names::{doc, pmf, versioned_artwork, workflow};
use crate::ports::{FileSource, WorkflowRequest};
use crate::query::{Param, Query};
use crate::record::{FieldValue, Fields, Row};
use crate::redline::RedlineManager;
use crate::schema::{FieldCopy, FieldSchema, FieldSchemaResolver};
use crate::version::VersionId;

/// Reconciles artwork links of PMFs against the vault.
pub struct Reconciler<'a> {
    ctx: &'a ServiceContext,
    config: &'a PmfConfig,
    schema: FieldSchema,
}

impl<'a> Reconciler<'a> {
    /// Creates a reconciler with an already resolved field schema.
    #[must_use]
    pub fn new(ctx: &'a ServiceContext, config: &'a PmfConfig, schema: FieldSchema) -> Self {
        Self { ctx, config, schema }
    }

    /// Resolves the artwork field schema from the configured parameter set
    /// and creates a reconciler using it.
    ///
    /// # Errors
    ///
    /// Returns the resolver's error when the schema cannot be read or parsed.
    pub async fn prepare(ctx: &'a ServiceContext, config: &'a PmfConfig) -> ReconcileResult<Self> {
        let schema = FieldSchemaResolver::new(ctx).resolve(&config.parameter_set).await?;
        Ok(Self::new(ctx, config, schema))
    }

    /// The field schema copied onto new drafts.
    #[must_use]
    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    /// Reconciles one artwork link. Never fails: every error ends up in the outcome.
    pub async fn reconcile(&self, link: &ArtworkLink) -> ItemOutcome {
        let mut outcome = ItemOutcome {
            link_id: link.id.clone(),
            snapshot: link.snapshot.clone(),
            action: None,
            resolution: Ok(Resolution::Unchanged),
            warnings: Vec::new(),
        };

        let state = match self.observe(link).await {
            Ok(state) => state,
            Err(e) => {
                error!(
                    link = %link.id,
                    snapshot = %link.snapshot,
                    pmf = %link.pmf_id,
                    error = %e,
                    "Could not read artwork state"
                );
                outcome.resolution = Err(e);
                return outcome;
            }
        };

        let action = classify(&state, &self.config.lifecycle);
        info!(
            link = %link.id,
            snapshot = %state.snapshot,
            snapshot_state = %state.snapshot_state,
            current = %state.current,
            current_state = %state.current_state,
            current_pmf = state.current_pmf.as_deref().unwrap_or("none"),
            %action,
            "Classified artwork link"
        );
        outcome.action = Some(action);

        outcome.resolution = match action {
            Action::UpVersion => {
                self.up_version(link, &state.snapshot, &mut outcome.warnings).await
            }
            Action::Attach => self
                .attach(link, &state.snapshot, &mut outcome.warnings)
                .await
                .map(Resolution::Attached),
            Action::NoOp => {
                info!(snapshot = %state.snapshot, "Not processed due to current state");
                Ok(Resolution::Unchanged)
            }
        };

        match &outcome.resolution {
            Err(e) if e.is_user_caused() => {
                warn!(
                    link = %link.id,
                    snapshot = %link.snapshot,
                    pmf = %link.pmf_id,
                    error = %e,
                    "Artwork link not reconciled"
                );
            }
            Err(e) => {
                error!(
                    link = %link.id,
                    snapshot = %link.snapshot,
                    pmf = %link.pmf_id,
                    error = %e,
                    "Artwork link failed"
                );
            }
            Ok(_) => {}
        }
        outcome
    }

    /// Reads the snapshot state and the head version of the linked document.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::MalformedIdentifier`] for a bad snapshot id,
    /// [`ReconcileError::Query`] if a read fails, and
    /// [`ReconcileError::NotFound`] if either version is missing.
    pub async fn observe(&self, link: &ArtworkLink) -> ReconcileResult<ArtworkState> {
        let snapshot = link.snapshot_version()?;

        let head = self.head(&snapshot.document_id).await?;
        let current_text = head.text(doc::VERSION_ID).ok_or_else(|| ReconcileError::NotFound {
            what: format!("version id of document {}", snapshot.document_id),
        })?;
        let current = VersionId::parse(&current_text)?;

        let snapshot_query =
            Query::all_versions().select_name(doc::STATUS).where_eq(doc::VERSION_ID, &snapshot);
        let snapshot_state = self
            .query(&snapshot_query, || format!("reading state of {snapshot}"))
            .await?
            .first()
            .and_then(|row| row.text(doc::STATUS))
            .ok_or_else(|| ReconcileError::NotFound {
                what: format!("artwork version {snapshot}"),
            })?;

        Ok(ArtworkState {
            snapshot,
            snapshot_state,
            current,
            current_state: head.text(doc::STATUS).unwrap_or_default(),
            current_pmf: head.text(doc::PMF),
        })
    }

    async fn up_version(
        &self,
        link: &ArtworkLink,
        snapshot: &VersionId,
        warnings: &mut Vec<String>,
    ) -> ReconcileResult<Resolution> {
        let approved_query = Query::documents()
            .select(doc::VERSION_ID)
            .select_all(self.schema.field_names())
            .where_eq(doc::VERSION_ID, snapshot)
            .where_steady_state(doc::STATUS);
        let approved = self
            .query(&approved_query, || format!("re-reading approved version {snapshot}"))
            .await?
            .into_iter()
            .next();

        let Some(approved) = approved else {
            return self.resolve_stale(link, snapshot, warnings).await;
        };

        let next = snapshot.next_minor();
        let mut fields = Fields::new();
        fields.insert(doc::MAJOR.into(), FieldValue::Number(f64::from(next.major)));
        fields.insert(doc::MINOR.into(), FieldValue::Number(f64::from(next.minor)));
        fields.insert(doc::STATUS.into(), FieldValue::picklist(&self.config.lifecycle.draft));
        fields.insert(doc::PMF.into(), FieldValue::reference(&link.pmf_id));
        if let Some(url) = self.redline_url(link, warnings).await {
            fields.insert(doc::ANNOTATED_VERSION.into(), FieldValue::text(url));
        }

        match self.schema.copy_from(&approved)? {
            FieldCopy::Complete(copied) => fields.extend(copied),
            FieldCopy::MissingRequired(field) => {
                warn!(
                    %snapshot,
                    %field,
                    "Artwork has missing required fields and cannot be up-versioned"
                );
                self.notify_failure(link, snapshot, FailureReason::MissingRequiredFields, warnings)
                    .await;
                return Err(ReconcileError::MissingRequiredField {
                    field,
                    version_id: snapshot.to_string(),
                });
            }
        }

        info!(%snapshot, "Creating new draft version");
        let source = FileSource::Version(snapshot.clone());
        let created_version =
            self.ctx.store.create_version(&snapshot.document_id, &fields, &source).await;
        let saved = match created_version {
            Ok(saved) => saved,
            Err(e) => {
                let message = e.to_string();
                let reason = FailureReason::Unknown(Some(message.clone()));
                self.notify_failure(link, snapshot, reason, warnings).await;
                return Err(ReconcileError::rejected("Create draft version", message));
            }
        };
        let Some(created) = saved.first_success().cloned() else {
            let message = saved.error_message();
            warn!(
                %snapshot,
                reason = message.as_deref().unwrap_or("unknown"),
                "Failed to create new draft version"
            );
            let reason = FailureReason::Unknown(message.clone());
            self.notify_failure(link, snapshot, reason, warnings).await;
            return Err(ReconcileError::StoreWriteRejected {
                operation: "Create draft version".to_string(),
                message: message.unwrap_or_else(|| "no version was saved".to_string()),
            });
        };

        self.record_after_write(&link.pmf_id, snapshot, &created, warnings).await;
        self.start_draft_workflow(snapshot, warnings).await;
        info!(%snapshot, new_version = %created, "Created new draft version");
        Ok(Resolution::Created(created))
    }

    /// The snapshot is no longer the approved head. Adopt an unclaimed head,
    /// or leave a head that already belongs to a PMF.
    async fn resolve_stale(
        &self,
        link: &ArtworkLink,
        snapshot: &VersionId,
        warnings: &mut Vec<String>,
    ) -> ReconcileResult<Resolution> {
        let stale = ReconcileError::StaleSnapshot { version_id: snapshot.to_string() };
        warnings.push(stale.to_string());

        let head = self.head(&snapshot.document_id).await?;
        if let Some(owner_pmf) = head.text(doc::PMF) {
            info!(%snapshot, pmf = %owner_pmf, "A new draft version already exists");
            return Ok(Resolution::AlreadyHandled);
        }

        let attached = self.attach(link, snapshot, warnings).await?;
        warn!(%snapshot, head = %attached, "New version referencing this PMF was not found");
        self.notify_failure(link, snapshot, FailureReason::DraftMayExist, warnings).await;
        Ok(Resolution::Attached(attached))
    }

    /// Points the head version at the PMF without creating a version.
    async fn attach(
        &self,
        link: &ArtworkLink,
        snapshot: &VersionId,
        warnings: &mut Vec<String>,
    ) -> ReconcileResult<VersionId> {
        let document_id = &snapshot.document_id;
        let mut fields = Fields::new();
        fields.insert(doc::PMF.into(), FieldValue::reference(&link.pmf_id));
        if let Some(url) = self.redline_url(link, warnings).await {
            fields.insert(doc::ANNOTATED_VERSION.into(), FieldValue::text(url));
        }

        let saved = self
            .ctx
            .store
            .update_version(document_id, &fields)
            .await
            .map_err(|e| ReconcileError::rejected("Attach PMF to artwork", e))?;
        if let Some(message) = saved.error_message() {
            return Err(ReconcileError::StoreWriteRejected {
                operation: "Attach PMF to artwork".to_string(),
                message,
            });
        }

        let head = match saved.first_success() {
            Some(version) => version.clone(),
            None => {
                let head_id = self.head(document_id).await?.text(doc::VERSION_ID).ok_or_else(|| {
                    ReconcileError::NotFound {
                        what: format!("version id of document {document_id}"),
                    }
                })?;
                VersionId::parse(&head_id)?
            }
        };
        self.record_after_write(&link.pmf_id, snapshot, &head, warnings).await;
        info!(%snapshot, head = %head, pmf = %link.pmf_id, "Attached artwork version to PMF");
        Ok(head)
    }

    /// Records `version` once the document write has gone through. The
    /// version already carries the PMF at this point, so a failure is kept
    /// as a warning and the item carries on.
    async fn record_after_write(
        &self,
        pmf_id: &str,
        snapshot: &VersionId,
        version: &VersionId,
        warnings: &mut Vec<String>,
    ) {
        if let Err(e) = self.record_versioned_artwork(pmf_id, snapshot, version).await {
            warn!(
                %snapshot,
                %version,
                pmf = pmf_id,
                error = %e,
                "Versioned artwork record not created"
            );
            warnings.push(format!("Versioned artwork record not created for {version}: {e}"));
        }
    }

    /// Creates the `pmf_upversioned_artwork__c` record for `new_version`
    /// unless one exists. Returns whether a record was created.
    ///
    /// Check and create are separate calls, so two concurrent runs can both
    /// create a record.
    async fn record_versioned_artwork(
        &self,
        pmf_id: &str,
        snapshot: &VersionId,
        new_version: &VersionId,
    ) -> ReconcileResult<bool> {
        let existing_query = Query::object(versioned_artwork::OBJECT)
            .select(versioned_artwork::ID)
            .where_eq(versioned_artwork::NEW_VERSION, new_version);
        let existing = self
            .query(&existing_query, || {
                format!("checking versioned artwork records for {new_version}")
            })
            .await?;
        if !existing.is_empty() {
            debug!(%new_version, "Versioned artwork record already exists");
            return Ok(false);
        }

        // The snapshot is read because the new version may not be queryable yet.
        let document_number = self.snapshot_field(snapshot, doc::NUMBER).await?.unwrap_or_default();

        let mut fields = Fields::new();
        fields.insert(versioned_artwork::PMF.into(), FieldValue::text(pmf_id));
        fields.insert(
            versioned_artwork::NEW_VERSION.into(),
            FieldValue::text(new_version.to_string()),
        );
        fields.insert(versioned_artwork::DOCUMENT_NUMBER.into(), FieldValue::text(document_number));
        self.ctx
            .store
            .create_record(versioned_artwork::OBJECT, &fields)
            .await
            .map_err(|e| ReconcileError::rejected("Create versioned artwork record", e))?;
        debug!(%new_version, pmf = pmf_id, "Created versioned artwork record");
        Ok(true)
    }

    /// Vault UI link to the link's redline document. Lookup problems become
    /// warnings and leave the annotation link unset.
    async fn redline_url(&self, link: &ArtworkLink, warnings: &mut Vec<String>) -> Option<String> {
        let manager = RedlineManager::new(self.ctx, self.config);
        let found = match manager.find_for_link(&link.id).await {
            Ok(found) => found,
            Err(e) => {
                warn!(link = %link.id, error = %e, "Redline lookup failed");
                warnings.push(format!("Redline lookup failed: {e}"));
                return None;
            }
        };
        let redline = match found {
            Some(redline) => redline,
            None if self.config.redline.ensure_on_reconcile => match manager.attach(link).await {
                Ok(redline) => redline,
                Err(e) => {
                    warn!(link = %link.id, error = %e, "Could not attach redline document");
                    warnings.push(format!("Redline not attached: {e}"));
                    return None;
                }
            },
            None => {
                debug!(link = %link.id, "No redline document attached");
                return None;
            }
        };
        Some(redline.ui_url(&self.config.vault.domain))
    }

    /// Sends a failure notice to the PMF requestor. Delivery problems are
    /// logged and kept as warnings.
    async fn notify_failure(
        &self,
        link: &ArtworkLink,
        snapshot: &VersionId,
        reason: FailureReason,
        warnings: &mut Vec<String>,
    ) {
        let mut undelivered = |message: String| {
            warn!(%snapshot, pmf = %link.pmf_id, %message, "Failure notice not sent");
            warnings.push(format!("Failure notice not sent: {message}"));
        };

        let pmf_query = Query::object(pmf::OBJECT)
            .select(pmf::NAME)
            .select(pmf::REQUESTOR)
            .where_eq(pmf::ID, Param::id(&link.pmf_id));
        let pmf_rows = self.query(&pmf_query, || format!("reading PMF {}", link.pmf_id)).await;
        let pmf_row = match pmf_rows {
            Ok(rows) => rows.into_iter().next(),
            Err(e) => return undelivered(e.to_string()),
        };
        let Some(pmf_row) = pmf_row else {
            return undelivered(format!("PMF {} not found", link.pmf_id));
        };
        let Some(requestor) = pmf_row.text(pmf::REQUESTOR) else {
            return undelivered(format!("PMF {} has no requestor", link.pmf_id));
        };
        let document_number = match self.snapshot_field(snapshot, doc::NUMBER).await {
            Ok(number) => number.unwrap_or_else(|| snapshot.to_string()),
            Err(e) => return undelivered(e.to_string()),
        };

        let notice = FailureNotice {
            document_number,
            document_url: snapshot.ui_url(&self.config.vault.domain),
            pmf_name: pmf_row.text(pmf::NAME).unwrap_or_else(|| link.pmf_id.clone()),
            reason,
        };
        let notification = notice.to_notification(vec![requestor]);
        match self.ctx.notifier.notify(&notification).await {
            Ok(()) => info!(%snapshot, subject = %notification.subject, "Sent failure notice"),
            Err(e) => undelivered(e.to_string()),
        }
    }

    /// Starts the draft-review workflow for the document of `snapshot`.
    /// A failure is a warning: the new version already exists.
    async fn start_draft_workflow(&self, snapshot: &VersionId, warnings: &mut Vec<String>) {
        let owner = match self.snapshot_field(snapshot, doc::OWNER).await {
            Ok(Some(owner)) => owner,
            Ok(None) => {
                warn!(%snapshot, "Document has no owner, draft workflow not started");
                warnings.push(format!("Draft workflow not started: {snapshot} has no owner"));
                return;
            }
            Err(e) => {
                warn!(%snapshot, error = %e, "Draft workflow not started");
                warnings.push(format!("Draft workflow not started: {e}"));
                return;
            }
        };

        let request = WorkflowRequest {
            template: self.config.workflow.template.clone(),
            params: BTreeMap::from([
                (workflow::DOCUMENTS.to_string(), snapshot.document_id.clone()),
                (workflow::DOCUMENT_OWNER.to_string(), format!("user:{owner}")),
                (workflow::DESCRIPTION.to_string(), self.config.workflow.description.clone()),
            ]),
        };
        info!(
            document = %snapshot.document_id,
            template = %request.template,
            "Starting draft workflow"
        );
        if let Err(e) = self.ctx.workflow.start_workflow(&request).await {
            warn!(document = %snapshot.document_id, error = %e, "Draft workflow not started");
            warnings.push(format!("Draft workflow not started: {e}"));
        }
    }

    async fn head(&self, document_id: &str) -> ReconcileResult<Row> {
        let query = Query::documents()
            .select(doc::VERSION_ID)
            .select_name(doc::STATUS)
            .select(doc::PMF)
            .where_eq(doc::ID, Param::id(document_id));
        self.query(&query, || format!("reading head version of document {document_id}"))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ReconcileError::NotFound {
                what: format!("head version of document {document_id}"),
            })
    }

    async fn snapshot_field(
        &self,
        snapshot: &VersionId,
        field: &str,
    ) -> ReconcileResult<Option<String>> {
        let query = Query::all_versions().select(field).where_eq(doc::VERSION_ID, snapshot);
        let rows = self.query(&query, || format!("reading {field} of {snapshot}")).await?;
        Ok(rows.first().and_then(|row| row.text(field)))
    }

    async fn query(
        &self,
        query: &Query,
        context: impl FnOnce() -> String,
    ) -> ReconcileResult<Vec<Row>> {
        debug!(vql = %query, "Executing VQL query");
        self.ctx.store.query(query).await.map_err(|e| ReconcileError::query(context(), e))
    }
}
