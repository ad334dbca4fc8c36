//! In-memory `RecordStore` used for dry runs and tests.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::names::doc;
use crate::ports::{FileSource, PortError, PortFuture, RecordStore, SaveResult};
use crate::query::{Predicate, Query, Source};
use crate::record::{FieldValue, Fields, Row};
use crate::version::VersionId;

/// How the store answers writes to a document configured to fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// The call itself fails with this message.
    Error(String),
    /// The call returns a save result carrying this error.
    Rejected(String),
    /// The call returns a save result with no successes and no errors.
    Empty,
}

/// A write applied to the store, in call order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOp {
    /// A new version was created.
    CreateVersion {
        /// Logical document id.
        document_id: String,
        /// The created version.
        version: VersionId,
    },
    /// The head version was updated in place.
    UpdateVersion {
        /// Updated version.
        version: VersionId,
        /// Names of the written fields.
        fields: Vec<String>,
    },
    /// A new document was created.
    CreateDocument {
        /// First version of the new document.
        version: VersionId,
    },
    /// An object record was created.
    CreateRecord {
        /// Object name.
        object: String,
        /// New record id.
        id: String,
    },
    /// Roles were granted on a version.
    GrantRoles {
        /// Target version.
        version: VersionId,
        /// Granted roles.
        roles: Vec<String>,
        /// Receiving group.
        group: String,
    },
    /// A lifecycle user action ran.
    UserAction {
        /// Target version.
        version: VersionId,
        /// Action name.
        action: String,
    },
}

/// One document and its versions in a fixture file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentFixture {
    /// Logical document id.
    pub id: String,
    /// Versions in any order. Each needs major and minor version numbers.
    pub versions: Vec<Row>,
}

/// YAML seed data for a [`MemoryStore`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreFixture {
    /// Lifecycle states matched by `steadystate()`. Defaults apply when absent.
    #[serde(default)]
    pub steady_states: Option<Vec<String>>,
    /// User action name to resulting state. Defaults apply when absent.
    #[serde(default)]
    pub actions: Option<BTreeMap<String, String>>,
    /// Documents.
    #[serde(default)]
    pub documents: Vec<DocumentFixture>,
    /// Object records by object name.
    #[serde(default)]
    pub objects: BTreeMap<String, Vec<Row>>,
}

#[derive(Debug)]
struct StoreState {
    documents: BTreeMap<String, Vec<Row>>,
    objects: BTreeMap<String, Vec<Row>>,
    steady_states: Vec<String>,
    actions: BTreeMap<String, String>,
    rejections: BTreeMap<String, Rejection>,
    failing_queries: Vec<(String, String)>,
    writes: Vec<WriteOp>,
    next_document: u64,
}

/// A vault stand-in holding documents and object records in memory.
///
/// Clones share the same state, so a test can keep a handle for
/// inspection while the engine owns another.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// An empty store where `approved_for_distribution__c` is the steady
    /// state and `lock__c` / `open__c` move documents to `locked__c` / `draft__c`.
    #[must_use]
    pub fn new() -> Self {
        let actions = [("lock__c", "locked__c"), ("open__c", "draft__c")]
            .into_iter()
            .map(|(a, s)| (a.to_string(), s.to_string()))
            .collect();
        Self {
            state: Arc::new(Mutex::new(StoreState {
                documents: BTreeMap::new(),
                objects: BTreeMap::new(),
                steady_states: vec!["approved_for_distribution__c".to_string()],
                actions,
                rejections: BTreeMap::new(),
                failing_queries: Vec::new(),
                writes: Vec::new(),
                next_document: 9001,
            })),
        }
    }

    /// Builds a store from fixture data.
    ///
    /// # Errors
    ///
    /// Returns an error if a document version lacks valid version numbers.
    pub fn from_fixture(fixture: StoreFixture) -> Result<Self, String> {
        let store = Self::new();
        {
            let mut state = store.state();
            if let Some(steady) = fixture.steady_states {
                state.steady_states = steady;
            }
            if let Some(actions) = fixture.actions {
                state.actions = actions;
            }
            state.objects = fixture.objects;
        }
        for document in fixture.documents {
            for row in document.versions {
                let major = number_field(&row, doc::MAJOR);
                let minor = number_field(&row, doc::MINOR);
                let (Some(major), Some(minor)) = (major, minor) else {
                    return Err(format!(
                        "fixture document {} has a version without {} and {}",
                        document.id,
                        doc::MAJOR,
                        doc::MINOR
                    ));
                };
                store.add_version(&document.id, major, minor, row);
            }
        }
        for records in store.state().objects.values_mut() {
            for record in records.iter_mut() {
                if record.text("id").is_none() {
                    record.set("id", Uuid::new_v4().to_string());
                }
            }
        }
        Ok(store)
    }

    /// Reads a YAML fixture file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_fixture(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read fixture {}: {e}", path.display()))?;
        let fixture: StoreFixture = serde_yaml::from_str(&content)
            .map_err(|e| format!("Failed to parse fixture {}: {e}", path.display()))?;
        Self::from_fixture(fixture)
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a document version, keeping versions ordered.
    pub fn add_version(
        &self,
        document_id: &str,
        major: u32,
        minor: u32,
        mut row: Row,
    ) -> VersionId {
        let version = VersionId::new(document_id, major, minor);
        stamp_version(&mut row, &version);
        let mut state = self.state();
        let versions = state.documents.entry(document_id.to_string()).or_default();
        versions.retain(|existing| version_of(existing).as_ref() != Some(&version));
        versions.push(row);
        versions.sort_by_key(version_of);
        version
    }

    /// Adds an object record and returns its id, assigning one if absent.
    pub fn add_record(&self, object: &str, mut row: Row) -> String {
        let id = row.text("id").unwrap_or_else(|| {
            let id = Uuid::new_v4().to_string();
            row.set("id", id.clone());
            id
        });
        self.state().objects.entry(object.to_string()).or_default().push(row);
        id
    }

    /// Makes writes to `document_id` (or record creation on object
    /// `document_id`) fail in the given way.
    pub fn reject_writes(&self, document_id: &str, rejection: Rejection) {
        self.state().rejections.insert(document_id.to_string(), rejection);
    }

    /// Makes queries whose VQL contains `fragment` fail with `message`.
    pub fn fail_queries(&self, fragment: &str, message: &str) {
        self.state().failing_queries.push((fragment.to_string(), message.to_string()));
    }

    /// All versions of a document, oldest first.
    #[must_use]
    pub fn versions(&self, document_id: &str) -> Vec<Row> {
        self.state().documents.get(document_id).cloned().unwrap_or_default()
    }

    /// The head version of a document.
    #[must_use]
    pub fn head(&self, document_id: &str) -> Option<Row> {
        self.state().documents.get(document_id).and_then(|v| v.last().cloned())
    }

    /// All records of an object.
    #[must_use]
    pub fn records(&self, object: &str) -> Vec<Row> {
        self.state().objects.get(object).cloned().unwrap_or_default()
    }

    /// Every write applied so far.
    #[must_use]
    pub fn writes(&self) -> Vec<WriteOp> {
        self.state().writes.clone()
    }

    fn run_query(&self, query: &Query) -> Result<Vec<Row>, PortError> {
        let vql = query.to_vql();
        let state = self.state();
        let failing = state.failing_queries.iter().find(|(f, _)| vql.contains(f.as_str()));
        if let Some((_, message)) = failing {
            return Err(message.clone().into());
        }

        let candidates: Vec<&Row> = match &query.source {
            Source::Documents => state.documents.values().filter_map(|v| v.last()).collect(),
            Source::AllVersions => state.documents.values().flatten().collect(),
            Source::Object(name) => {
                state.objects.get(name).map(|r| r.iter().collect()).unwrap_or_default()
            }
        };

        Ok(candidates
            .into_iter()
            .filter(|row| query.predicates.iter().all(|p| satisfies(row, p, &state.steady_states)))
            .map(|row| project(row, query))
            .collect())
    }

    fn check_rejection(&self, key: &str) -> Option<Result<SaveResult, PortError>> {
        match self.state().rejections.get(key)? {
            Rejection::Error(message) => Some(Err(message.clone().into())),
            Rejection::Rejected(message) => Some(Ok(SaveResult::rejected(message.clone()))),
            Rejection::Empty => Some(Ok(SaveResult::default())),
        }
    }

    fn do_create_version(
        &self,
        document_id: &str,
        fields: &Fields,
    ) -> Result<SaveResult, PortError> {
        if let Some(rejected) = self.check_rejection(document_id) {
            return rejected;
        }
        let head = self
            .head(document_id)
            .ok_or_else(|| format!("INVALID_DATA: document {document_id} not found"))?;
        let head_version =
            version_of(&head).ok_or("INVALID_DATA: head version has no version number")?;

        let major = fields.get(doc::MAJOR).and_then(field_number).unwrap_or(head_version.major);
        let minor = fields.get(doc::MINOR).and_then(field_number).unwrap_or(head_version.minor + 1);
        if (major, minor) <= (head_version.major, head_version.minor) {
            return Ok(SaveResult::rejected(format!(
                "OPERATION_NOT_ALLOWED: version {major}.{minor} of document {document_id} \
                 already exists"
            )));
        }

        let mut row = head;
        row.apply(fields);
        let version = self.add_version(document_id, major, minor, row);
        self.state().writes.push(WriteOp::CreateVersion {
            document_id: document_id.to_string(),
            version: version.clone(),
        });
        Ok(SaveResult::saved(version))
    }

    fn do_update_version(
        &self,
        document_id: &str,
        fields: &Fields,
    ) -> Result<SaveResult, PortError> {
        if let Some(rejected) = self.check_rejection(document_id) {
            return rejected;
        }
        let mut state = self.state();
        let head = state
            .documents
            .get_mut(document_id)
            .and_then(|v| v.last_mut())
            .ok_or_else(|| format!("INVALID_DATA: document {document_id} not found"))?;
        head.apply(fields);
        let version = version_of(head).ok_or("INVALID_DATA: head version has no version number")?;
        state.writes.push(WriteOp::UpdateVersion {
            version: version.clone(),
            fields: fields.keys().cloned().collect(),
        });
        Ok(SaveResult::saved(version))
    }

    fn do_create_document(
        &self,
        fields: &Fields,
        source: &FileSource,
    ) -> Result<SaveResult, PortError> {
        let source_version = match source {
            FileSource::Version(v) | FileSource::Rendition { version: v, .. } => v,
        };
        if self.find_version(source_version).is_none() {
            return Err(format!("INVALID_DATA: source document {source_version} not found").into());
        }

        let document_id = {
            let mut state = self.state();
            let id = state.next_document.to_string();
            state.next_document += 1;
            id
        };
        let major = fields.get(doc::MAJOR).and_then(field_number).unwrap_or(0);
        let minor = fields.get(doc::MINOR).and_then(field_number).unwrap_or(1);

        let mut row = Row::new();
        row.apply(fields);
        let version = self.add_version(&document_id, major, minor, row);
        self.state().writes.push(WriteOp::CreateDocument { version: version.clone() });
        Ok(SaveResult::saved(version))
    }

    fn do_create_record(&self, object: &str, fields: &Fields) -> Result<String, PortError> {
        if let Some(rejected) = self.check_rejection(object) {
            let message = match rejected {
                Ok(result) => {
                    result.error_message().unwrap_or_else(|| "record not saved".to_string())
                }
                Err(e) => e.to_string(),
            };
            return Err(message.into());
        }
        let mut row = Row::new();
        row.apply(fields);
        let id = Uuid::new_v4().to_string();
        row.set("id", id.clone());
        let mut state = self.state();
        state.objects.entry(object.to_string()).or_default().push(row);
        state.writes.push(WriteOp::CreateRecord { object: object.to_string(), id: id.clone() });
        Ok(id)
    }

    fn do_grant_roles(
        &self,
        version: &VersionId,
        roles: &[String],
        group: &str,
    ) -> Result<(), PortError> {
        if self.find_version(version).is_none() {
            return Err(format!("INVALID_DATA: document {version} not found").into());
        }
        self.state().writes.push(WriteOp::GrantRoles {
            version: version.clone(),
            roles: roles.to_vec(),
            group: group.to_string(),
        });
        Ok(())
    }

    fn do_user_action(&self, version: &VersionId, action: &str) -> Result<(), PortError> {
        if let Some(Err(e)) = self.check_rejection(&version.document_id) {
            return Err(e);
        }
        let mut state = self.state();
        let target = state
            .actions
            .get(action)
            .cloned()
            .ok_or_else(|| format!("OPERATION_NOT_ALLOWED: action {action} is not available"))?;
        let row = state
            .documents
            .get_mut(&version.document_id)
            .and_then(|versions| {
                versions.iter_mut().find(|r| version_of(r).as_ref() == Some(version))
            })
            .ok_or_else(|| format!("INVALID_DATA: document {version} not found"))?;
        row.set(doc::STATUS, target);
        state
            .writes
            .push(WriteOp::UserAction { version: version.clone(), action: action.to_string() });
        Ok(())
    }

    fn find_version(&self, version: &VersionId) -> Option<Row> {
        self.versions(&version.document_id)
            .into_iter()
            .find(|row| version_of(row).as_ref() == Some(version))
    }
}

impl RecordStore for MemoryStore {
    fn query<'a>(&'a self, query: &'a Query) -> PortFuture<'a, Vec<Row>> {
        Box::pin(std::future::ready(self.run_query(query)))
    }

    fn create_version<'a>(
        &'a self,
        document_id: &'a str,
        fields: &'a Fields,
        _source: &'a FileSource,
    ) -> PortFuture<'a, SaveResult> {
        Box::pin(std::future::ready(self.do_create_version(document_id, fields)))
    }

    fn update_version<'a>(
        &'a self,
        document_id: &'a str,
        fields: &'a Fields,
    ) -> PortFuture<'a, SaveResult> {
        Box::pin(std::future::ready(self.do_update_version(document_id, fields)))
    }

    fn create_document<'a>(
        &'a self,
        fields: &'a Fields,
        source: &'a FileSource,
    ) -> PortFuture<'a, SaveResult> {
        Box::pin(std::future::ready(self.do_create_document(fields, source)))
    }

    fn create_record<'a>(&'a self, object: &'a str, fields: &'a Fields) -> PortFuture<'a, String> {
        Box::pin(std::future::ready(self.do_create_record(object, fields)))
    }

    fn grant_roles<'a>(
        &'a self,
        version: &'a VersionId,
        roles: &'a [String],
        group: &'a str,
    ) -> PortFuture<'a, ()> {
        Box::pin(std::future::ready(self.do_grant_roles(version, roles, group)))
    }

    fn user_action<'a>(&'a self, version: &'a VersionId, action: &'a str) -> PortFuture<'a, ()> {
        Box::pin(std::future::ready(self.do_user_action(version, action)))
    }
}

fn stamp_version(row: &mut Row, version: &VersionId) {
    row.set(doc::ID, version.document_id.clone());
    row.set(doc::VERSION_ID, version.to_string());
    row.set(doc::MAJOR, version.major);
    row.set(doc::MINOR, version.minor);
}

fn version_of(row: &Row) -> Option<VersionId> {
    Some(VersionId::new(
        row.text(doc::ID)?,
        number_field(row, doc::MAJOR)?,
        number_field(row, doc::MINOR)?,
    ))
}

fn number_field(row: &Row, field: &str) -> Option<u32> {
    row.text(field)?.parse().ok()
}

fn field_number(value: &FieldValue) -> Option<u32> {
    match value {
        FieldValue::Number(n) if *n >= 0.0 && n.fract() == 0.0 => format!("{n:.0}").parse().ok(),
        FieldValue::Text(s) => s.parse().ok(),
        _ => None,
    }
}

/// Every text value of a field: scalars yield one, lists yield each element.
fn values_of(row: &Row, field: &str) -> Vec<String> {
    fn scalar(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
    match row.get(field) {
        Some(Value::Array(items)) => items.iter().filter_map(scalar).collect(),
        Some(value) => scalar(value).into_iter().collect(),
        None => Vec::new(),
    }
}

fn satisfies(row: &Row, predicate: &Predicate, steady_states: &[String]) -> bool {
    match predicate {
        Predicate::Equals { column, value } => {
            let wanted = value.as_text();
            values_of(row, column.key()).iter().any(|v| *v == wanted)
        }
        Predicate::Contains { column, values } => {
            let present = values_of(row, column.key());
            values.iter().any(|v| present.contains(&v.as_text()))
        }
        Predicate::SteadyState { column } => {
            values_of(row, column.key()).iter().any(|v| steady_states.contains(v))
        }
    }
}

fn project(row: &Row, query: &Query) -> Row {
    if query.columns.is_empty() {
        return row.clone();
    }
    let mut out = Row::new();
    for column in &query.columns {
        let key = column.key();
        out.set(key, row.get(key).cloned().unwrap_or(Value::Null));
    }
    out
}
