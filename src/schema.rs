//! Artwork field schema: which document fields are copied onto a new draft.
//!
//! The schema is maintained by administrators as a long-text parameter
//! (`artwork_fields__c` on the `pmf` parameter set). Each entry has the form
//! `<field name>|<type>[|required]`, for example:
//!
//! ```text
//! approval_deadline__c|Date|required
//! barcode_number__c|String
//! barcode_type__c|Picklist
//! ```
//!
//! The same list drives the select list of the up-version query and the
//! typed copy onto the new version, so the two can never drift apart.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::ServiceContext;
use crate::error::{ReconcileError, ReconcileResult};
use crate::names::{doc, parameter_set};
use crate::query::Query;
use crate::record::{Fields, Row};

/// The value type of an artwork field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    /// Object reference (`ObjectReference`).
    Reference,
    /// Text (`String`).
    Text,
    /// Picklist (`Picklist`).
    Picklist,
    /// Yes/No (`Boolean`).
    Boolean,
    /// Date (`Date`).
    Date,
    /// Number (`Number`).
    Number,
    /// Date and time (`DateTime`).
    DateTime,
}

impl ValueKind {
    /// The spelling used in the parameter string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reference => "ObjectReference",
            Self::Text => "String",
            Self::Picklist => "Picklist",
            Self::Boolean => "Boolean",
            Self::Date => "Date",
            Self::Number => "Number",
            Self::DateTime => "DateTime",
        }
    }
}

impl FromStr for ValueKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ObjectReference" => Ok(Self::Reference),
            "String" => Ok(Self::Text),
            "Picklist" => Ok(Self::Picklist),
            "Boolean" => Ok(Self::Boolean),
            "Date" => Ok(Self::Date),
            "Number" => Ok(Self::Number),
            "DateTime" => Ok(Self::DateTime),
            other => Err(format!("invalid field type '{other}'")),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One artwork field to copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field API name.
    pub name: String,
    /// Value type used when reading and writing the field.
    pub kind: ValueKind,
    /// Whether an empty value blocks the up-version.
    pub required: bool,
}

impl FieldSpec {
    /// Parses `<name>|<type>[|required]`.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::InvalidFieldSpec`] for a wrong number of
    /// elements, an empty name, an unknown type, or a third element other
    /// than `required`.
    pub fn parse(entry: &str) -> ReconcileResult<Self> {
        let invalid = |reason: &str| ReconcileError::InvalidFieldSpec {
            entry: entry.to_string(),
            reason: reason.to_string(),
        };

        let elements: Vec<&str> = entry.split('|').map(str::trim).collect();
        if !(2..=3).contains(&elements.len()) {
            return Err(invalid("wrong number of elements"));
        }

        let name = elements[0];
        if name.is_empty() {
            return Err(invalid("missing field name"));
        }

        let kind: ValueKind = elements[1].parse().map_err(|e: String| invalid(&e))?;

        let required = match elements.get(2) {
            None | Some(&"") => false,
            Some(&"required") => true,
            Some(_) => return Err(invalid("invalid required attribute")),
        };

        Ok(Self { name: name.to_string(), kind, required })
    }
}

/// The ordered list of artwork fields copied onto a new draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    fields: Vec<FieldSpec>,
}

/// Result of copying schema fields from an approved version.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldCopy {
    /// Every required field had a value.
    Complete(Fields),
    /// The named required field was empty.
    MissingRequired(String),
}

impl FieldSchema {
    /// Builds a schema from already-parsed entries.
    #[must_use]
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    /// Parses the admin-maintained definition text.
    ///
    /// Entries are separated by commas or line breaks; blank entries are ignored.
    ///
    /// # Errors
    ///
    /// Returns the first [`ReconcileError::InvalidFieldSpec`] encountered.
    pub fn parse(text: &str) -> ReconcileResult<Self> {
        let fields = text
            .split([',', '\n', '\r'])
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(FieldSpec::parse)
            .collect::<ReconcileResult<Vec<_>>>()?;
        Ok(Self { fields })
    }

    /// The field definitions, in order.
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Field names, in order, for building select lists.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Whether the schema has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Copies every schema field out of `row` as a typed value.
    ///
    /// Stops at the first required field that is empty. Optional empty
    /// fields are left unset.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::InvalidFieldSpec`] when a stored value does
    /// not match its declared type.
    pub fn copy_from(&self, row: &Row) -> ReconcileResult<FieldCopy> {
        let mut copied = Fields::new();
        for spec in &self.fields {
            let value = row.typed(&spec.name, spec.kind).map_err(|reason| {
                ReconcileError::InvalidFieldSpec {
                    entry: format!("{}|{}", spec.name, spec.kind),
                    reason,
                }
            })?;
            match value {
                Some(value) => {
                    copied.insert(spec.name.clone(), value);
                }
                None if spec.required => return Ok(FieldCopy::MissingRequired(spec.name.clone())),
                None => {}
            }
        }
        Ok(FieldCopy::Complete(copied))
    }
}

/// Loads the artwork field schema from the vault's parameter sets.
pub struct FieldSchemaResolver<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> FieldSchemaResolver<'a> {
    /// Creates a resolver reading through the context's store.
    #[must_use]
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Fetches and parses the field definitions of parameter set `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Query`] if the parameter set cannot be read
    /// and [`ReconcileError::InvalidFieldSpec`] if it is missing or invalid.
    pub async fn resolve(&self, key: &str) -> ReconcileResult<FieldSchema> {
        let query = Query::object(parameter_set::OBJECT)
            .select_long_text(parameter_set::ARTWORK_FIELDS)
            .where_eq(parameter_set::NAME, key);

        let rows = self
            .ctx
            .store
            .query(&query)
            .await
            .map_err(|e| ReconcileError::query(format!("reading parameter set '{key}'"), e))?;

        let text = rows
            .first()
            .ok_or_else(|| ReconcileError::InvalidFieldSpec {
                entry: key.to_string(),
                reason: "parameter set not found".to_string(),
            })?
            .text(parameter_set::ARTWORK_FIELDS)
            .unwrap_or_default();

        let schema = FieldSchema::parse(&text)?;
        debug!(
            parameter_set = key,
            fields = schema.fields().len(),
            "Resolved artwork field schema"
        );
        Ok(schema)
    }

    /// Checks that every schema field exists on artwork documents by issuing
    /// a probe query that selects all of them.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Config`] naming the vault's complaint when
    /// the probe query is rejected.
    pub async fn check_against_store(&self, schema: &FieldSchema) -> ReconcileResult<()> {
        let probe = Query::documents()
            .select(doc::ID)
            .select_all(schema.field_names())
            .where_eq(doc::ID, -1_i64);
        self.ctx.store.query(&probe).await.map(|_| ()).map_err(|e| ReconcileError::Config {
            message: format!("artwork field list rejected by the vault: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_entries_with_and_without_required() {
        let spec = FieldSpec::parse("approval_deadline__c|Date|required").unwrap();
        assert_eq!(spec.name, "approval_deadline__c");
        assert_eq!(spec.kind, ValueKind::Date);
        assert!(spec.required);

        let spec = FieldSpec::parse("barcode_type__c|Picklist").unwrap();
        assert!(!spec.required);

        let spec = FieldSpec::parse("barcode_number__c|String|").unwrap();
        assert_eq!(spec.kind, ValueKind::Text);
        assert!(!spec.required);
    }

    #[test]
    fn rejects_invalid_entries() {
        for (entry, reason) in [
            ("barcode__c", "wrong number of elements"),
            ("a|String|required|x", "wrong number of elements"),
            ("|String", "missing field name"),
            ("brand__c|Reference", "invalid field type 'Reference'"),
            ("brand__c|String|yes", "invalid required attribute"),
        ] {
            match FieldSpec::parse(entry).unwrap_err() {
                ReconcileError::InvalidFieldSpec { entry: e, reason: r } => {
                    assert_eq!(e, entry);
                    assert_eq!(r, reason);
                }
                other => panic!("unexpected error {other:?}"),
            }
        }
    }

    #[test]
    fn parses_multi_entry_text_in_order() {
        let schema = FieldSchema::parse(
            "product__v|ObjectReference|required,\n  barcode__c|String\n\nrecyclable__c|Boolean",
        )
        .unwrap();
        let names: Vec<&str> = schema.field_names().collect();
        assert_eq!(names, vec!["product__v", "barcode__c", "recyclable__c"]);
        assert!(FieldSchema::parse("  \n ").unwrap().is_empty());
        assert!(FieldSchema::parse("good__c|String,bad__c|Blob").is_err());
    }

    #[test]
    fn copy_stops_at_missing_required_field() {
        let schema =
            FieldSchema::parse("product__v|ObjectReference|required,barcode__c|String").unwrap();
        let row = Row::new().with("product__v", json!([])).with("barcode__c", "123");
        assert_eq!(
            schema.copy_from(&row).unwrap(),
            FieldCopy::MissingRequired("product__v".to_string())
        );
    }

    #[test]
    fn copy_skips_empty_optional_fields() {
        let schema =
            FieldSchema::parse("product__v|ObjectReference|required,barcode__c|String").unwrap();
        let row = Row::new().with("product__v", json!(["P1"]));
        let FieldCopy::Complete(fields) = schema.copy_from(&row).unwrap() else {
            panic!("expected a complete copy");
        };
        assert_eq!(fields.len(), 1);
        assert!(fields.contains_key("product__v"));
    }

    #[test]
    fn copy_reports_type_mismatch() {
        let schema = FieldSchema::parse("deadline__c|Date").unwrap();
        let row = Row::new().with("deadline__c", "tomorrow");
        assert!(matches!(
            schema.copy_from(&row),
            Err(ReconcileError::InvalidFieldSpec { .. })
        ));
    }
}
