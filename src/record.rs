//! Typed field values and query result rows.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::schema::ValueKind;

/// Field values written to a document version or object record, keyed by field name.
pub type Fields = BTreeMap<String, FieldValue>;

/// A single typed field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    /// Object reference ids.
    Reference(Vec<String>),
    /// Free text.
    Text(String),
    /// Picklist value names.
    Picklist(Vec<String>),
    /// Yes/No.
    Boolean(bool),
    /// Calendar date.
    Date(NaiveDate),
    /// Number.
    Number(f64),
    /// Timestamp.
    DateTime(DateTime<Utc>),
}

impl FieldValue {
    /// A single-valued reference.
    pub fn reference(id: impl Into<String>) -> Self {
        Self::Reference(vec![id.into()])
    }

    /// A single-valued picklist.
    pub fn picklist(name: impl Into<String>) -> Self {
        Self::Picklist(vec![name.into()])
    }

    /// Free text.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Converts a raw vault value into a typed value of `kind`.
    ///
    /// Returns `Ok(None)` for null, empty strings and empty lists.
    ///
    /// # Errors
    ///
    /// Returns a description of the mismatch if the raw value cannot be
    /// read as `kind`.
    pub fn from_json(kind: ValueKind, raw: &Value) -> Result<Option<Self>, String> {
        if is_empty(raw) {
            return Ok(None);
        }
        let value = match kind {
            ValueKind::Reference => Self::Reference(string_list(raw)?),
            ValueKind::Picklist => Self::Picklist(string_list(raw)?),
            ValueKind::Text => Self::Text(scalar_text(raw)?),
            ValueKind::Boolean => Self::Boolean(match raw {
                Value::Bool(b) => *b,
                Value::String(s) if s.eq_ignore_ascii_case("true") => true,
                Value::String(s) if s.eq_ignore_ascii_case("false") => false,
                other => return Err(format!("expected a boolean, found {other}")),
            }),
            ValueKind::Number => Self::Number(match raw {
                Value::Number(n) => n.as_f64().ok_or_else(|| format!("number out of range: {n}"))?,
                Value::String(s) => {
                    s.trim().parse().map_err(|_| format!("expected a number, found '{s}'"))?
                }
                other => return Err(format!("expected a number, found {other}")),
            }),
            ValueKind::Date => {
                let text = scalar_text(raw)?;
                Self::Date(
                    NaiveDate::parse_from_str(&text, "%Y-%m-%d")
                        .map_err(|e| format!("expected a date, found '{text}': {e}"))?,
                )
            }
            ValueKind::DateTime => {
                let text = scalar_text(raw)?;
                Self::DateTime(
                    DateTime::parse_from_rfc3339(&text)
                        .map_err(|e| format!("expected a timestamp, found '{text}': {e}"))?
                        .with_timezone(&Utc),
                )
            }
        };
        Ok(Some(value))
    }

    /// The raw vault representation of this value.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Reference(ids) | Self::Picklist(ids) => {
                Value::Array(ids.iter().cloned().map(Value::String).collect())
            }
            Self::Text(s) => Value::String(s.clone()),
            Self::Boolean(b) => Value::Bool(*b),
            Self::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            Self::Number(n) => {
                serde_json::Number::from_f64(*n).map_or(Value::Null, Value::Number)
            }
            Self::DateTime(t) => Value::String(t.to_rfc3339()),
        }
    }

    /// The value as sent in a form-encoded vault API request.
    #[must_use]
    pub fn to_form_value(&self) -> String {
        match self {
            Self::Reference(ids) | Self::Picklist(ids) => ids.join(","),
            Self::Text(s) => s.clone(),
            Self::Boolean(b) => b.to_string(),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{n:.0}"),
            Self::Number(n) => n.to_string(),
            Self::DateTime(t) => t.to_rfc3339(),
        }
    }
}

fn is_empty(raw: &Value) -> bool {
    match raw {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.iter().all(is_empty),
        _ => false,
    }
}

fn scalar_text(raw: &Value) -> Result<String, String> {
    match raw {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Array(items) if items.len() == 1 => scalar_text(&items[0]),
        other => Err(format!("expected a single value, found {other}")),
    }
}

fn string_list(raw: &Value) -> Result<Vec<String>, String> {
    match raw {
        Value::Array(items) => {
            items.iter().filter(|item| !is_empty(item)).map(scalar_text).collect()
        }
        Value::String(s) => Ok(s.split(',').map(|p| p.trim().to_string()).collect()),
        other => Err(format!("expected a list of values, found {other}")),
    }
}

/// One row of a query result.
///
/// Keys are the field names the vault returns; `toName(...)` and
/// `LongText(...)` columns come back under the bare field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(Map<String, Value>);

impl Row {
    /// An empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Inserts or replaces a field.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    /// Raw value of a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Text of a field. Lists yield their first element; null and empty yield `None`.
    #[must_use]
    pub fn text(&self, field: &str) -> Option<String> {
        self.0.get(field).and_then(first_text)
    }

    /// Reads a field as the given kind.
    ///
    /// # Errors
    ///
    /// Returns a description of the mismatch if the stored value does not fit `kind`.
    pub fn typed(&self, field: &str, kind: ValueKind) -> Result<Option<FieldValue>, String> {
        match self.0.get(field) {
            Some(raw) => FieldValue::from_json(kind, raw),
            None => Ok(None),
        }
    }

    /// Iterates over all fields.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Overlays typed field values onto this row.
    pub fn apply(&mut self, fields: &Fields) {
        for (name, value) in fields {
            self.0.insert(name.clone(), value.to_json());
        }
    }
}

impl From<Map<String, Value>> for Row {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn first_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => items.iter().find_map(first_text),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_takes_first_list_element() {
        let row = Row::new()
            .with("status__v", json!(["approved_for_distribution__c"]))
            .with("pmf__c", json!([]))
            .with("version_id", "D1_2_0")
            .with("minor", 3);
        assert_eq!(row.text("status__v").as_deref(), Some("approved_for_distribution__c"));
        assert_eq!(row.text("pmf__c"), None);
        assert_eq!(row.text("version_id").as_deref(), Some("D1_2_0"));
        assert_eq!(row.text("minor").as_deref(), Some("3"));
        assert_eq!(row.text("missing"), None);
    }

    #[test]
    fn typed_reads_each_kind() {
        let row = Row::new()
            .with("brand", json!(["B-1"]))
            .with("barcode", "0012")
            .with("recyclable", true)
            .with("deadline", "2024-05-01")
            .with("count", 4)
            .with("stamp", "2024-05-01T10:00:00Z");

        assert_eq!(
            row.typed("brand", ValueKind::Reference).unwrap(),
            Some(FieldValue::reference("B-1"))
        );
        assert_eq!(row.typed("barcode", ValueKind::Text).unwrap(), Some(FieldValue::text("0012")));
        assert_eq!(
            row.typed("recyclable", ValueKind::Boolean).unwrap(),
            Some(FieldValue::Boolean(true))
        );
        assert_eq!(
            row.typed("deadline", ValueKind::Date).unwrap(),
            Some(FieldValue::Date(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()))
        );
        assert_eq!(row.typed("count", ValueKind::Number).unwrap(), Some(FieldValue::Number(4.0)));
        assert!(matches!(
            row.typed("stamp", ValueKind::DateTime).unwrap(),
            Some(FieldValue::DateTime(_))
        ));
        assert_eq!(row.typed("absent", ValueKind::Text).unwrap(), None);
    }

    #[test]
    fn typed_rejects_mismatched_values() {
        let row = Row::new().with("deadline", "soon").with("flag", 3);
        assert!(row.typed("deadline", ValueKind::Date).is_err());
        assert!(row.typed("flag", ValueKind::Boolean).is_err());
    }

    #[test]
    fn form_values_match_vault_conventions() {
        assert_eq!(FieldValue::Picklist(vec!["a".into(), "b".into()]).to_form_value(), "a,b");
        assert_eq!(FieldValue::Number(2.0).to_form_value(), "2");
        assert_eq!(FieldValue::Number(2.5).to_form_value(), "2.5");
        assert_eq!(FieldValue::Boolean(false).to_form_value(), "false");
    }

    #[test]
    fn apply_overlays_json_values() {
        let mut row = Row::new().with("pmf__c", json!([]));
        let mut fields = Fields::new();
        fields.insert("pmf__c".into(), FieldValue::reference("PMF-1"));
        row.apply(&fields);
        assert_eq!(row.get("pmf__c"), Some(&json!(["PMF-1"])));
    }
}
