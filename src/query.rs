//! Typed vault queries.
//!
//! Queries are built from a source, a column list and a predicate list.
//! Parameters are bound as values and only quoted at render time, so ids
//! coming from records can never change the shape of a query.

use std::fmt::{self, Write as _};

use serde::{Deserialize, Serialize};

use crate::version::VersionId;

/// What a query reads from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Head versions of documents.
    Documents,
    /// Every version of every document.
    AllVersions,
    /// Records of a vault object.
    Object(String),
}

/// A selected or filtered column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    /// A plain field.
    Field(String),
    /// `toName(field)`: picklist and lifecycle values by API name.
    Name(String),
    /// `LongText(field)`: long text without truncation.
    LongText(String),
}

impl Column {
    /// The key the column's value appears under in a result row.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Field(f) | Self::Name(f) | Self::LongText(f) => f,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => f.write_str(name),
            Self::Name(name) => write!(f, "toName({name})"),
            Self::LongText(name) => write!(f, "LongText({name})"),
        }
    }
}

/// A bound query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Param {
    /// Rendered as a quoted, escaped string literal.
    Text(String),
    /// Rendered bare.
    Integer(i64),
}

impl Param {
    /// A record or document id: bare when numeric, quoted otherwise.
    #[must_use]
    pub fn id(value: &str) -> Self {
        value.parse::<i64>().map_or_else(|_| Self::Text(value.to_string()), Self::Integer)
    }

    /// The value as text, for in-memory comparison.
    #[must_use]
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Integer(n) => n.to_string(),
        }
    }

    fn render(&self, out: &mut String) {
        match self {
            Self::Integer(n) => {
                let _ = write!(out, "{n}");
            }
            Self::Text(s) => {
                out.push('\'');
                for c in s.chars() {
                    if c == '\'' || c == '\\' {
                        out.push('\\');
                    }
                    out.push(c);
                }
                out.push('\'');
            }
        }
    }
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for Param {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<i64> for Param {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<&VersionId> for Param {
    fn from(value: &VersionId) -> Self {
        Self::Text(value.to_string())
    }
}

/// A filter in a query's `where` clause. Predicates are joined with `and`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// `column = value`
    Equals {
        /// Filtered column.
        column: Column,
        /// Bound value.
        value: Param,
    },
    /// `column contains (v1, v2, ...)`
    Contains {
        /// Filtered column.
        column: Column,
        /// Accepted values.
        values: Vec<Param>,
    },
    /// `column = steadystate()`: the version is in a steady (approved) state.
    SteadyState {
        /// Filtered column, normally the lifecycle state.
        column: Column,
    },
}

/// A typed vault query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// What is read.
    pub source: Source,
    /// Selected columns, in order.
    pub columns: Vec<Column>,
    /// Filters, all of which must hold.
    pub predicates: Vec<Predicate>,
}

impl Query {
    fn from_source(source: Source) -> Self {
        Self { source, columns: Vec::new(), predicates: Vec::new() }
    }

    /// Query over head document versions.
    #[must_use]
    pub fn documents() -> Self {
        Self::from_source(Source::Documents)
    }

    /// Query over all document versions.
    #[must_use]
    pub fn all_versions() -> Self {
        Self::from_source(Source::AllVersions)
    }

    /// Query over an object's records.
    #[must_use]
    pub fn object(name: impl Into<String>) -> Self {
        Self::from_source(Source::Object(name.into()))
    }

    /// Selects a plain field.
    #[must_use]
    pub fn select(mut self, field: impl Into<String>) -> Self {
        self.columns.push(Column::Field(field.into()));
        self
    }

    /// Selects several plain fields.
    #[must_use]
    pub fn select_all<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(fields.into_iter().map(|f| Column::Field(f.into())));
        self
    }

    /// Selects `toName(field)`.
    #[must_use]
    pub fn select_name(mut self, field: impl Into<String>) -> Self {
        self.columns.push(Column::Name(field.into()));
        self
    }

    /// Selects `LongText(field)`.
    #[must_use]
    pub fn select_long_text(mut self, field: impl Into<String>) -> Self {
        self.columns.push(Column::LongText(field.into()));
        self
    }

    /// Adds `field = value`.
    #[must_use]
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Param>) -> Self {
        self.predicates
            .push(Predicate::Equals { column: Column::Field(field.into()), value: value.into() });
        self
    }

    /// Adds `field contains (values...)`.
    #[must_use]
    pub fn where_contains<I, P>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Param>,
    {
        self.predicates.push(Predicate::Contains {
            column: Column::Field(field.into()),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Adds `field = steadystate()`.
    #[must_use]
    pub fn where_steady_state(mut self, field: impl Into<String>) -> Self {
        self.predicates.push(Predicate::SteadyState { column: Column::Field(field.into()) });
        self
    }

    /// Renders the query as VQL with all parameters quoted and escaped.
    #[must_use]
    pub fn to_vql(&self) -> String {
        let mut out = String::from("select ");
        let columns: Vec<String> = self.columns.iter().map(ToString::to_string).collect();
        out.push_str(&columns.join(", "));
        out.push_str(" from ");
        match &self.source {
            Source::Documents => out.push_str("documents"),
            Source::AllVersions => out.push_str("allversions documents"),
            Source::Object(name) => out.push_str(name),
        }

        for (i, predicate) in self.predicates.iter().enumerate() {
            out.push_str(if i == 0 { " where " } else { " and " });
            match predicate {
                Predicate::Equals { column, value } => {
                    let _ = write!(out, "{column} = ");
                    value.render(&mut out);
                }
                Predicate::Contains { column, values } => {
                    let _ = write!(out, "{column} contains (");
                    for (j, value) in values.iter().enumerate() {
                        if j > 0 {
                            out.push_str(", ");
                        }
                        value.render(&mut out);
                    }
                    out.push(')');
                }
                Predicate::SteadyState { column } => {
                    let _ = write!(out, "{column} = steadystate()");
                }
            }
        }
        out
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_vql())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_head_version_query() {
        let q = Query::documents()
            .select("version_id")
            .select_name("status__v")
            .select("pmf__c")
            .where_eq("id", Param::id("1042"));
        assert_eq!(
            q.to_vql(),
            "select version_id, toName(status__v), pmf__c from documents where id = 1042"
        );
    }

    #[test]
    fn renders_steady_state_and_all_versions() {
        let v = VersionId::new("D1", 2, 0);
        let q = Query::all_versions()
            .select("document_number__v")
            .where_eq("version_id", &v)
            .where_steady_state("status__v");
        assert_eq!(
            q.to_vql(),
            "select document_number__v from allversions documents \
             where version_id = 'D1_2_0' and status__v = steadystate()"
        );
    }

    #[test]
    fn renders_contains_and_long_text() {
        let q = Query::object("vproc_parameter_set__c")
            .select_long_text("artwork_fields__c")
            .where_contains("name__v", ["pmf", "pmf_eu"]);
        assert_eq!(
            q.to_vql(),
            "select LongText(artwork_fields__c) from vproc_parameter_set__c \
             where name__v contains ('pmf', 'pmf_eu')"
        );
    }

    #[test]
    fn bound_text_is_escaped() {
        let q = Query::object("pmf__c").select("id").where_eq("name__v", "x' or '1'='1");
        assert_eq!(q.to_vql(), r"select id from pmf__c where name__v = 'x\' or \'1\'=\'1'");
        let q = Query::object("pmf__c").select("id").where_eq("name__v", r"a\b");
        assert!(q.to_vql().ends_with(r"'a\\b'"));
    }

    #[test]
    fn ids_render_bare_only_when_numeric() {
        assert_eq!(Param::id("1042"), Param::Integer(1042));
        assert_eq!(Param::id("D1"), Param::Text("D1".into()));
    }

    #[test]
    fn column_keys_strip_functions() {
        assert_eq!(Column::Name("status__v".into()).key(), "status__v");
        assert_eq!(Column::LongText("artwork_fields__c".into()).key(), "artwork_fields__c");
    }
}
