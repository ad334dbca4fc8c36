//! Document version identifiers (`<documentId>_<major>_<minor>`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ReconcileError, ReconcileResult};

/// A compound document version identifier.
///
/// The vault addresses every version of a document as
/// `<documentId>_<major>_<minor>`. The document id is everything before the
/// last two `_`-separated segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionId {
    /// Logical document id shared by all versions.
    pub document_id: String,
    /// Major version number.
    pub major: u32,
    /// Minor version number.
    pub minor: u32,
}

impl VersionId {
    /// Creates a version identifier from its parts.
    pub fn new(document_id: impl Into<String>, major: u32, minor: u32) -> Self {
        Self { document_id: document_id.into(), major, minor }
    }

    /// Parses `<id>_<major>_<minor>`.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::MalformedIdentifier`] if the input has fewer
    /// than three segments, an empty document id, or non-numeric version
    /// numbers.
    pub fn parse(input: &str) -> ReconcileResult<Self> {
        let malformed = || ReconcileError::MalformedIdentifier { input: input.to_string() };

        let mut parts = input.rsplitn(3, '_');
        let minor = parts.next().and_then(parse_number).ok_or_else(malformed)?;
        let major = parts.next().and_then(parse_number).ok_or_else(malformed)?;
        let document_id = parts.next().filter(|id| !id.trim().is_empty()).ok_or_else(malformed)?;

        Ok(Self::new(document_id, major, minor))
    }

    /// Returns only the major number of a version identifier string.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::MalformedIdentifier`] if the input cannot be parsed.
    pub fn major_of(input: &str) -> ReconcileResult<u32> {
        Self::parse(input).map(|v| v.major)
    }

    /// The identifier of the next draft: same major, minor + 1.
    #[must_use]
    pub fn next_minor(&self) -> Self {
        Self::new(self.document_id.clone(), self.major, self.minor + 1)
    }

    /// Whether both versions belong to the same document and major version.
    #[must_use]
    pub fn same_major(&self, other: &Self) -> bool {
        self.document_id == other.document_id && self.major == other.major
    }

    /// Link to this version in the vault UI.
    #[must_use]
    pub fn ui_url(&self, domain: &str) -> String {
        format!("https://{domain}/ui/#doc_info/{}/{}/{}", self.document_id, self.major, self.minor)
    }
}

fn parse_number(segment: &str) -> Option<u32> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.document_id, self.major, self.minor)
    }
}

impl FromStr for VersionId {
    type Err = ReconcileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VersionId {
    type Error = ReconcileError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<VersionId> for String {
    fn from(value: VersionId) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_identifier() {
        let v = VersionId::parse("1042_2_0").unwrap();
        assert_eq!(v, VersionId::new("1042", 2, 0));
        assert_eq!(v.to_string(), "1042_2_0");
    }

    #[test]
    fn document_id_may_contain_underscores() {
        let v: VersionId = "D1_a_3_11".parse().unwrap();
        assert_eq!(v.document_id, "D1_a");
        assert_eq!(v.major, 3);
        assert_eq!(v.minor, 11);
    }

    #[test]
    fn next_minor_keeps_major() {
        let v = VersionId::parse("D1_2_0").unwrap();
        assert_eq!(v.next_minor().to_string(), "D1_2_1");
        assert!(v.same_major(&v.next_minor()));
        assert!(!v.same_major(&VersionId::new("D1", 3, 0)));
        assert!(!v.same_major(&VersionId::new("D2", 2, 0)));
    }

    #[test]
    fn rejects_malformed_identifiers() {
        for input in ["", "12", "12_1", "12_a_0", "_1_0", "12_1_-1", "12_1_", "12__0", " _1_0"] {
            let err = VersionId::parse(input).unwrap_err();
            assert_eq!(err, ReconcileError::MalformedIdentifier { input: input.to_string() });
        }
    }

    #[test]
    fn major_of_reads_major_only() {
        assert_eq!(VersionId::major_of("77_4_2").unwrap(), 4);
        assert!(VersionId::major_of("77").is_err());
    }

    #[test]
    fn serde_uses_string_form() {
        let v = VersionId::new("D9", 1, 3);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, "\"D9_1_3\"");
        let back: VersionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
        assert!(serde_json::from_str::<VersionId>("\"nope\"").is_err());
    }

    #[test]
    fn ui_url_points_at_version() {
        let v = VersionId::new("D1", 2, 1);
        assert_eq!(
            v.ui_url("acme.veevavault.com"),
            "https://acme.veevavault.com/ui/#doc_info/D1/2/1"
        );
    }
}
