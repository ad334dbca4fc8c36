//! Deciding what to do with one artwork link.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::LifecycleConfig;
use crate::version::VersionId;

/// What the engine does with an artwork link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Create a new draft version from the approved snapshot.
    UpVersion,
    /// Point an existing draft at the PMF.
    Attach,
    /// Leave the document alone.
    NoOp,
}

impl Action {
    /// Lower-case label used in logs and reports.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UpVersion => "up_version",
            Self::Attach => "attach",
            Self::NoOp => "no_op",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the vault currently says about a linked artwork document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtworkState {
    /// Version recorded on the link when the artwork was selected.
    pub snapshot: VersionId,
    /// Lifecycle state of the snapshot version.
    pub snapshot_state: String,
    /// Head version of the document.
    pub current: VersionId,
    /// Lifecycle state of the head version.
    pub current_state: String,
    /// PMF referenced by the head version, if any.
    pub current_pmf: Option<String>,
}

/// Classifies an observed artwork state. The first matching rule wins:
///
/// | snapshot state | head == snapshot | head state | head PMF | action |
/// |---|---|---|---|---|
/// | approved | yes | approved | any | `UpVersion` |
/// | approved | no | any | none | `Attach` |
/// | draft | same major | any | none | `Attach` |
/// | anything else | | | | `NoOp` |
#[must_use]
pub fn classify(state: &ArtworkState, lifecycle: &LifecycleConfig) -> Action {
    let approved = state.snapshot_state == lifecycle.approved;
    let draft = state.snapshot_state == lifecycle.draft;
    let head_is_snapshot = state.current == state.snapshot;
    let unclaimed = state.current_pmf.is_none();

    if approved && head_is_snapshot && state.current_state == lifecycle.approved {
        Action::UpVersion
    } else if approved && !head_is_snapshot && unclaimed {
        Action::Attach
    } else if draft && state.current.same_major(&state.snapshot) && unclaimed {
        Action::Attach
    } else {
        Action::NoOp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const APPROVED: &str = "approved_for_distribution__c";
    const DRAFT: &str = "draft__c";

    fn state(
        snapshot: (u32, u32, &str),
        current: (u32, u32, &str),
        pmf: Option<&str>,
    ) -> ArtworkState {
        ArtworkState {
            snapshot: VersionId::new("D1", snapshot.0, snapshot.1),
            snapshot_state: snapshot.2.to_string(),
            current: VersionId::new("D1", current.0, current.1),
            current_state: current.2.to_string(),
            current_pmf: pmf.map(str::to_string),
        }
    }

    fn run(s: &ArtworkState) -> Action {
        classify(s, &LifecycleConfig::default())
    }

    #[test]
    fn approved_head_is_up_versioned() {
        assert_eq!(run(&state((2, 0, APPROVED), (2, 0, APPROVED), None)), Action::UpVersion);
        // The head PMF does not matter while the snapshot is still the head.
        let claimed = state((2, 0, APPROVED), (2, 0, APPROVED), Some("PMF-9"));
        assert_eq!(run(&claimed), Action::UpVersion);
    }

    #[test]
    fn unclaimed_newer_version_is_attached() {
        assert_eq!(run(&state((2, 0, APPROVED), (2, 1, DRAFT), None)), Action::Attach);
        assert_eq!(run(&state((2, 0, APPROVED), (3, 0, APPROVED), None)), Action::Attach);
    }

    #[test]
    fn claimed_newer_version_is_left_alone() {
        assert_eq!(run(&state((2, 0, APPROVED), (2, 1, DRAFT), Some("PMF-1"))), Action::NoOp);
    }

    #[test]
    fn draft_snapshot_attaches_within_same_major() {
        assert_eq!(run(&state((2, 1, DRAFT), (2, 3, DRAFT), None)), Action::Attach);
        assert_eq!(run(&state((2, 1, DRAFT), (2, 1, DRAFT), None)), Action::Attach);
        assert_eq!(run(&state((2, 1, DRAFT), (3, 0, DRAFT), None)), Action::NoOp);
        assert_eq!(run(&state((2, 1, DRAFT), (2, 3, DRAFT), Some("PMF-1"))), Action::NoOp);
    }

    #[test]
    fn production_proofing_states_are_not_touched() {
        let proofing = state((2, 0, "in_proofing__c"), (2, 0, "in_proofing__c"), None);
        assert_eq!(run(&proofing), Action::NoOp);
        assert_eq!(run(&state((2, 0, APPROVED), (2, 0, "in_proofing__c"), None)), Action::NoOp);
    }

    #[test]
    fn states_come_from_configuration() {
        let lifecycle =
            LifecycleConfig { approved: "released__c".into(), ..LifecycleConfig::default() };
        let s = state((1, 0, "released__c"), (1, 0, "released__c"), None);
        assert_eq!(classify(&s, &lifecycle), Action::UpVersion);
        assert_eq!(run(&s), Action::NoOp);
    }
}
