//! Per-item results of a reconciliation run.

use std::fmt;

use super::classify::Action;
use crate::error::ReconcileError;
use crate::version::VersionId;

/// What the engine ended up doing for a link that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A new draft version was created.
    Created(VersionId),
    /// An existing head version was pointed at the PMF.
    Attached(VersionId),
    /// A newer version already belongs to a PMF; nothing to do.
    AlreadyHandled,
    /// The classification called for no action.
    Unchanged,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created(v) => write!(f, "created {v}"),
            Self::Attached(v) => write!(f, "attached {v}"),
            Self::AlreadyHandled => f.write_str("already handled"),
            Self::Unchanged => f.write_str("unchanged"),
        }
    }
}

/// The result of reconciling one artwork link.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemOutcome {
    /// Artwork link record id.
    pub link_id: String,
    /// Snapshot version id as stored on the link.
    pub snapshot: String,
    /// The classified action, absent when observation failed.
    pub action: Option<Action>,
    /// What happened, or why the item failed.
    pub resolution: Result<Resolution, ReconcileError>,
    /// Problems that did not fail the item.
    pub warnings: Vec<String>,
}

impl ItemOutcome {
    /// Whether the item completed without error.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.resolution.is_ok()
    }

    /// The failure, if any.
    #[must_use]
    pub fn error(&self) -> Option<&ReconcileError> {
        self.resolution.as_ref().err()
    }
}

impl fmt::Display for ItemOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.link_id, self.snapshot)?;
        if let Some(action) = self.action {
            write!(f, " [{action}]")?;
        }
        match &self.resolution {
            Ok(resolution) => write!(f, ": {resolution}"),
            Err(e) => write!(f, ": failed: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_summarises_the_item() {
        let ok = ItemOutcome {
            link_id: "L1".into(),
            snapshot: "D1_2_0".into(),
            action: Some(Action::UpVersion),
            resolution: Ok(Resolution::Created(VersionId::new("D1", 2, 1))),
            warnings: vec![],
        };
        assert!(ok.succeeded());
        assert_eq!(ok.to_string(), "L1 (D1_2_0) [up_version]: created D1_2_1");

        let failed = ItemOutcome {
            action: None,
            resolution: Err(ReconcileError::MalformedIdentifier { input: "D1".into() }),
            ..ok
        };
        assert!(failed.error().is_some());
        assert_eq!(
            failed.to_string(),
            "L1 (D1_2_0): failed: Malformed document version identifier: 'D1'"
        );
    }
}
