//! Artwork document version reconciliation.
//!
//! For each artwork linked to a PMF the engine reads the snapshot version
//! and the document's head version, classifies the pair into an [`Action`],
//! and then creates a new draft, attaches an existing one, or does nothing.
//! Users edit documents while the job runs, so a snapshot that has gone
//! stale is detected and handled rather than treated as an error.

mod classify;
mod engine;
mod job;
mod link;
mod notice;
mod outcome;

pub use classify::{classify, Action, ArtworkState};
pub use engine::Reconciler;
pub use job::UpVersionJob;
pub use link::ArtworkLink;
pub use notice::{anchor_blank, FailureNotice, FailureReason};
pub use outcome::{ItemOutcome, Resolution};
