//! Cassettes: recorded port interactions for deterministic replay.
//!
//! A recording session wraps each port of a live context and writes one
//! YAML cassette per port. Replaying contexts serve the recorded outputs
//! back in call order, so a reconciliation run against a real vault can be
//! re-run offline.

pub mod config;
pub mod format;
pub mod recorder;
pub mod replayer;
pub mod session;

/// Port name of the record store in cassettes.
pub const STORE_PORT: &str = "store";
/// Port name of the notifier in cassettes.
pub const NOTIFIER_PORT: &str = "notifier";
/// Port name of the workflow starter in cassettes.
pub const WORKFLOW_PORT: &str = "workflow";
