//! Port implementations.
//!
//! - `live`: the vault REST API and the notification webhook.
//! - `memory`: in-process state for dry runs and tests.
//! - `recording`: wraps another adapter and captures every call to a cassette.
//! - `replaying`: serves calls from a cassette.

pub mod live;
pub mod memory;
pub mod recording;
pub mod replaying;
