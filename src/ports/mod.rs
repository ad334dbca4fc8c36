//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the reconciliation core and the
//! vault (records and documents, notifications, workflows).
//! Implementations live in `src/adapters/`.

pub mod notifier;
pub mod store;
pub mod workflow;

use std::error::Error;
use std::future::Future;
use std::pin::Pin;

pub use notifier::{Notification, Notifier};
pub use store::{FileSource, RecordStore, SaveResult};
pub use workflow::{WorkflowRequest, WorkflowStarter};

/// Error type returned by every port call, carrying the platform's message.
pub type PortError = Box<dyn Error + Send + Sync>;

/// Boxed future returned by port methods to keep the traits dyn-compatible.
pub type PortFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, PortError>> + Send + 'a>>;
