//! In-memory adapters for dry runs and tests.

pub mod notifier;
pub mod store;
pub mod workflow;

pub use notifier::CollectingNotifier;
pub use store::{MemoryStore, Rejection, StoreFixture, WriteOp};
pub use workflow::CollectingWorkflowStarter;
