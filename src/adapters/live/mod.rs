//! Live adapters talking to a real vault.

pub mod client;
pub mod notifier;
pub mod store;
pub mod workflow;

pub use client::VaultClient;
pub use notifier::{LogNotifier, WebhookNotifier};
pub use store::LiveVaultStore;
pub use workflow::LiveWorkflowStarter;
