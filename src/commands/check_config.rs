//! `pmf-artwork check-config` command.

use crate::config::PmfConfig;
use crate::context::ServiceContext;
use crate::schema::FieldSchemaResolver;

/// Execute the `check-config` command.
///
/// The configuration itself was validated when it was loaded; this resolves
/// the artwork field schema and asks the vault to accept every field in it.
///
/// # Errors
///
/// Returns an error string if the schema is missing, malformed, or names
/// fields the vault does not know.
pub async fn run(ctx: &ServiceContext, config: &PmfConfig) -> Result<(), String> {
    println!("parameter set: {}", config.parameter_set);
    println!(
        "lifecycle: {} -> {} (redlines lock to {})",
        config.lifecycle.approved, config.lifecycle.draft, config.lifecycle.redline_locked
    );

    let resolver = FieldSchemaResolver::new(ctx);
    let schema = resolver.resolve(&config.parameter_set).await.map_err(|e| e.to_string())?;
    for field in schema.fields() {
        let required = if field.required { " (required)" } else { "" };
        println!("  {} {}{required}", field.name, field.kind);
    }
    resolver.check_against_store(&schema).await.map_err(|e| e.to_string())?;
    println!("Configuration OK: {} artwork field(s)", schema.fields().len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::run;
    use crate::adapters::memory::{CollectingNotifier, CollectingWorkflowStarter, MemoryStore};
    use crate::config::PmfConfig;
    use crate::context::ServiceContext;
    use crate::names::parameter_set;
    use crate::record::Row;

    fn context(fields: &str) -> ServiceContext {
        let store = MemoryStore::new();
        store.add_record(
            parameter_set::OBJECT,
            Row::new()
                .with(parameter_set::NAME, PmfConfig::default().parameter_set)
                .with(parameter_set::ARTWORK_FIELDS, fields),
        );
        let notifier = CollectingNotifier::new();
        ServiceContext::in_memory(store, notifier, CollectingWorkflowStarter::new())
    }

    #[tokio::test]
    async fn accepts_a_valid_schema() {
        let ctx = context("brand__c|Picklist\napproval_deadline__c|Date|required");
        assert!(run(&ctx, &PmfConfig::default()).await.is_ok());
    }

    #[tokio::test]
    async fn rejects_unknown_value_kinds() {
        let ctx = context("brand__c|Colour");
        let err = run(&ctx, &PmfConfig::default()).await.unwrap_err();
        assert!(err.contains("brand__c|Colour"));
    }
}
