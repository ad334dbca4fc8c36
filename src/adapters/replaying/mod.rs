//! Replaying adapters that serve recorded interactions.

pub mod notifier;
pub mod store;
pub mod workflow;

pub use notifier::ReplayingNotifier;
pub use store::ReplayingStore;
pub use workflow::ReplayingWorkflowStarter;

use std::sync::PoisonError;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::cassette::config::SharedReplayer;
use crate::ports::PortError;

/// Takes the next recorded output for `port` and `method`.
///
/// # Panics
///
/// Panics when no cassette is configured for the port, or when the
/// cassette has no more interactions for the method.
pub(crate) fn next_output(replayer: Option<&SharedReplayer>, port: &str, method: &str) -> Value {
    let Some(replayer) = replayer else {
        panic!("{port} port not configured in CassetteConfig: no cassette loaded for {port}");
    };
    replayer.lock().unwrap_or_else(PoisonError::into_inner).next_interaction(port, method).output
}

/// Decodes an output stored with the Ok/Err convention.
///
/// Mirror of `recording::record_result`.
pub(crate) fn replay_result<T: DeserializeOwned>(output: Value) -> Result<T, PortError> {
    match output {
        Value::Object(mut map) => {
            if let Some(err) = map.remove("Err") {
                let message = err.as_str().map_or_else(|| err.to_string(), str::to_string);
                return Err(message.into());
            }
            let ok = map.remove("Ok").ok_or("recorded output has neither Ok nor Err")?;
            serde_json::from_value(ok).map_err(|e| {
                format!("recorded output does not match the expected type: {e}").into()
            })
        }
        other => Err(format!("recorded output is not an Ok/Err object: {other}").into()),
    }
}
