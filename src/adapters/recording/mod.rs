//! Recording adapters that capture interactions to cassettes.

pub mod notifier;
pub mod store;
pub mod workflow;

pub use notifier::RecordingNotifier;
pub use store::RecordingStore;
pub use workflow::RecordingWorkflowStarter;

use std::sync::PoisonError;

use serde::Serialize;
use serde_json::{json, Value};

use crate::cassette::session::SharedRecorder;

fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| json!({ "unserializable": e.to_string() }))
}

/// Records a `Result` using the Ok/Err JSON convention.
///
/// Mirror of `replaying::replay_result`:
/// - `Ok(v)` is stored as `{"Ok": v}`
/// - `Err(e)` is stored as `{"Err": e.to_string()}`
pub(crate) fn record_result<T, E, I>(
    recorder: &SharedRecorder,
    port: &str,
    method: &str,
    input: &I,
    result: &Result<T, E>,
) where
    T: Serialize,
    E: std::fmt::Display,
    I: Serialize,
{
    let output = match result {
        Ok(v) => json!({ "Ok": to_json(v) }),
        Err(e) => json!({ "Err": e.to_string() }),
    };
    recorder
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .record(port, method, to_json(input), output);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use crate::cassette::recorder::CassetteRecorder;

    #[test]
    fn results_use_ok_err_convention() {
        let path = std::env::temp_dir().join("pmf_artwork_record_result.cassette.yaml");
        let recorder: SharedRecorder = Arc::new(Mutex::new(CassetteRecorder::new(&path, "t", "c")));
        let created: Result<&str, String> = Ok("R1");
        let rejected: Result<String, &str> = Err("INVALID_DATA");
        record_result(&recorder, "store", "create_record", &json!({"object": "x"}), &created);
        record_result(&recorder, "store", "create_record", &json!({}), &rejected);

        let recorder = Arc::try_unwrap(recorder).unwrap().into_inner().unwrap();
        assert_eq!(recorder.len(), 2);
        recorder.finish().unwrap();

        let cassette = crate::cassette::config::CassetteConfig::load_cassette(&path).unwrap();
        assert_eq!(cassette.interactions[0].output, json!({"Ok": "R1"}));
        assert_eq!(cassette.interactions[1].output, json!({"Err": "INVALID_DATA"}));
        let _ = std::fs::remove_file(&path);
    }
}
