//! Cassette file layout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One call made through a port, with what went in and what came back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    /// Position in the recording, assigned by the recorder.
    pub seq: u64,
    /// Port name (`store`, `notifier`, `workflow`).
    pub port: String,
    /// Port method, e.g. `query` or `create_version`.
    pub method: String,
    /// Call arguments.
    pub input: serde_json::Value,
    /// Returned value, using the `{"Ok": ..}` / `{"Err": ..}` convention.
    pub output: serde_json::Value,
}

/// A recorded session for one or more ports.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cassette {
    /// Session name.
    pub name: String,
    /// When the recording finished.
    pub recorded_at: DateTime<Utc>,
    /// Commit of the code that made the recording.
    pub commit: String,
    /// Interactions in call order.
    pub interactions: Vec<Interaction>,
}

impl Cassette {
    /// Interactions belonging to `port`, in recorded order.
    pub fn for_port<'a>(&'a self, port: &'a str) -> impl Iterator<Item = &'a Interaction> + 'a {
        self.interactions.iter().filter(move |i| i.port == port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_cassette() -> Cassette {
        Cassette {
            name: "reconcile-PMF-1".into(),
            recorded_at: Utc::now(),
            commit: "abc123".into(),
            interactions: vec![
                Interaction {
                    seq: 0,
                    port: "store".into(),
                    method: "query".into(),
                    input: json!({"vql": "select id from pmf__c"}),
                    output: json!({"Ok": [{"id": "PMF-1"}]}),
                },
                Interaction {
                    seq: 1,
                    port: "notifier".into(),
                    method: "notify".into(),
                    input: json!({"subject": "s"}),
                    output: json!({"Ok": null}),
                },
            ],
        }
    }

    #[test]
    fn yaml_round_trip() {
        let cassette = sample_cassette();
        let yaml = serde_yaml::to_string(&cassette).expect("serialize");
        let deserialized: Cassette = serde_yaml::from_str(&yaml).expect("deserialize");
        assert_eq!(cassette, deserialized);
    }

    #[test]
    fn for_port_filters_interactions() {
        let cassette = sample_cassette();
        let store: Vec<u64> = cassette.for_port("store").map(|i| i.seq).collect();
        assert_eq!(store, vec![0]);
        assert_eq!(cassette.for_port("workflow").count(), 0);
    }
}
