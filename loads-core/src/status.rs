use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Keys written by the runner on every event. Pass-through fields may not reuse them.
pub const RESERVED_FIELDS: &[&str] = &[
    "action",
    "timestamp",
    "current_hit",
    "nb_hits",
    "current_user",
    "nb_users",
    "run_id",
    "agent_id",
    "counter",
    "exception",
    "elapsed",
];

/// Progress of a single worker, attached to every event it reports.
///
/// A worker owns its status for its whole lifetime; scenarios only ever see snapshots.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkerStatus {
    pub current_hit: u64,
    pub nb_hits: u64,
    /// 1-based index of the worker inside its phase. `0` outside of any worker.
    pub current_user: usize,
    pub nb_users: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    /// Pass-through identifying fields.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl WorkerStatus {
    /// Status used for run-level events which do not belong to any worker.
    pub fn for_run(run_id: Option<String>, extra: BTreeMap<String, Value>) -> Self {
        Self {
            run_id,
            extra,
            ..Default::default()
        }
    }

    /// Fresh status for worker `current_user` of a phase of `nb_users`, keeping the identifying
    /// fields of `self`.
    pub fn for_worker(&self, current_user: usize, nb_users: usize) -> Self {
        Self {
            current_hit: 0,
            nb_hits: 0,
            current_user,
            nb_users,
            run_id: self.run_id.clone(),
            extra: self.extra.clone(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}
