//! Typed tasks materialized from a store snapshot.
//!
//! Tasks are never stored as objects. They are a projection over the keys
//! under `^TASK.<id>.*`, rebuilt on demand by a pure function.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::status::TaskStatus;
use crate::namespace::path::{id_segment, GlobalPath, Namespace};
use crate::namespace::value::StoreValue;

/// An active task rebuilt from `^TASK.<id>.*`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub weight: i64,
    pub created: DateTime<Utc>,
    pub status: TaskStatus,
    pub medical: Option<String>,
    pub sop: Option<String>,
}


/// Read a creation time stored either as a timestamp or as float/int unix seconds.
pub(crate) fn read_created(value: Option<&StoreValue>) -> Option<DateTime<Utc>> {
    match value? {
        StoreValue::Timestamp(ts) => Some(*ts),
        StoreValue::Float(secs) => {
            let millis = (secs * 1000.0).round() as i64;
            Utc.timestamp_millis_opt(millis).single()
        }
        StoreValue::Int(secs) => Utc.timestamp_opt(*secs, 0).single(),
        _ => None,
    }
}


fn read_str(snapshot: &HashMap<String, StoreValue>, path: GlobalPath) -> Option<String> {
    snapshot
        .get(path.as_str())
        .and_then(StoreValue::as_str)
        .map(str::to_string)
}

impl Task {
    /// Rebuild one task. Returns `None` unless both TITLE and STATUS exist as
    /// strings; every other field falls back to its default.
    pub fn from_snapshot(
        id: &str,
        snapshot: &HashMap<String, StoreValue>,
        default_weight: i64,
        now: DateTime<Utc>,
    ) -> Option<Task> {
        let title = read_str(snapshot, GlobalPath::task(id, "TITLE"))?;
        let status = read_str(snapshot, GlobalPath::task(id, "STATUS"))?;

        let weight = match snapshot.get(GlobalPath::task(id, "WEIGHT").as_str()) {
            Some(StoreValue::Int(w)) => *w,
            _ => default_weight,
        };
        let created = read_created(snapshot.get(GlobalPath::task(id, "CREATED").as_str()))
            .unwrap_or(now);

        Some(Task {
            id: id.to_string(),
            title,
            weight,
            created,
            status: TaskStatus::from_storage(&status),
            medical: read_str(snapshot, GlobalPath::task(id, "PINS.MEDICAL")),
            sop: read_str(snapshot, GlobalPath::task(id, "PINS.SOP")),
        })
    }
}


/// Distinct task ids present under `^TASK`, sorted.
pub fn task_ids(snapshot: &HashMap<String, StoreValue>) -> BTreeSet<String> {
    snapshot
        .keys()
        .filter_map(|k| id_segment(k, Namespace::Task))
        .map(str::to_string)
        .collect()
}


/// All tasks that can be materialized, ordered by id.
pub fn tasks_from_snapshot(
    snapshot: &HashMap<String, StoreValue>,
    default_weight: i64,
    now: DateTime<Utc>,
) -> Vec<Task> {
    task_ids(snapshot)
        .iter()
        .filter_map(|id| Task::from_snapshot(id, snapshot, default_weight, now))
        .collect()
}
