//! Sealed archive records (`^ARCHIVE.<id>.*`).

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use super::status::TaskStatus;
use crate::namespace::path::{id_segment, GlobalPath, Namespace};
use crate::namespace::value::StoreValue;

// Field names under `^ARCHIVE.<id>`.
pub const FIELD_TITLE: &str = "TITLE";
pub const FIELD_TIME: &str = "TIME";
pub const FIELD_ROLE: &str = "ROLE";
pub const FIELD_MEDICAL: &str = "MEDICAL_SNAPSHOT";
pub const FIELD_SOP: &str = "SOP_REFERENCE";
pub const FIELD_ACCEPTED_AT: &str = "ABGENOMMEN";
pub const FIELD_ACCEPTED_BY: &str = "ABGENOMMEN_VON";

/// Archive fields that carry a role and are anonymized on de-escalation.
pub const ROLE_FIELDS: [&str; 2] = [FIELD_ROLE, FIELD_ACCEPTED_BY];

/// Field names that would hold personal data. None of them may ever appear
/// under `^ARCHIVE`.
pub const FORBIDDEN_FIELDS: [&str; 2] = ["USER", "NAME"];

/// A sealed task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    pub id: String,
    pub title: String,
    /// Hour window of completion, e.g. `14:00-14:59`.
    pub time_window: String,
    pub role: String,
    pub medical: String,
    pub sop: String,
    pub accepted_at: Option<String>,
    pub accepted_by: Option<String>,
}


fn field(snapshot: &HashMap<String, StoreValue>, id: &str, name: &str) -> Option<String> {
    snapshot
        .get(GlobalPath::archive(id, name).as_str())
        .and_then(StoreValue::as_str)
        .map(str::to_string)
}

impl ArchiveEntry {
    /// Rebuild one record. A record exists iff its TITLE does.
    pub fn from_snapshot(
        id: &str,
        snapshot: &HashMap<String, StoreValue>,
        default_role: &str,
    ) -> Option<ArchiveEntry> {
        let title = field(snapshot, id, FIELD_TITLE)?;
        Some(ArchiveEntry {
            id: id.to_string(),
            title,
            time_window: field(snapshot, id, FIELD_TIME).unwrap_or_default(),
            role: field(snapshot, id, FIELD_ROLE).unwrap_or_else(|| default_role.to_string()),
            medical: field(snapshot, id, FIELD_MEDICAL).unwrap_or_default(),
            sop: field(snapshot, id, FIELD_SOP).unwrap_or_default(),
            accepted_at: field(snapshot, id, FIELD_ACCEPTED_AT),
            accepted_by: field(snapshot, id, FIELD_ACCEPTED_BY),
        })
    }

    /// Done until stamped, Accepted afterwards.
    pub fn status(&self) -> TaskStatus {
        if self.accepted_at.is_some() {
            TaskStatus::Accepted
        } else {
            TaskStatus::Done
        }
    }
}


/// Ids of sealed records, newest-looking first (descending string order).
pub fn archive_ids(snapshot: &HashMap<String, StoreValue>) -> Vec<String> {
    let suffix = format!(".{FIELD_TITLE}");
    let ids: BTreeSet<String> = snapshot
        .keys()
        .filter(|k| k.ends_with(&suffix))
        .filter_map(|k| id_segment(k, Namespace::Archive))
        .map(str::to_string)
        .collect();
    ids.into_iter().rev().collect()
}


/// Every sealed record, ids descending.
pub fn archive_from_snapshot(
    snapshot: &HashMap<String, StoreValue>,
    default_role: &str,
) -> Vec<ArchiveEntry> {
    archive_ids(snapshot)
        .iter()
        .filter_map(|id| ArchiveEntry::from_snapshot(id, snapshot, default_role))
        .collect()
}


/// Archive keys whose last segment names a personal-data field.
pub fn personal_data_keys(snapshot: &HashMap<String, StoreValue>) -> Vec<String> {
    let mut keys: Vec<String> = snapshot
        .keys()
        .filter(|k| Namespace::of(k) == Some(Namespace::Archive))
        .filter(|k| {
            k.rsplit('.')
                .next()
                .is_some_and(|last| FORBIDDEN_FIELDS.contains(&last))
        })
        .cloned()
        .collect();
    keys.sort();
    keys
}
