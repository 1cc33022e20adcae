//! Archive export: text, CSV and JSON, redacted before hashing and sealed
//! with a SHA-256 digest after.
//!
//! The seal certifies redacted content only. It can never be used to prove
//! that unredacted personal data once existed.

mod seal;

pub use seal::{content_hash, ExportFormat, SealedExport};

use std::sync::Arc;

use serde::Serialize;

use crate::config::KernelConfig;
use crate::error::KernelError;
use crate::guard::{anonymize, effective_level, SecurityLevel};
use crate::namespace::path::{archive_prefix, in_subtree};
use crate::namespace::Store;
use crate::task::archive::{archive_from_snapshot, archive_ids, ArchiveEntry, ROLE_FIELDS};

const CSV_HEADER: &str = "ID;TITEL;ZEITFENSTER;ROLLE;MEDICAL;SOP";

/// Serializes the archive for auditors.
pub struct ExportService {
    store: Arc<Store>,
    default_role: String,
    version: String,
}


#[derive(Serialize)]
struct JsonMeta<'a> {
    version: &'a str,
    exportiert: String,
    security: &'a str,
    eintraege: usize,
}


#[derive(Serialize)]
struct JsonEntry<'a> {
    id: &'a str,
    titel: &'a str,
    zeitfenster: &'a str,
    rolle: &'a str,
    medical: &'a str,
    sop: &'a str,
}


#[derive(Serialize)]
struct JsonExport<'a> {
    meta: JsonMeta<'a>,
    archiv: Vec<JsonEntry<'a>>,
}


/// Quote a CSV field if it would break the `;`-delimited row.
fn csv_field(raw: &str) -> String {
    if raw.contains([';', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

impl ExportService {
    /// Build an export service over `store`.
    pub fn new(store: Arc<Store>, config: &KernelConfig) -> Self {
        ExportService {
            store,
            default_role: config.default_role.clone(),
            version: config.export_version.clone(),
        }
    }

    /// Archive entries with role-bearing fields already redacted for `level`.
    fn entries(&self, level: SecurityLevel) -> Vec<ArchiveEntry> {
        archive_from_snapshot(&self.store.snapshot(), &self.default_role)
            .into_iter()
            .map(|mut e| {
                e.role = anonymize(&e.role, level);
                e.accepted_by = e.accepted_by.map(|by| anonymize(&by, level));
                e
            })
            .collect()
    }

    /// `key: value` dump of every archive key, ids descending.
    pub fn export_text(&self, level: SecurityLevel, admin_requests: u64) -> String {
        let effective = effective_level(level, admin_requests);
        let snapshot = self.store.snapshot();

        let mut out = String::from("--- BRIGADE HACCP EXPORT ---\n");
        out.push_str(&format!("Timestamp: {}\n", self.store.now().to_rfc3339()));
        out.push_str(&format!("Security: {}\n", effective.display_name()));
        out.push_str("----------------------------\n\n");

        for id in archive_ids(&snapshot) {
            let prefix = archive_prefix(&id);
            let mut keys: Vec<&String> = snapshot.keys().filter(|k| in_subtree(k, &prefix)).collect();
            keys.sort();
            for key in keys {
                let mut value = snapshot[key].to_string();
                let field = key.rsplit('.').next().unwrap_or_default();
                if ROLE_FIELDS.contains(&field) {
                    value = anonymize(&value, effective);
                }
                out.push_str(&format!("{key}: {value}\n"));
            }
        }

        out.push_str("\n--- END OF TRANSMISSION ---");
        out
    }

    /// `;`-separated archive table, ids descending.
    pub fn export_csv(&self, level: SecurityLevel, admin_requests: u64) -> String {
        let effective = effective_level(level, admin_requests);
        let mut out = String::from(CSV_HEADER);
        out.push('\n');
        for e in self.entries(effective) {
            let row = [&e.id, &e.title, &e.time_window, &e.role, &e.medical, &e.sop]
                .map(|f| csv_field(f))
                .join(";");
            out.push_str(&row);
            out.push('\n');
        }
        out
    }

    /// Archive as a `meta` block plus an `archiv` array.
    pub fn export_json(&self, level: SecurityLevel, admin_requests: u64) -> Result<String, KernelError> {
        let effective = effective_level(level, admin_requests);
        let entries = self.entries(effective);
        let doc = JsonExport {
            meta: JsonMeta {
                version: &self.version,
                exportiert: self.store.now().to_rfc3339(),
                security: effective.display_name(),
                eintraege: entries.len(),
            },
            archiv: entries
                .iter()
                .map(|e| JsonEntry {
                    id: &e.id,
                    titel: &e.title,
                    zeitfenster: &e.time_window,
                    rolle: &e.role,
                    medical: &e.medical,
                    sop: &e.sop,
                })
                .collect(),
        };
        Ok(serde_json::to_string_pretty(&doc)?)
    }

    /// Export in `format` and seal the exact emitted text.
    pub fn export_sealed(
        &self,
        format: ExportFormat,
        level: SecurityLevel,
        admin_requests: u64,
    ) -> Result<SealedExport, KernelError> {
        let body = match format {
            ExportFormat::Text => self.export_text(level, admin_requests),
            ExportFormat::Csv => self.export_csv(level, admin_requests),
            ExportFormat::Json => self.export_json(level, admin_requests)?,
        };
        let sealed = SealedExport::seal(format, body);
        tracing::info!(format = %format, digest = %sealed.digest, "archive exported");
        Ok(sealed)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::task::TaskLifecycle;
    use chrono::{TimeZone, Utc};

    fn setup() -> (Arc<Store>, TaskLifecycle, ExportService) {
        let config = KernelConfig {
            rng_seed: Some(3),
            ..KernelConfig::default()
        };
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 11, 30, 0).unwrap();
        let store = Arc::new(Store::new(&config, Arc::new(ManualClock::new(start))));
        store.set("^BRIGADE.HARRY.NAME", "Harry Meier");
        store.set("^BRIGADE.HARRY.ROLE", "Gardemanger");
        store.set("^NAV.ACTIVE_USER", "HARRY");
        let lc = TaskLifecycle::new(store.clone(), &config);
        lc.create_with_pins("001", "Matjes", 5, Some("ALLERGEN: D"), Some("12h; < 4C"))
            .unwrap();
        lc.create("002", "Fond", 10).unwrap();
        lc.seal_to_archive("001").unwrap();
        lc.seal_to_archive("002").unwrap();
        lc.accept("002").unwrap();
        let export = ExportService::new(store.clone(), &config);
        (store, lc, export)
    }

    #[test]
    fn text_lists_archive_keys_descending() {
        let (_, _, ex) = setup();
        let text = ex.export_text(SecurityLevel::Standard, 0);
        assert!(text.starts_with("--- BRIGADE HACCP EXPORT ---"));
        assert!(text.contains("Security: STANDARD"));
        assert!(text.contains("^ARCHIVE.001.ROLE: Gardemanger"));
        assert!(text.contains("^ARCHIVE.002.ABGENOMMEN_VON: Commander"));
        let first = text.find("^ARCHIVE.002.").unwrap();
        let second = text.find("^ARCHIVE.001.").unwrap();
        assert!(first < second);
        assert!(!text.contains("^TASK."));
        assert!(text.ends_with("--- END OF TRANSMISSION ---"));
    }

    #[test]
    fn text_redacts_roles_when_de_escalated() {
        let (_, _, ex) = setup();
        let text = ex.export_text(SecurityLevel::DeEscalated, 0);
        assert!(text.contains("Security: DE-ESCALATION"));
        assert!(text.contains("^ARCHIVE.001.ROLE: Brigade"));
        assert!(text.contains("^ARCHIVE.002.ABGENOMMEN_VON: Brigade"));
        assert!(!text.contains("Gardemanger"));
        assert!(!text.contains("Commander"));
    }

    #[test]
    fn shield_escalates_export() {
        let (_, _, ex) = setup();
        let csv = ex.export_csv(SecurityLevel::Standard, 51);
        assert!(!csv.contains("Gardemanger"));
        let csv = ex.export_csv(SecurityLevel::Standard, 50);
        assert!(csv.contains("Gardemanger"));
    }

    #[test]
    fn csv_layout() {
        let (_, _, ex) = setup();
        let csv = ex.export_csv(SecurityLevel::Standard, 0);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "ID;TITEL;ZEITFENSTER;ROLLE;MEDICAL;SOP");
        assert_eq!(lines[1], "002;Fond;11:00-11:59;Gardemanger;N/A;N/A");
        assert_eq!(lines[2], "001;Matjes;11:00-11:59;Gardemanger;ALLERGEN: D;\"12h; < 4C\"");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn json_layout() {
        let (_, _, ex) = setup();
        let json = ex.export_json(SecurityLevel::DeEscalated, 0).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["meta"]["version"], "Brigade v1.0");
        assert_eq!(v["meta"]["security"], "DE-ESCALATION");
        assert_eq!(v["meta"]["eintraege"], 2);
        assert_eq!(v["archiv"][0]["id"], "002");
        assert_eq!(v["archiv"][1]["titel"], "Matjes");
        assert_eq!(v["archiv"][1]["rolle"], "Brigade");
        assert_eq!(v["archiv"][1]["medical"], "ALLERGEN: D");
        assert_eq!(v["archiv"][1]["zeitfenster"], "11:00-11:59");
    }

    #[test]
    fn sealed_digest_covers_redacted_body() {
        let (_, _, ex) = setup();
        let sealed = ex
            .export_sealed(ExportFormat::Csv, SecurityLevel::DeEscalated, 0)
            .unwrap();
        assert_eq!(sealed.digest, content_hash(&sealed.body));
        assert!(!sealed.body.contains("Gardemanger"));
        let full = sealed.to_string();
        assert!(full.starts_with(&sealed.body));
        assert!(full.ends_with(&format!("\n# SHA-256: {}", sealed.digest)));
    }

    #[test]
    fn empty_archive_exports() {
        let config = KernelConfig::default();
        let store = Arc::new(Store::default());
        let ex = ExportService::new(store, &config);
        assert_eq!(ex.export_csv(SecurityLevel::Standard, 0), "ID;TITEL;ZEITFENSTER;ROLLE;MEDICAL;SOP\n");
        let v: serde_json::Value =
            serde_json::from_str(&ex.export_json(SecurityLevel::Standard, 0).unwrap()).unwrap();
        assert_eq!(v["meta"]["eintraege"], 0);
        assert!(v["archiv"].as_array().unwrap().is_empty());
    }
}
