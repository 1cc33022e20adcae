use std::sync::Arc;

use super::archive::{
    ArchiveEntry, FIELD_ACCEPTED_AT, FIELD_ACCEPTED_BY, FIELD_MEDICAL, FIELD_ROLE, FIELD_SOP,
    FIELD_TIME, FIELD_TITLE,
};
use super::model::{tasks_from_snapshot, Task};
use super::status::TaskStatus;
use crate::clock::hour_window;
use crate::config::KernelConfig;
use crate::error::KernelError;
use crate::namespace::path::{task_prefix, GlobalPath};
use crate::namespace::Store;

/// Title recorded when a sealed task had none.
const UNKNOWN_TITLE: &str = "UNBEKANNT";
/// Pin value recorded when a sealed task had none.
const NO_PIN: &str = "N/A";
/// Screen the navigation collaborator shows after a seal.
const AFTER_SEAL_LOCATION: &str = "BRIGADE_SELECT";

/// Drives tasks through `Open -> InProgress -> Done -> Accepted`.
///
/// Every rejection is logged and leaves the store untouched: all paths are
/// validated and all preconditions checked before the first write.
pub struct TaskLifecycle {
    store: Arc<Store>,
    default_weight: i64,
    default_role: String,
    acceptance_role: String,
}

impl TaskLifecycle {
    /// Build a lifecycle over `store`, taking labels and defaults from `config`.
    pub fn new(store: Arc<Store>, config: &KernelConfig) -> Self {
        TaskLifecycle {
            store,
            default_weight: config.default_weight,
            default_role: config.default_role.clone(),
            acceptance_role: config.acceptance_role.clone(),
        }
    }

    /// The store this lifecycle writes to.
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    fn check_id(id: &str) -> Result<(), KernelError> {
        let ok = !id.is_empty()
            && !id.contains('.')
            && GlobalPath::task(id, FIELD_TITLE).is_valid();
        if ok {
            Ok(())
        } else {
            tracing::warn!(task = id, "rejected invalid task id");
            Err(KernelError::validation(&task_prefix(id)))
        }
    }

    /// Create an Open task.
    ///
    /// Writes TITLE, CREATED, WEIGHT and only then STATUS: the recompute
    /// triggered by the status write must already see the weight.
    pub fn create(&self, id: &str, title: &str, weight: i64) -> Result<(), KernelError> {
        self.create_with_pins(id, title, weight, None, None)
    }

    /// Create an Open task carrying medical/HACCP and SOP pins.
    ///
    /// An id that already has an archive record is rejected: sealing it a
    /// second time would rewrite that record.
    pub fn create_with_pins(
        &self,
        id: &str,
        title: &str,
        weight: i64,
        medical: Option<&str>,
        sop: Option<&str>,
    ) -> Result<(), KernelError> {
        Self::check_id(id)?;
        if self.is_archived(id) {
            tracing::warn!(task = id, "create on archived id");
            return Err(KernelError::archived(id));
        }
        let now = self.store.now();

        self.store.set(GlobalPath::task(id, "TITLE"), title);
        self.store.set(GlobalPath::task(id, "CREATED"), now);
        self.store.set(GlobalPath::task(id, "WEIGHT"), weight);
        if let Some(medical) = medical {
            self.store.set(GlobalPath::task(id, "PINS.MEDICAL"), medical);
        }
        if let Some(sop) = sop {
            self.store.set(GlobalPath::task(id, "PINS.SOP"), sop);
        }
        self.store
            .set(GlobalPath::task(id, "STATUS"), TaskStatus::Open.storage_value());

        tracing::info!(task = id, title, weight, "task created");
        Ok(())
    }

    /// Current status: from `^TASK` while active, from `^ARCHIVE` once sealed.
    pub fn status(&self, id: &str) -> Option<TaskStatus> {
        if let Some(raw) = self.store.get::<String>(GlobalPath::task(id, "STATUS")) {
            return Some(TaskStatus::from_storage(&raw));
        }
        self.archived(id).map(|entry| entry.status())
    }

    /// True once `^ARCHIVE.<id>` holds a sealed record.
    fn is_archived(&self, id: &str) -> bool {
        self.store
            .get_value(GlobalPath::archive(id, FIELD_TITLE))
            .is_some()
    }

    fn archived(&self, id: &str) -> Option<ArchiveEntry> {
        if !GlobalPath::archive(id, FIELD_TITLE).is_valid() {
            return None;
        }
        ArchiveEntry::from_snapshot(id, &self.store.snapshot(), &self.default_role)
    }

    /// Move a task to `target`. Returns the new status.
    pub fn transition(&self, id: &str, target: TaskStatus) -> Result<TaskStatus, KernelError> {
        Self::check_id(id)?;
        let Some(current) = self.status(id) else {
            tracing::warn!(task = id, to = %target, "transition on unknown task");
            return Err(KernelError::not_found(id));
        };
        if !current.can_transition_to(target) {
            tracing::warn!(task = id, from = %current, to = %target, "transition rejected");
            return Err(KernelError::InvalidTransition {
                id: id.to_string(),
                from: current,
                to: target,
            });
        }

        match target {
            TaskStatus::Open | TaskStatus::InProgress => {
                self.store
                    .set(GlobalPath::task(id, "STATUS"), target.storage_value());
            }
            TaskStatus::Done => {
                self.seal_to_archive(id)?;
            }
            TaskStatus::Accepted => self.stamp_acceptance(id),
        }
        tracing::info!(task = id, from = %current, to = %target, "transition");
        Ok(target)
    }

    /// Role of the acting user, never the user's name.
    fn acting_role(&self) -> String {
        self.store
            .get::<String>(GlobalPath::nav("ACTIVE_USER"))
            .filter(|user| !user.is_empty() && !user.contains('.'))
            .and_then(|user| self.store.get::<String>(GlobalPath::brigade(&user, "ROLE")))
            .unwrap_or_else(|| self.default_role.clone())
    }

    /// Seal an active task into `^ARCHIVE` and clear its working subtree.
    ///
    /// The archive gets the title, an hour window instead of a timestamp, the
    /// acting role, and the medical/SOP pins. The navigation collaborator is
    /// pointed back at brigade selection.
    pub fn seal_to_archive(&self, id: &str) -> Result<ArchiveEntry, KernelError> {
        Self::check_id(id)?;
        let prefix = task_prefix(id);
        if self.store.keys_with_prefix(&prefix).is_empty() {
            tracing::warn!(task = id, "seal on unknown task");
            return Err(KernelError::not_found(id));
        }
        if self.is_archived(id) {
            tracing::warn!(task = id, "seal over existing archive record");
            return Err(KernelError::archived(id));
        }

        let entry = ArchiveEntry {
            id: id.to_string(),
            title: self
                .store
                .get::<String>(GlobalPath::task(id, "TITLE"))
                .unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            time_window: hour_window(self.store.now()),
            role: self.acting_role(),
            medical: self
                .store
                .get::<String>(GlobalPath::task(id, "PINS.MEDICAL"))
                .unwrap_or_else(|| NO_PIN.to_string()),
            sop: self
                .store
                .get::<String>(GlobalPath::task(id, "PINS.SOP"))
                .unwrap_or_else(|| NO_PIN.to_string()),
            accepted_at: None,
            accepted_by: None,
        };

        self.store.set(GlobalPath::archive(id, FIELD_TITLE), entry.title.as_str());
        self.store.set(GlobalPath::archive(id, FIELD_TIME), entry.time_window.as_str());
        self.store.set(GlobalPath::archive(id, FIELD_ROLE), entry.role.as_str());
        self.store.set(GlobalPath::archive(id, FIELD_MEDICAL), entry.medical.as_str());
        self.store.set(GlobalPath::archive(id, FIELD_SOP), entry.sop.as_str());

        self.store.kill_tree(&prefix);

        self.store.set(GlobalPath::nav("LOCATION"), AFTER_SEAL_LOCATION);
        self.store.increment(GlobalPath::nav("ARCHIVE_REVISION"), 1);

        tracing::info!(task = id, window = %entry.time_window, role = %entry.role, "task sealed");
        Ok(entry)
    }

    fn stamp_acceptance(&self, id: &str) {
        let window = hour_window(self.store.now());
        self.store
            .set(GlobalPath::archive(id, FIELD_ACCEPTED_AT), window.as_str());
        self.store.set(
            GlobalPath::archive(id, FIELD_ACCEPTED_BY),
            self.acceptance_role.as_str(),
        );
    }

    /// Shorthand for `transition(id, Accepted)`.
    pub fn accept(&self, id: &str) -> Result<TaskStatus, KernelError> {
        self.transition(id, TaskStatus::Accepted)
    }

    /// All active tasks, ordered by id.
    pub fn tasks(&self) -> Vec<Task> {
        tasks_from_snapshot(&self.store.snapshot(), self.default_weight, self.store.now())
    }

    /// One active task, if `^TASK.<id>` holds a complete record.
    pub fn task(&self, id: &str) -> Option<Task> {
        Task::from_snapshot(id, &self.store.snapshot(), self.default_weight, self.store.now())
    }

    /// Sealed records, ids descending.
    pub fn archive(&self) -> Vec<ArchiveEntry> {
        super::archive::archive_from_snapshot(&self.store.snapshot(), &self.default_role)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;

    fn setup() -> (Arc<Store>, TaskLifecycle) {
        let config = KernelConfig {
            rng_seed: Some(9),
            ..KernelConfig::default()
        };
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 14, 23, 45).unwrap();
        let store = Arc::new(Store::new(&config, Arc::new(ManualClock::new(start))));
        let lifecycle = TaskLifecycle::new(store.clone(), &config);
        (store, lifecycle)
    }

    #[test]
    fn create_yields_one_open_task() {
        let (_, lc) = setup();
        lc.create("001", "Matjes", 5).unwrap();
        let tasks = lc.tasks();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, "001");
        assert_eq!(tasks[0].weight, 5);
        assert_eq!(tasks[0].status, TaskStatus::Open);
    }

    #[test]
    fn status_write_sees_weight() {
        let (store, lc) = setup();
        store.set("^BRIGADE.H.NAME", "Harry");
        let rx = store.subscribe();
        lc.create("001", "Matjes", 20).unwrap();
        let points: Vec<_> = rx.try_iter().collect();
        assert_eq!(points.len(), 4);
        // Before STATUS nothing is open; after it the full weight counts.
        assert!(points[2].score <= 5);
        assert!(points[3].score >= 95);
    }

    #[test]
    fn create_with_pins_and_defaults() {
        let (_, lc) = setup();
        lc.create_with_pins("001", "Matjes", 5, Some("ALLERGEN: D"), Some("12h < 4C"))
            .unwrap();
        let t = lc.task("001").unwrap();
        assert_eq!(t.medical.as_deref(), Some("ALLERGEN: D"));
        assert_eq!(t.sop.as_deref(), Some("12h < 4C"));
    }

    #[test]
    fn create_rejects_bad_ids_without_writing() {
        let (store, lc) = setup();
        for bad in ["", "a b", "a.b"] {
            assert!(matches!(lc.create(bad, "x", 1), Err(KernelError::Validation { .. })));
        }
        assert!(store.is_empty());
    }

    #[test]
    fn seal_moves_task_into_archive() {
        let (store, lc) = setup();
        store.set("^BRIGADE.HARRY.NAME", "Harry Meier");
        store.set("^BRIGADE.HARRY.ROLE", "Gardemanger");
        store.set("^NAV.ACTIVE_USER", "HARRY");
        lc.create_with_pins("001", "Matjes", 5, Some("BE: 0.1"), None).unwrap();

        let entry = lc.seal_to_archive("001").unwrap();
        assert_eq!(entry.role, "Gardemanger");

        assert!(store.keys_with_prefix("^TASK.001").is_empty());
        assert_eq!(store.get::<String>("^ARCHIVE.001.TITLE").as_deref(), Some("Matjes"));
        assert_eq!(store.get::<String>("^ARCHIVE.001.TIME").as_deref(), Some("14:00-14:59"));
        assert_eq!(store.get::<String>("^ARCHIVE.001.ROLE").as_deref(), Some("Gardemanger"));
        assert_eq!(store.get::<String>("^ARCHIVE.001.MEDICAL_SNAPSHOT").as_deref(), Some("BE: 0.1"));
        assert_eq!(store.get::<String>("^ARCHIVE.001.SOP_REFERENCE").as_deref(), Some("N/A"));
        assert_eq!(store.get::<String>("^NAV.LOCATION").as_deref(), Some("BRIGADE_SELECT"));
        assert_eq!(store.get::<i64>("^NAV.ARCHIVE_REVISION"), Some(1));

        let archive_keys = store.keys_with_prefix("^ARCHIVE");
        assert!(archive_keys.iter().all(|k| !k.ends_with(".USER") && !k.ends_with(".NAME")));
        for key in &archive_keys {
            let value = store.get_value(key).unwrap().to_string();
            assert!(!value.contains("Harry"), "{key} leaks a name: {value}");
        }
    }

    #[test]
    fn seal_without_active_user_uses_default_role() {
        let (_, lc) = setup();
        lc.create("002", "Fond", 10).unwrap();
        let entry = lc.seal_to_archive("002").unwrap();
        assert_eq!(entry.role, "Brigade");
    }

    #[test]
    fn seal_unknown_task_is_not_found() {
        let (store, lc) = setup();
        assert!(matches!(lc.seal_to_archive("404"), Err(KernelError::NotFound { .. })));
        assert!(store.is_empty());
    }

    #[test]
    fn seal_leaves_neighbouring_ids_alone() {
        let (store, lc) = setup();
        lc.create("1", "a", 1).unwrap();
        lc.create("10", "b", 1).unwrap();
        lc.seal_to_archive("1").unwrap();
        assert_eq!(store.get::<String>("^TASK.10.TITLE").as_deref(), Some("b"));
    }

    #[test]
    fn archived_id_cannot_be_created_again() {
        let (store, lc) = setup();
        lc.create("001", "Matjes", 5).unwrap();
        lc.transition("001", TaskStatus::Done).unwrap();
        lc.accept("001").unwrap();
        let before = store.snapshot();

        let err = lc.create("001", "Fond", 10).unwrap_err();
        assert!(matches!(err, KernelError::Archived { .. }));
        assert_eq!(store.snapshot(), before);
        assert_eq!(store.get::<String>("^ARCHIVE.001.TITLE").as_deref(), Some("Matjes"));
        assert_eq!(lc.status("001"), Some(TaskStatus::Accepted));
    }

    #[test]
    fn seal_never_rewrites_an_archive_record() {
        let (store, lc) = setup();
        lc.create("001", "Matjes", 5).unwrap();
        lc.transition("001", TaskStatus::Done).unwrap();
        lc.accept("001").unwrap();

        // Active keys written around the lifecycle, e.g. by a restore.
        store.set("^TASK.001.TITLE", "Fond");
        store.set("^TASK.001.STATUS", "OPEN");
        let err = lc.transition("001", TaskStatus::Done).unwrap_err();
        assert!(matches!(err, KernelError::Archived { .. }));
        assert!(matches!(lc.seal_to_archive("001"), Err(KernelError::Archived { .. })));

        assert_eq!(store.get::<String>("^ARCHIVE.001.TITLE").as_deref(), Some("Matjes"));
        assert_eq!(store.get::<String>("^TASK.001.TITLE").as_deref(), Some("Fond"));
        assert_eq!(lc.status("001"), Some(TaskStatus::Open));
    }

    #[test]
    fn huge_weights_do_not_overflow() {
        let (store, lc) = setup();
        lc.create("A", "x", i64::MAX).unwrap();
        lc.create("B", "y", i64::MAX).unwrap();
        assert!(store.score() >= 95);
        assert_eq!(lc.tasks().len(), 2);
    }

    #[test]
    fn full_path_to_accepted() {
        let (store, lc) = setup();
        lc.create("001", "Matjes", 5).unwrap();
        assert_eq!(lc.transition("001", TaskStatus::InProgress).unwrap(), TaskStatus::InProgress);
        assert_eq!(store.get::<String>("^TASK.001.STATUS").as_deref(), Some("IN_ARBEIT"));
        assert_eq!(lc.transition("001", TaskStatus::Done).unwrap(), TaskStatus::Done);
        assert_eq!(lc.status("001"), Some(TaskStatus::Done));
        assert_eq!(lc.accept("001").unwrap(), TaskStatus::Accepted);
        assert_eq!(lc.status("001"), Some(TaskStatus::Accepted));
        assert_eq!(store.get::<String>("^ARCHIVE.001.ABGENOMMEN").as_deref(), Some("14:00-14:59"));
        assert_eq!(store.get::<String>("^ARCHIVE.001.ABGENOMMEN_VON").as_deref(), Some("Commander"));
    }

    #[test]
    fn fast_path_open_to_done() {
        let (_, lc) = setup();
        lc.create("001", "Matjes", 5).unwrap();
        lc.transition("001", TaskStatus::Done).unwrap();
        assert!(lc.tasks().is_empty());
        assert_eq!(lc.archive().len(), 1);
    }

    #[test]
    fn unknown_task_transition_is_not_found() {
        let (store, lc) = setup();
        let err = lc.transition("404", TaskStatus::InProgress).unwrap_err();
        assert!(matches!(err, KernelError::NotFound { .. }));
        assert!(store.is_empty());
    }

    /// Put task `id` into `status` through legal moves only.
    fn drive(lc: &TaskLifecycle, id: &str, status: TaskStatus) {
        lc.create(id, "Bon", 10).unwrap();
        match status {
            TaskStatus::Open => {}
            TaskStatus::InProgress => {
                lc.transition(id, TaskStatus::InProgress).unwrap();
            }
            TaskStatus::Done => {
                lc.transition(id, TaskStatus::Done).unwrap();
            }
            TaskStatus::Accepted => {
                lc.transition(id, TaskStatus::Done).unwrap();
                lc.transition(id, TaskStatus::Accepted).unwrap();
            }
        }
    }

    #[test]
    fn all_illegal_transitions_leave_store_unchanged() {
        let mut rejected = 0;
        for from in TaskStatus::ALL {
            for to in TaskStatus::ALL {
                if from.can_transition_to(to) {
                    continue;
                }
                let (store, lc) = setup();
                drive(&lc, "T", from);
                let before: HashMap<_, _> = store.snapshot();

                let err = lc.transition("T", to).unwrap_err();
                assert!(
                    matches!(err, KernelError::InvalidTransition { .. }),
                    "{from} -> {to}: {err}"
                );
                assert_eq!(store.snapshot(), before, "{from} -> {to} wrote");
                assert_eq!(lc.status("T"), Some(from));
                rejected += 1;
            }
        }
        assert_eq!(rejected, 12);
    }

    #[test]
    fn all_legal_transitions_succeed() {
        for from in TaskStatus::ALL {
            for to in TaskStatus::ALL {
                if !from.can_transition_to(to) {
                    continue;
                }
                let (_, lc) = setup();
                drive(&lc, "T", from);
                assert_eq!(lc.transition("T", to).unwrap(), to);
                assert_eq!(lc.status("T"), Some(to));
            }
        }
    }
}
