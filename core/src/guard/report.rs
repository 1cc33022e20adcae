//! Guard orchestration.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::fatigue::FatigueLevel;
use super::privacy::{apply_load_jitter, should_trigger_privacy_shield};
use super::security::{anonymize, effective_level, SecurityLevel};
use crate::task::Task;

/// Combined guard verdict. Ephemeral: recomputed per request, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardReport {
    pub security_level: SecurityLevel,
    pub fatigue_level: FatigueLevel,
    /// Share of tasks carrying active load, jittered, in `[0, 1]`.
    pub brigade_load: f64,
    pub force_training_mode: bool,
    pub privacy_shield_active: bool,
    pub jitter_strength: f64,
    pub advisory: Option<String>,
}

impl GuardReport {
    /// One-line status for the terminal header.
    pub fn summary(&self) -> String {
        let mut out = format!(
            "SECURITY: {} | FATIGUE: {} | LOAD: {:.0}% | TRAINING: {} | PRIVACY: {}",
            self.security_level,
            self.fatigue_level,
            self.brigade_load * 100.0,
            if self.force_training_mode { "FORCED" } else { "OFF" },
            if self.privacy_shield_active { "SHIELD" } else { "OPEN" },
        );
        if let Some(advisory) = &self.advisory {
            out.push_str(" | ");
            out.push_str(advisory);
        }
        out
    }

    /// Anonymize under this report's effective level.
    pub fn anonymize(&self, name: &str) -> String {
        anonymize(name, self.security_level)
    }
}


/// Active tasks over all tasks, jittered ±5%. Unweighted, unlike the score.
pub fn brigade_load<R: Rng>(tasks: &[Task], rng: &mut R) -> f64 {
    let ratio = if tasks.is_empty() {
        0.0
    } else {
        let active = tasks.iter().filter(|t| t.status.is_active_load()).count();
        active as f64 / tasks.len() as f64
    };
    apply_load_jitter(ratio, rng)
}


/// Run every guard policy and bundle the result.
pub fn evaluate<R: Rng>(
    tasks: &[Task],
    requested: SecurityLevel,
    shift_start: DateTime<Utc>,
    admin_requests: u64,
    now: DateTime<Utc>,
    rng: &mut R,
) -> GuardReport {
    let fatigue = FatigueLevel::check(shift_start, now);
    GuardReport {
        security_level: effective_level(requested, admin_requests),
        fatigue_level: fatigue,
        brigade_load: brigade_load(tasks, rng),
        force_training_mode: fatigue.force_training_mode(),
        privacy_shield_active: should_trigger_privacy_shield(admin_requests),
        jitter_strength: fatigue.jitter_strength(),
        advisory: fatigue.advisory().map(str::to_string),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskStatus;
    use chrono::Duration;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn task(id: &str, status: TaskStatus) -> Task {
        Task {
            id: id.into(),
            title: "Bon".into(),
            weight: 10,
            created: Utc::now(),
            status,
            medical: None,
            sop: None,
        }
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(5)
    }

    #[test]
    fn shield_escalates_standard() {
        let now = Utc::now();
        let r = evaluate(&[], SecurityLevel::Standard, now, 100, now, &mut rng());
        assert_eq!(r.security_level, SecurityLevel::DeEscalated);
        assert!(r.privacy_shield_active);
        assert_eq!(r.anonymize("Klaus"), "Brigade");
    }

    #[test]
    fn normal_use_does_not_escalate() {
        let now = Utc::now();
        let r = evaluate(&[], SecurityLevel::Standard, now, 10, now, &mut rng());
        assert_eq!(r.security_level, SecurityLevel::Standard);
        assert!(!r.privacy_shield_active);
        assert_eq!(r.anonymize("Klaus"), "Klaus");
        assert!(r.advisory.is_none());
    }

    #[test]
    fn worst_case() {
        let now = Utc::now();
        let r = evaluate(
            &[],
            SecurityLevel::DeEscalated,
            now - Duration::hours(12),
            200,
            now,
            &mut rng(),
        );
        assert_eq!(r.security_level, SecurityLevel::DeEscalated);
        assert_eq!(r.fatigue_level, FatigueLevel::Reset);
        assert!(r.force_training_mode);
        assert!(r.privacy_shield_active);
        assert_eq!(r.jitter_strength, 0.15);
        assert!(r.advisory.is_some());
    }

    #[test]
    fn summary_is_complete() {
        let now = Utc::now();
        let r = evaluate(
            &[],
            SecurityLevel::DeEscalated,
            now - Duration::hours(10),
            100,
            now,
            &mut rng(),
        );
        let s = r.summary();
        for part in ["SECURITY:", "FATIGUE:", "LOAD:", "TRAINING:", "PRIVACY:"] {
            assert!(s.contains(part), "missing {part} in {s}");
        }
        assert!(s.contains("FORCED"));
    }

    #[test]
    fn load_is_unweighted_share_of_active() {
        let tasks = vec![
            task("1", TaskStatus::Open),
            task("2", TaskStatus::InProgress),
            task("3", TaskStatus::Done),
            task("4", TaskStatus::Accepted),
        ];
        let mut r = rng();
        for _ in 0..200 {
            let load = brigade_load(&tasks, &mut r);
            assert!((load - 0.5).abs() <= 0.05 + 1e-9, "{load}");
        }
    }

    #[test]
    fn empty_task_list_load_near_zero() {
        let mut r = rng();
        for _ in 0..200 {
            let load = brigade_load(&[], &mut r);
            assert!((0.0..=0.05 + 1e-9).contains(&load));
        }
    }
}
