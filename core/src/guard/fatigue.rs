//! Shift-length fatigue guard (8h warning, 10h reset).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Shift hours at which the warning level starts.
pub const WARNING_HOURS: f64 = 8.0;
/// Shift hours at which training mode is forced.
pub const RESET_HOURS: f64 = 10.0;

/// Shift fatigue, from elapsed time on shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FatigueLevel {
    /// Under 8h.
    Fresh,
    /// 8h up to 10h.
    Warning,
    /// 10h and beyond: forced training mode.
    Reset,
}

impl FatigueLevel {
    /// Every level, for iteration.
    pub const ALL: [FatigueLevel; 3] = [FatigueLevel::Fresh, FatigueLevel::Warning, FatigueLevel::Reset];

    /// Level for `hours` on shift.
    pub fn from_hours(hours: f64) -> FatigueLevel {
        if hours >= RESET_HOURS {
            FatigueLevel::Reset
        } else if hours >= WARNING_HOURS {
            FatigueLevel::Warning
        } else {
            FatigueLevel::Fresh
        }
    }

    /// Level for a shift that started at `shift_start`. A start in the
    /// future counts as zero elapsed time.
    pub fn check(shift_start: DateTime<Utc>, now: DateTime<Utc>) -> FatigueLevel {
        let secs = (now - shift_start).num_seconds().max(0);
        Self::from_hours(secs as f64 / 3600.0)
    }

    /// Only Reset forces training mode.
    pub fn force_training_mode(&self) -> bool {
        matches!(self, FatigueLevel::Reset)
    }

    /// Noise amplitude applied to the load score. Never zero.
    pub fn jitter_strength(&self) -> f64 {
        match self {
            FatigueLevel::Fresh => 0.05,
            FatigueLevel::Warning => 0.10,
            FatigueLevel::Reset => 0.15,
        }
    }

    /// Multiplier on the raw load for long shifts.
    pub fn load_multiplier(&self) -> f64 {
        match self {
            FatigueLevel::Fresh => 1.0,
            FatigueLevel::Warning => 1.15,
            FatigueLevel::Reset => 1.30,
        }
    }

    /// Advisory shown to the brigade; none while fresh.
    pub fn advisory(&self) -> Option<&'static str> {
        match self {
            FatigueLevel::Fresh => None,
            FatigueLevel::Warning => Some(
                "8 hours on shift. Precision drops from here; check insurance cover and hand over critical stations.",
            ),
            FatigueLevel::Reset => Some(
                "10 hours on shift. Training mode engaged; no new critical tasks. A dead craftsman keeps no promises.",
            ),
        }
    }

    /// Upper-case label.
    pub fn as_str(&self) -> &'static str {
        match self {
            FatigueLevel::Fresh => "FRESH",
            FatigueLevel::Warning => "WARNING",
            FatigueLevel::Reset => "RESET",
        }
    }
}

impl fmt::Display for FatigueLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}


/// What the fatigue guard says about taking on work right now.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskValidation {
    pub level: FatigueLevel,
    pub force_training: bool,
    pub jitter_strength: f64,
    pub advisory: Option<String>,
}


/// Fatigue verdict for acting on a task right now.
pub fn validate_task_action(shift_start: DateTime<Utc>, now: DateTime<Utc>) -> TaskValidation {
    let level = FatigueLevel::check(shift_start, now);
    TaskValidation {
        level,
        force_training: level.force_training_mode(),
        jitter_strength: level.jitter_strength(),
        advisory: level.advisory().map(str::to_string),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn hours_ago(h: i64) -> (DateTime<Utc>, DateTime<Utc>) {
        let now = Utc::now();
        (now - Duration::hours(h), now)
    }

    #[test]
    fn thresholds() {
        let (s, n) = hours_ago(7);
        assert_eq!(FatigueLevel::check(s, n), FatigueLevel::Fresh);
        let (s, n) = hours_ago(8);
        assert_eq!(FatigueLevel::check(s, n), FatigueLevel::Warning);
        let (s, n) = hours_ago(9);
        assert_eq!(FatigueLevel::check(s, n), FatigueLevel::Warning);
        let (s, n) = hours_ago(10);
        assert_eq!(FatigueLevel::check(s, n), FatigueLevel::Reset);
        let (s, n) = hours_ago(14);
        assert_eq!(FatigueLevel::check(s, n), FatigueLevel::Reset);
    }

    #[test]
    fn future_shift_start_is_fresh() {
        let now = Utc::now();
        assert_eq!(FatigueLevel::check(now + Duration::hours(3), now), FatigueLevel::Fresh);
    }

    #[test]
    fn only_reset_forces_training() {
        assert!(FatigueLevel::Reset.force_training_mode());
        assert!(!FatigueLevel::Warning.force_training_mode());
        assert!(!FatigueLevel::Fresh.force_training_mode());
    }

    #[test]
    fn jitter_escalates_and_is_never_zero() {
        assert!(FatigueLevel::Fresh.jitter_strength() < FatigueLevel::Warning.jitter_strength());
        assert!(FatigueLevel::Warning.jitter_strength() < FatigueLevel::Reset.jitter_strength());
        for level in FatigueLevel::ALL {
            assert!(level.jitter_strength() > 0.0, "{level} has no jitter");
        }
    }

    #[test]
    fn advisory_only_when_tired() {
        assert!(FatigueLevel::Fresh.advisory().is_none());
        assert!(FatigueLevel::Warning.advisory().is_some());
        assert!(FatigueLevel::Reset.advisory().is_some());
    }

    #[test]
    fn validation_at_ten_hours() {
        let (s, n) = hours_ago(10);
        let v = validate_task_action(s, n);
        assert_eq!(v.level, FatigueLevel::Reset);
        assert!(v.force_training);
        assert_eq!(v.jitter_strength, 0.15);
        assert!(v.advisory.is_some());
    }

    #[test]
    fn eleven_hours_forces_training_with_advisory() {
        let (s, n) = hours_ago(11);
        let v = validate_task_action(s, n);
        assert!(v.force_training);
        assert!(v.advisory.is_some());
    }
}
