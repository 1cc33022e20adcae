use std::fmt;

use serde::{Deserialize, Serialize};

use super::privacy::should_trigger_privacy_shield;

/// Collective label that replaces every identity under de-escalation.
pub const ANONYMOUS_LABEL: &str = "Brigade";

/// How the kernel treats identity fields.
///
/// This is an input, never self-transitioning. The privacy shield can raise
/// the *effective* level, see [`effective_level`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityLevel {
    /// Full transparency: names and roles are shown.
    #[default]
    Standard,
    /// Individuals disappear behind the brigade.
    DeEscalated,
}

impl SecurityLevel {
    /// Every level, for iteration.
    pub const ALL: [SecurityLevel; 2] = [SecurityLevel::Standard, SecurityLevel::DeEscalated];

    /// True when identities are hidden.
    pub fn is_shield_active(&self) -> bool {
        matches!(self, SecurityLevel::DeEscalated)
    }

    /// Banner label.
    pub fn display_name(&self) -> &'static str {
        match self {
            SecurityLevel::Standard => "STANDARD",
            SecurityLevel::DeEscalated => "DE-ESCALATION",
        }
    }
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}


/// Total replacement: the original string never leaks, not even in part.
pub fn anonymize(name: &str, level: SecurityLevel) -> String {
    match level {
        SecurityLevel::Standard => name.to_string(),
        SecurityLevel::DeEscalated => ANONYMOUS_LABEL.to_string(),
    }
}


/// Escalate Standard to DeEscalated while the privacy shield is up. An
/// explicit DeEscalated input is never downgraded.
pub fn effective_level(requested: SecurityLevel, admin_requests: u64) -> SecurityLevel {
    if should_trigger_privacy_shield(admin_requests) {
        SecurityLevel::DeEscalated
    } else {
        requested
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_two_levels() {
        assert_eq!(SecurityLevel::ALL.len(), 2);
        assert!(SecurityLevel::ALL.contains(&SecurityLevel::Standard));
        assert!(SecurityLevel::ALL.contains(&SecurityLevel::DeEscalated));
    }

    #[test]
    fn shield_follows_level() {
        assert!(SecurityLevel::DeEscalated.is_shield_active());
        assert!(!SecurityLevel::Standard.is_shield_active());
    }

    #[test]
    fn serde_round_trip() {
        let json = serde_json::to_string(&SecurityLevel::DeEscalated).unwrap();
        assert_eq!(json, "\"de_escalated\"");
        let back: SecurityLevel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, SecurityLevel::DeEscalated);
    }

    #[test]
    fn standard_shows_real_name() {
        assert_eq!(anonymize("Klaus", SecurityLevel::Standard), "Klaus");
    }

    #[test]
    fn de_escalation_always_brigade() {
        for name in ["Klaus", "Harry Meier", "Andreas", "Maria", "Chef-Spezial"] {
            let out = anonymize(name, SecurityLevel::DeEscalated);
            assert_eq!(out, "Brigade");
            assert!(!out.contains(name), "'{name}' leaked into '{out}'");
        }
    }

    #[test]
    fn escalation_rule() {
        assert_eq!(effective_level(SecurityLevel::Standard, 10), SecurityLevel::Standard);
        assert_eq!(effective_level(SecurityLevel::Standard, 100), SecurityLevel::DeEscalated);
        assert_eq!(effective_level(SecurityLevel::DeEscalated, 0), SecurityLevel::DeEscalated);
        assert_eq!(effective_level(SecurityLevel::DeEscalated, 200), SecurityLevel::DeEscalated);
    }
}
