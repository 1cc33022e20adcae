//! Guard policies: security level, fatigue, privacy shield, brigade load.
//!
//! Every evaluator here is stateless. [`evaluate`] bundles them into a
//! [`GuardReport`] that presentation and export both consume.

pub mod fatigue;
pub mod privacy;
pub mod report;
pub mod security;

pub use fatigue::{validate_task_action, FatigueLevel, TaskValidation};
pub use privacy::{
    apply_jitter, apply_load_jitter, is_priority_shielded, should_trigger_privacy_shield,
    LOAD_JITTER, PRIVACY_SHIELD_THRESHOLD,
};
pub use report::{brigade_load, evaluate, GuardReport};
pub use security::{anonymize, effective_level, SecurityLevel, ANONYMOUS_LABEL};
