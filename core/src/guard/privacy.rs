//! Privacy shield and jitter.
//!
//! Jitter keeps the kernel's numbers directional: nobody can stopwatch an
//! individual through them.

use rand::Rng;

/// Admin requests tolerated before the shield goes up (strictly greater trips it).
pub const PRIVACY_SHIELD_THRESHOLD: u64 = 50;

/// Amplitude of the brigade-load jitter.
pub const LOAD_JITTER: f64 = 0.05;

/// True once admin requests exceed the threshold.
pub fn should_trigger_privacy_shield(request_count: u64) -> bool {
    request_count > PRIVACY_SHIELD_THRESHOLD
}


/// Add uniform noise in `[-strength, +strength]` and clamp to `[0, 1]`.
pub fn apply_jitter<R: Rng>(value: f64, strength: f64, rng: &mut R) -> f64 {
    let strength = strength.abs();
    let noise = if strength > 0.0 {
        rng.gen_range(-strength..=strength)
    } else {
        0.0
    };
    (value + noise).clamp(0.0, 1.0)
}


/// The fixed ±5% jitter used for the brigade load.
pub fn apply_load_jitter<R: Rng>(value: f64, rng: &mut R) -> f64 {
    apply_jitter(value, LOAD_JITTER, rng)
}


/// Whether a step of the given priority may be hidden by the shield.
///
/// Allergen steps are always visible: a life outranks privacy.
pub fn is_priority_shielded(priority: &str) -> bool {
    !priority.trim().eq_ignore_ascii_case("allergen")
}
