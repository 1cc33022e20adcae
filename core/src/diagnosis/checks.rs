use chrono::{DateTime, Utc};
use rand::Rng;

use super::CheckResult;
use crate::config::KernelConfig;
use crate::guard::{
    anonymize, apply_jitter, evaluate, is_priority_shielded, should_trigger_privacy_shield,
    FatigueLevel, SecurityLevel, ANONYMOUS_LABEL,
};
use crate::namespace::{GlobalPath, Store};
use crate::score::MAX_HISTORY;
use crate::task::archive::personal_data_keys;
use crate::task::model::{read_created, tasks_from_snapshot};

const JITTER_SAMPLES: usize = 100;
const PROBE_NAME: &str = "Harry Meier";

fn security_levels() -> CheckResult {
    let n = SecurityLevel::ALL.len();
    CheckResult::from_condition("security_levels", n == 2, format!("{n} levels"))
}


fn shield_on_de_escalation() -> CheckResult {
    let ok = SecurityLevel::DeEscalated.is_shield_active()
        && !SecurityLevel::Standard.is_shield_active();
    CheckResult::from_condition("shield_on_de_escalation", ok, "shield follows de-escalation")
}


fn jitter_bounds<R: Rng>(rng: &mut R) -> CheckResult {
    let base = 0.5;
    let strength = FatigueLevel::Reset.jitter_strength();
    let mut worst: f64 = 0.0;
    let mut clamped = true;
    for _ in 0..JITTER_SAMPLES {
        worst = worst.max((apply_jitter(base, strength, rng) - base).abs());
        let edge = apply_jitter(1.0, strength, rng);
        clamped &= (0.0..=1.0).contains(&edge);
    }
    let ok = clamped && worst <= strength + 1e-9;
    CheckResult::from_condition(
        "jitter_bounds",
        ok,
        format!("max deviation {worst:.3} of {strength:.2}, clamped: {clamped}"),
    )
}


fn anonymization() -> CheckResult {
    let hidden = anonymize(PROBE_NAME, SecurityLevel::DeEscalated);
    let shown = anonymize(PROBE_NAME, SecurityLevel::Standard);
    CheckResult::from_condition(
        "anonymization",
        hidden == ANONYMOUS_LABEL && shown == PROBE_NAME,
        format!("de-escalated -> {hidden}"),
    )
}


fn shield_threshold() -> CheckResult {
    let ok = !should_trigger_privacy_shield(50) && should_trigger_privacy_shield(51);
    CheckResult::from_condition("shield_threshold", ok, "50 open, 51 shielded")
}


fn allergen_transparency() -> CheckResult {
    CheckResult::from_condition(
        "allergen_transparency",
        !is_priority_shielded("Allergen"),
        "allergen steps stay visible",
    )
}


fn fatigue_levels() -> CheckResult {
    let got = [
        FatigueLevel::from_hours(0.0),
        FatigueLevel::from_hours(9.0),
        FatigueLevel::from_hours(11.0),
    ];
    let ok = got == [FatigueLevel::Fresh, FatigueLevel::Warning, FatigueLevel::Reset];
    CheckResult::from_condition(
        "fatigue_levels",
        ok,
        format!("0h {} / 9h {} / 11h {}", got[0], got[1], got[2]),
    )
}


fn archive_personal_data(store: &Store) -> CheckResult {
    let keys = personal_data_keys(&store.snapshot());
    if keys.is_empty() {
        CheckResult::pass("archive_personal_data", "no personal fields archived")
    } else {
        CheckResult::fail("archive_personal_data", keys.join(", "))
    }
}


fn shift_registered(store: &Store) -> Option<DateTime<Utc>> {
    read_created(store.get_value(GlobalPath::sys("SHIFT_START")).as_ref())
}


fn shift_start(store: &Store) -> CheckResult {
    match shift_registered(store) {
        Some(at) => CheckResult::pass("shift_start", at.to_rfc3339()),
        None => CheckResult::fail("shift_start", "no shift start registered"),
    }
}


fn score_range(store: &Store) -> CheckResult {
    let score = store.score();
    CheckResult::from_condition("score_range", score <= 100, format!("score {score}"))
}


fn history_capacity(store: &Store) -> CheckResult {
    let len = store.history().len();
    CheckResult::from_condition(
        "history_capacity",
        len <= MAX_HISTORY,
        format!("{len}/{MAX_HISTORY}"),
    )
}


fn guard_summary<R: Rng>(store: &Store, config: &KernelConfig, rng: &mut R) -> CheckResult {
    let now = store.now();
    let tasks = tasks_from_snapshot(&store.snapshot(), config.default_weight, now);
    let report = evaluate(
        &tasks,
        SecurityLevel::Standard,
        shift_registered(store).unwrap_or(now),
        0,
        now,
        rng,
    );
    let summary = report.summary();
    let ok = ["SECURITY:", "FATIGUE:", "LOAD:", "TRAINING:", "PRIVACY:"]
        .iter()
        .all(|part| summary.contains(part));
    CheckResult::from_condition("guard_summary", ok, summary)
}


/// Every check, in a fixed order.
pub fn run_checks<R: Rng>(store: &Store, config: &KernelConfig, rng: &mut R) -> Vec<CheckResult> {
    vec![
        security_levels(),
        shield_on_de_escalation(),
        jitter_bounds(rng),
        anonymization(),
        shield_threshold(),
        allergen_transparency(),
        fatigue_levels(),
        archive_personal_data(store),
        shift_start(store),
        score_range(store),
        history_capacity(store),
        guard_summary(store, config, rng),
    ]
}
