//! Score recomputation.
//!
//! Runs inside the store's critical section after every mutation, so it only
//! ever sees a fully applied write. The jitter is deliberate: the score is a
//! direction, not a measurement.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;

use super::history::{ScoreHistory, ScorePoint};
use crate::config::KernelConfig;
use crate::guard::fatigue::FatigueLevel;
use crate::guard::privacy::apply_jitter;
use crate::namespace::path::{id_segment, GlobalPath, Namespace};
use crate::namespace::value::StoreValue;
use crate::task::model::read_created;

/// Raw status value that counts toward the score.
const OPEN_STATUS: &str = "OPEN";

/// Everything the score depends on, pulled out of the store in one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadInputs {
    pub total_weight: i64,
    pub oldest_open: Option<DateTime<Utc>>,
    pub open_count: usize,
    pub staff_count: usize,
    pub shift_start: Option<DateTime<Utc>>,
}

impl LoadInputs {
    /// Scan `data` once for open tasks, staff and shift start.
    pub fn collect(
        data: &HashMap<String, StoreValue>,
        default_weight: i64,
        now: DateTime<Utc>,
    ) -> LoadInputs {
        let mut total_weight = 0i64;
        let mut oldest_open: Option<DateTime<Utc>> = None;
        let mut open_count = 0usize;
        let mut staff_count = 0usize;

        for (key, value) in data {
            match Namespace::of(key) {
                Some(Namespace::Task) if key.ends_with(".STATUS") => {
                    if value.as_str() != Some(OPEN_STATUS) {
                        continue;
                    }
                    let Some(id) = id_segment(key, Namespace::Task) else {
                        continue;
                    };
                    open_count += 1;
                    let weight = match data.get(GlobalPath::task(id, "WEIGHT").as_str()) {
                        Some(StoreValue::Int(w)) => *w,
                        _ => default_weight,
                    };
                    total_weight = total_weight.saturating_add(weight);
                    let created =
                        read_created(data.get(GlobalPath::task(id, "CREATED").as_str()))
                            .unwrap_or(now);
                    oldest_open = Some(match oldest_open {
                        Some(t) if t <= created => t,
                        _ => created,
                    });
                }
                Some(Namespace::Brigade) if key.ends_with(".NAME") => staff_count += 1,
                _ => {}
            }
        }

        let shift_start = match data.get(GlobalPath::sys("SHIFT_START").as_str()) {
            Some(StoreValue::Timestamp(ts)) => Some(*ts),
            _ => None,
        };

        LoadInputs {
            total_weight,
            oldest_open,
            open_count,
            staff_count,
            shift_start,
        }
    }

    /// Shift fatigue level; no registered shift counts as just started.
    pub fn fatigue(&self, now: DateTime<Utc>) -> FatigueLevel {
        FatigueLevel::check(self.shift_start.unwrap_or(now), now)
    }

    /// Steps 2–5: fatigue factor, capacity, raw load, shift multiplier.
    /// Unbounded and noise-free.
    pub fn base_load(&self, capacity_per_head: i64, now: DateTime<Utc>) -> f64 {
        let hours_on_clock = self
            .oldest_open
            .map(|t| (now - t).num_milliseconds().max(0) as f64 / 3_600_000.0)
            .unwrap_or(0.0);
        let fatigue_factor = 1.0 + hours_on_clock / 10.0;

        let capacity = (self.staff_count.max(1) as f64) * capacity_per_head.max(1) as f64;
        let raw = (self.total_weight as f64 / capacity) * fatigue_factor * 100.0;

        raw * self.fatigue(now).load_multiplier()
    }
}


/// Holds the published score, its history and the jitter source.
#[derive(Debug)]
pub struct ScoreEngine {
    default_weight: i64,
    capacity_per_head: i64,
    rng: StdRng,
    score: u8,
    history: ScoreHistory,
}

impl ScoreEngine {
    /// Create an engine with an empty history.
    pub fn new(config: &KernelConfig, rng: StdRng) -> Self {
        ScoreEngine {
            default_weight: config.default_weight,
            capacity_per_head: config.capacity_per_head,
            rng,
            score: 0,
            history: ScoreHistory::new(config.history_capacity),
        }
    }

    /// Recompute from the current data, publish, and append to history.
    pub fn recompute(&mut self, data: &HashMap<String, StoreValue>, now: DateTime<Utc>) -> ScorePoint {
        let inputs = LoadInputs::collect(data, self.default_weight, now);
        let fatigue = inputs.fatigue(now);
        let load = inputs.base_load(self.capacity_per_head, now);

        let normalized = (load / 100.0).clamp(0.0, 1.0);
        let jittered = apply_jitter(normalized, fatigue.jitter_strength(), &mut self.rng);
        let score = (jittered * 100.0).round().clamp(0.0, 100.0) as u8;

        if let Some(advisory) = fatigue.advisory() {
            tracing::debug!(level = %fatigue, "{advisory}");
        }

        self.score = score;
        let point = ScorePoint {
            timestamp: now,
            score,
        };
        self.history.push(point);
        point
    }

    /// Last published score.
    pub fn score(&self) -> u8 {
        self.score
    }

    /// Published points, oldest first.
    pub fn history(&self) -> &ScoreHistory {
        &self.history
    }
}
