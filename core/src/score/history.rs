use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Hard ceiling on retained score points. Configuration may lower it, never
/// raise it.
pub const MAX_HISTORY: usize = 50;


/// One published score and when it was computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScorePoint {
    pub timestamp: DateTime<Utc>,
    pub score: u8,
}


/// FIFO ring of score points; the oldest point is evicted first.
#[derive(Debug, Clone)]
pub struct ScoreHistory {
    points: VecDeque<ScorePoint>,
    capacity: usize,
}

impl ScoreHistory {
    /// Create an empty ring holding `capacity` points, within `1..=MAX_HISTORY`.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, MAX_HISTORY);
        ScoreHistory {
            points: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append a point, evicting from the front past capacity.
    pub fn push(&mut self, point: ScorePoint) {
        self.points.push_back(point);
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }

    /// Number of retained points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True before the first recompute.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Most recent point.
    pub fn latest(&self) -> Option<&ScorePoint> {
        self.points.back()
    }

    /// Oldest first.
    pub fn to_vec(&self) -> Vec<ScorePoint> {
        self.points.iter().copied().collect()
    }
}
