//! In-memory global store.
//!
//! One mutex guards both the data map and the score engine, so every command
//! is atomic with respect to every other and the score is recomputed inside
//! the same critical section as the write that caused it. Sequences of
//! commands (create, then transition) get no such guarantee.
//!
//! Score points are handed to subscribers after the lock is released.

use std::collections::HashMap;
use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::path::{in_subtree, validate};
use super::value::{FromStoreValue, StoreValue};
use crate::clock::{Clock, SystemClock};
use crate::config::KernelConfig;
use crate::error::KernelError;
use crate::score::{ScoreEngine, ScorePoint};

struct Inner {
    data: HashMap<String, StoreValue>,
    engine: ScoreEngine,
}


/// The shared global store.
pub struct Store {
    inner: Mutex<Inner>,
    subscribers: Mutex<Vec<mpsc::Sender<ScorePoint>>>,
    clock: Arc<dyn Clock>,
}

impl Store {
    /// Jitter is seeded from `config.rng_seed`, or from entropy when unset.
    pub fn new(config: &KernelConfig, clock: Arc<dyn Clock>) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, clock, rng)
    }

    /// Create an empty store with an explicit jitter source.
    pub fn with_rng(config: &KernelConfig, clock: Arc<dyn Clock>, rng: StdRng) -> Self {
        Store {
            inner: Mutex::new(Inner {
                data: HashMap::new(),
                engine: ScoreEngine::new(config, rng),
            }),
            subscribers: Mutex::new(Vec::new()),
            clock,
        }
    }

    /// The injected clock.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Current time from the injected clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn checked(op: &'static str, path: &str) -> bool {
        if validate(path) {
            true
        } else {
            tracing::warn!(op, path, "rejected invalid path");
            false
        }
    }

    /// Run `mutate` and recompute the score under one lock, then publish.
    fn mutate<T>(&self, mutate: impl FnOnce(&mut HashMap<String, StoreValue>) -> T) -> T {
        let (out, point) = {
            let mut inner = self.lock();
            let now = self.clock.now();
            let out = mutate(&mut inner.data);
            let Inner { data, engine } = &mut *inner;
            let point = engine.recompute(data, now);
            (out, point)
        };
        self.publish(point);
        out
    }

    fn publish(&self, point: ScorePoint) {
        let mut subs = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        subs.retain(|tx| tx.send(point).is_ok());
    }

    // -------------------------------------------------------------------
    // Commands
    // -------------------------------------------------------------------

    /// SET. Returns `false` (and logs) if the path is invalid.
    pub fn set(&self, path: impl AsRef<str>, value: impl Into<StoreValue>) -> bool {
        let path = path.as_ref();
        if !Self::checked("set", path) {
            return false;
        }
        let value = value.into();
        let started = Instant::now();
        self.mutate(|data| {
            data.insert(path.to_string(), value);
        });
        tracing::trace!(path, elapsed_ns = started.elapsed().as_nanos() as u64, "set");
        true
    }

    /// GET. Absent, invalid path and wrong type all read as `None`.
    pub fn get<T: FromStoreValue>(&self, path: impl AsRef<str>) -> Option<T> {
        let path = path.as_ref();
        if !Self::checked("get", path) {
            return None;
        }
        self.lock().data.get(path).and_then(T::from_store_value)
    }

    /// Untyped GET.
    pub fn get_value(&self, path: impl AsRef<str>) -> Option<StoreValue> {
        self.get::<StoreValue>(path)
    }

    /// Like [`get_value`](Self::get_value) but reports an invalid path as an
    /// error instead of folding it into absence.
    pub fn try_get(&self, path: impl AsRef<str>) -> Result<Option<StoreValue>, KernelError> {
        let path = path.as_ref();
        if !validate(path) {
            return Err(KernelError::validation(path));
        }
        Ok(self.lock().data.get(path).cloned())
    }

    /// KILL one key. Recomputes even if the key was absent.
    pub fn kill(&self, path: impl AsRef<str>) -> bool {
        let path = path.as_ref();
        if !Self::checked("kill", path) {
            return false;
        }
        self.mutate(|data| data.remove(path).is_some())
    }

    /// KILL a whole subtree as one batch with a single recompute.
    ///
    /// Matches on segment boundaries: `^TASK.1` takes `^TASK.1.*` but leaves
    /// `^TASK.10.*` alone. Returns the number of keys removed.
    pub fn kill_tree(&self, prefix: impl AsRef<str>) -> usize {
        let prefix = prefix.as_ref();
        if !Self::checked("kill_tree", prefix) {
            return 0;
        }
        self.mutate(|data| {
            let before = data.len();
            data.retain(|key, _| !in_subtree(key, prefix));
            before - data.len()
        })
    }

    /// Add `by` to an integer counter in one command. Absent or non-integer
    /// values count as zero. Returns the new value.
    pub fn increment(&self, path: impl AsRef<str>, by: i64) -> Option<i64> {
        let path = path.as_ref();
        if !Self::checked("increment", path) {
            return None;
        }
        let next = self.mutate(|data| {
            let current = match data.get(path) {
                Some(StoreValue::Int(n)) => *n,
                _ => 0,
            };
            let next = current.saturating_add(by);
            data.insert(path.to_string(), StoreValue::Int(next));
            next
        });
        Some(next)
    }

    // -------------------------------------------------------------------
    // Diagnostics and snapshots
    // -------------------------------------------------------------------

    /// All keys, sorted.
    pub fn all_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.lock().data.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Keys in the subtree under `prefix`, sorted.
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .lock()
            .data
            .keys()
            .filter(|k| in_subtree(k, prefix))
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    /// A consistent copy of the whole store.
    pub fn snapshot(&self) -> HashMap<String, StoreValue> {
        self.lock().data.clone()
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.lock().data.len()
    }

    /// True if no key is set.
    pub fn is_empty(&self) -> bool {
        self.lock().data.is_empty()
    }

    // -------------------------------------------------------------------
    // Score
    // -------------------------------------------------------------------

    /// Last published score.
    pub fn score(&self) -> u8 {
        self.lock().engine.score()
    }

    /// Score history, oldest first.
    pub fn history(&self) -> Vec<ScorePoint> {
        self.lock().engine.history().to_vec()
    }

    /// Receive every score point published from now on.
    pub fn subscribe(&self) -> mpsc::Receiver<ScorePoint> {
        let (tx, rx) = mpsc::channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }
}

impl Default for Store {
    fn default() -> Self {
        Store::new(&KernelConfig::default(), Arc::new(SystemClock))
    }
}
