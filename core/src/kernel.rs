//! Composition root. Owns the Store and the services built on it.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::clock::{Clock, SystemClock};
use crate::config::KernelConfig;
use crate::diagnosis::{self, CheckResult};
use crate::error::KernelError;
use crate::export::{ExportFormat, ExportService, SealedExport};
use crate::guard::{evaluate, GuardReport, SecurityLevel};
use crate::namespace::path::id_segment;
use crate::namespace::{GlobalPath, Namespace, Store};
use crate::task::model::read_created;
use crate::task::TaskLifecycle;

/// Banner written to `^SYS.STATUS` at shift start.
pub const STATUS_ONLINE: &str = "KERNEL ONLINE";

/// Weight of each synthetic rush-hour ticket.
pub const RUSH_WEIGHT: i64 = 15;

/// One roster entry under `^BRIGADE.<id>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrigadeMember {
    pub id: String,
    pub name: String,
    pub role: String,
}


/// Owns the store and every service built on it.
pub struct Kernel {
    config: KernelConfig,
    store: Arc<Store>,
    lifecycle: TaskLifecycle,
    export: ExportService,
    rng: Mutex<StdRng>,
}

impl Kernel {
    /// Build a kernel on the system clock.
    pub fn new(config: KernelConfig) -> Result<Kernel, KernelError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Build a kernel on an injected clock. Useful for testing.
    pub fn with_clock(config: KernelConfig, clock: Arc<dyn Clock>) -> Result<Kernel, KernelError> {
        config.validate()?;
        let store = Arc::new(Store::new(&config, clock));
        let lifecycle = TaskLifecycle::new(store.clone(), &config);
        let export = ExportService::new(store.clone(), &config);
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_entropy(),
        };
        tracing::debug!(seeded = config.rng_seed.is_some(), "kernel constructed");
        Ok(Kernel {
            config,
            store,
            lifecycle,
            export,
            rng: Mutex::new(rng),
        })
    }

    /// Configuration the kernel was built with.
    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// The shared store.
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Task lifecycle over the shared store.
    pub fn lifecycle(&self) -> &TaskLifecycle {
        &self.lifecycle
    }

    /// Archive export over the shared store.
    pub fn export(&self) -> &ExportService {
        &self.export
    }

    /// Register the shift start and raise the status banner.
    pub fn start_shift(&self) -> DateTime<Utc> {
        let now = self.store.now();
        self.store.set(GlobalPath::sys("SHIFT_START"), now);
        self.store.set(GlobalPath::sys("STATUS"), STATUS_ONLINE);
        tracing::info!(at = %now.to_rfc3339(), "shift started");
        now
    }

    /// Registered shift start, if any.
    pub fn shift_start(&self) -> Option<DateTime<Utc>> {
        read_created(self.store.get_value(GlobalPath::sys("SHIFT_START")).as_ref())
    }

    /// Current `^SYS.STATUS` banner.
    pub fn status_banner(&self) -> Option<String> {
        self.store.get(GlobalPath::sys("STATUS"))
    }

    /// Add or replace a roster entry.
    pub fn register_member(&self, id: &str, name: &str, role: &str) -> Result<(), KernelError> {
        if id.is_empty() || id.contains('.') || !GlobalPath::brigade(id, "NAME").is_valid() {
            tracing::warn!(member = id, "rejected member id");
            return Err(KernelError::validation(id));
        }
        self.store.set(GlobalPath::brigade(id, "NAME"), name);
        self.store.set(GlobalPath::brigade(id, "ROLE"), role);
        Ok(())
    }

    /// Roster ordered by id.
    pub fn members(&self) -> Vec<BrigadeMember> {
        let mut ids: Vec<String> = self
            .store
            .keys_with_prefix(Namespace::Brigade.as_str())
            .iter()
            .filter(|k| k.ends_with(".NAME"))
            .filter_map(|k| id_segment(k, Namespace::Brigade).map(str::to_string))
            .collect();
        ids.sort();
        ids.dedup();
        ids.into_iter()
            .map(|id| BrigadeMember {
                name: self
                    .store
                    .get(GlobalPath::brigade(&id, "NAME"))
                    .unwrap_or_default(),
                role: self
                    .store
                    .get(GlobalPath::brigade(&id, "ROLE"))
                    .unwrap_or_else(|| self.config.default_role.clone()),
                id,
            })
            .collect()
    }

    /// Point `^NAV.ACTIVE_USER` at a roster member.
    pub fn set_active_user(&self, id: &str) -> Result<(), KernelError> {
        if self.store.get_value(GlobalPath::brigade(id, "NAME")).is_none() {
            tracing::warn!(member = id, "unknown brigade member");
            return Err(KernelError::not_found(id));
        }
        self.store.set(GlobalPath::nav("ACTIVE_USER"), id);
        Ok(())
    }

    /// Id of the acting user.
    pub fn active_user(&self) -> Option<String> {
        self.store.get(GlobalPath::nav("ACTIVE_USER"))
    }

    /// Write the navigation location.
    pub fn goto(&self, location: &str) -> bool {
        self.store.set(GlobalPath::nav("LOCATION"), location)
    }

    /// Current navigation location.
    pub fn location(&self) -> Option<String> {
        self.store.get(GlobalPath::nav("LOCATION"))
    }

    /// Count one administrative data request; returns the new total.
    pub fn record_admin_request(&self) -> u64 {
        let total = self
            .store
            .increment(GlobalPath::sys("ADMIN_REQUESTS"), 1)
            .unwrap_or(0);
        total.max(0) as u64
    }

    /// Admin requests on record.
    pub fn admin_requests(&self) -> u64 {
        self.store
            .get::<i64>(GlobalPath::sys("ADMIN_REQUESTS"))
            .unwrap_or(0)
            .max(0) as u64
    }

    /// Guard evaluation against the live Store. No shift yet counts as fresh.
    pub fn guard_report(&self, level: SecurityLevel) -> GuardReport {
        let now = self.store.now();
        let tasks = self.lifecycle.tasks();
        let shift_start = self.shift_start().unwrap_or(now);
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        evaluate(
            &tasks,
            level,
            shift_start,
            self.admin_requests(),
            now,
            &mut *rng,
        )
    }

    /// Sealed export at `level`, escalated by the recorded admin requests.
    pub fn export_sealed(
        &self,
        format: ExportFormat,
        level: SecurityLevel,
    ) -> Result<SealedExport, KernelError> {
        self.export
            .export_sealed(format, level, self.admin_requests())
    }

    /// Flood the board with `count` open tickets `STRESS_0..`.
    pub fn simulate_rush_hour(&self, count: usize) -> Result<Vec<String>, KernelError> {
        let mut ids = Vec::with_capacity(count);
        for i in 0..count {
            let id = format!("STRESS_{i}");
            self.lifecycle
                .create(&id, &format!("RUSH TICKET {i}"), RUSH_WEIGHT)?;
            ids.push(id);
        }
        tracing::info!(count, score = self.store.score(), "rush hour simulated");
        Ok(ids)
    }

    /// Run the self-check against the live store.
    pub fn self_check(&self) -> Vec<CheckResult> {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        diagnosis::self_check(&self.store, &self.config, &mut *rng)
    }
}
