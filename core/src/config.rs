//! Kernel configuration.
//!
//! Loaded from a YAML file; every field has a default so a partial file (or
//! none at all) is fine. Guard thresholds are deliberately absent: they are
//! constants in [`crate::guard`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::KernelError;
use crate::score::MAX_HISTORY;

/// Tunable kernel settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Number of score points kept for the load curve, at most 50.
    pub history_capacity: usize,
    /// Weight assumed for tasks without a `WEIGHT` field.
    pub default_weight: i64,
    /// Load units one brigade member carries.
    pub capacity_per_head: i64,
    /// Role written to the archive when the acting user has none.
    pub default_role: String,
    /// Role recorded on acceptance.
    pub acceptance_role: String,
    /// Version string stamped into exports.
    pub export_version: String,
    /// Seed for the jitter source. `None` seeds from entropy.
    pub rng_seed: Option<u64>,
    /// Tracing filter used when `RUST_LOG` is unset.
    pub log_filter: Option<String>,
}

impl Default for KernelConfig {
    fn default() -> Self {
        KernelConfig {
            history_capacity: 50,
            default_weight: 10,
            capacity_per_head: 20,
            default_role: "Brigade".into(),
            acceptance_role: "Commander".into(),
            export_version: "Brigade v1.0".into(),
            rng_seed: None,
            log_filter: None,
        }
    }
}

impl KernelConfig {
    /// Read and validate a YAML config file.
    pub fn load(path: &Path) -> Result<KernelConfig, KernelError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse YAML text. Blank input yields the defaults.
    pub fn parse(content: &str) -> Result<KernelConfig, KernelError> {
        if content.trim().is_empty() {
            return Ok(KernelConfig::default());
        }
        let config: KernelConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the kernel cannot run with.
    pub fn validate(&self) -> Result<(), KernelError> {
        if self.history_capacity == 0 || self.history_capacity > MAX_HISTORY {
            return Err(KernelError::Config(format!(
                "history_capacity must be in 1..={MAX_HISTORY}"
            )));
        }
        if self.capacity_per_head <= 0 {
            return Err(KernelError::Config("capacity_per_head must be > 0".into()));
        }
        if self.default_weight < 0 {
            return Err(KernelError::Config("default_weight must be >= 0".into()));
        }
        Ok(())
    }
}
