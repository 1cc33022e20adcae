//! Kernel self-check.
//!
//! Re-verifies the guard policy invariants and the current Store state.
//! A failing check is reported, never raised: the kernel keeps running and
//! the operator sees a `ConsistencyWarning`.

mod checks;

use std::fmt;

use rand::Rng;

use crate::config::KernelConfig;
use crate::namespace::Store;

pub use checks::run_checks;

/// Outcome of one self-check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

impl CheckResult {
    /// A passing result.
    pub fn pass(name: &'static str, detail: impl Into<String>) -> Self {
        CheckResult {
            name,
            passed: true,
            detail: detail.into(),
        }
    }

    /// A failing result.
    pub fn fail(name: &'static str, detail: impl Into<String>) -> Self {
        CheckResult {
            name,
            passed: false,
            detail: detail.into(),
        }
    }

    /// Pass if `ok`, fail otherwise.
    pub fn from_condition(name: &'static str, ok: bool, detail: impl Into<String>) -> Self {
        if ok {
            Self::pass(name, detail)
        } else {
            Self::fail(name, detail)
        }
    }
}


/// A failed self-check, as surfaced to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyWarning {
    pub check: &'static str,
    pub detail: String,
}

impl fmt::Display for ConsistencyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.check, self.detail)
    }
}

impl From<&CheckResult> for ConsistencyWarning {
    fn from(result: &CheckResult) -> Self {
        ConsistencyWarning {
            check: result.name,
            detail: result.detail.clone(),
        }
    }
}


/// Failed results as operator warnings, in check order.
pub fn warnings(results: &[CheckResult]) -> Vec<ConsistencyWarning> {
    results
        .iter()
        .filter(|r| !r.passed)
        .map(ConsistencyWarning::from)
        .collect()
}


/// Run every check and log the outcome.
pub fn self_check<R: Rng>(store: &Store, config: &KernelConfig, rng: &mut R) -> Vec<CheckResult> {
    let results = run_checks(store, config, rng);
    for warning in warnings(&results) {
        tracing::warn!(check = warning.check, detail = %warning.detail, "self-check failed");
    }
    let passed = results.iter().filter(|r| r.passed).count();
    tracing::info!(passed, total = results.len(), "self-check complete");
    results
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warnings_only_for_failures() {
        let results = vec![
            CheckResult::pass("a", "ok"),
            CheckResult::fail("b", "broken"),
            CheckResult::from_condition("c", false, "also broken"),
        ];
        let w = warnings(&results);
        assert_eq!(w.len(), 2);
        assert_eq!(w[0].to_string(), "b: broken");
        assert_eq!(w[1].check, "c");
    }
}
