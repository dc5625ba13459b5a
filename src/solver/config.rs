//! Solver configuration and cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::separation::CutPolicy;

/// Configuration for [`SolverDriver`](super::SolverDriver).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use u_cvrp::separation::CutPolicy;
/// use u_cvrp::solver::SolverConfig;
///
/// let config = SolverConfig::default()
///     .with_time_limit(Duration::from_secs(30))
///     .with_fleet_size(3)
///     .with_cut_policy(CutPolicy::Both);
/// assert_eq!(config.fleet_size_for(10), 3);
/// assert_eq!(SolverConfig::default().fleet_size_for(10), 9);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Wall-clock budget for one solve.
    pub time_limit: Duration,
    /// Numeric tolerance ε for violation and connectivity tests.
    pub tolerance: f64,
    /// Fleet bound m; `None` allows one vehicle per customer.
    pub fleet_size: Option<usize>,
    /// Which cuts to emit per violated subset.
    pub cut_policy: CutPolicy,
    /// Upper bound on relaxation/separation rounds per search node before
    /// branching.
    pub max_cut_rounds: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(300),
            tolerance: 1e-6,
            fleet_size: None,
            cut_policy: CutPolicy::StrongestOnly,
            max_cut_rounds: 50,
        }
    }
}

impl SolverConfig {
    /// Sets the wall-clock budget.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = limit;
        self
    }

    /// Sets the numeric tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Bounds the number of vehicles leaving the depot.
    pub fn with_fleet_size(mut self, m: usize) -> Self {
        self.fleet_size = Some(m);
        self
    }

    /// Sets the cut emission policy.
    pub fn with_cut_policy(mut self, policy: CutPolicy) -> Self {
        self.cut_policy = policy;
        self
    }

    /// Sets the maximum number of root cutting-plane rounds.
    pub fn with_max_cut_rounds(mut self, rounds: usize) -> Self {
        self.max_cut_rounds = rounds;
        self
    }

    /// Effective fleet bound for an instance with `num_vertices` vertices.
    pub fn fleet_size_for(&self, num_vertices: usize) -> usize {
        self.fleet_size
            .unwrap_or_else(|| num_vertices.saturating_sub(1).max(1))
    }
}

/// Best-effort cancellation flag shared between a caller and a running
/// solve.
///
/// Checked between engine calls; an engine call already in progress is not
/// interrupted.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates an untriggered token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Returns `true` once [`cancel`](Self::cancel) was called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}
