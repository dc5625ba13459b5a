//! Seam between the formulation and a MIP engine.

use std::fmt;
use std::time::Duration;

use super::CancelToken;
use crate::formulation::{Assignment, MipModel};
use crate::separation::CutSeparator;

/// How an engine run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MipStatus {
    /// The search proved the returned point optimal.
    Optimal,
    /// The budget ran out or the run was cancelled; the returned point is the
    /// best incumbent.
    TimeLimit,
    /// No feasible point exists.
    Infeasible,
    /// The run stopped before any feasible point was known.
    NoSolution,
}

/// Result of [`MipBackend::optimize`].
#[derive(Debug, Clone, PartialEq)]
pub struct MipOutcome {
    /// Termination status.
    pub status: MipStatus,
    /// Best point found, for `Optimal` and `TimeLimit`.
    pub values: Option<Assignment>,
    /// Objective of `values`.
    pub objective: Option<f64>,
    /// Number of separator cuts appended to the model.
    pub cuts_added: usize,
}

impl MipOutcome {
    /// Outcome carrying no point.
    pub fn without_point(status: MipStatus, cuts_added: usize) -> Self {
        Self {
            status,
            values: None,
            objective: None,
            cuts_added,
        }
    }
}

/// Parameters of one engine run.
#[derive(Clone, Copy)]
pub struct OptimizeRequest<'a> {
    /// Wall-clock budget.
    pub time_limit: Duration,
    /// Feasible point to start from.
    pub warm_start: Option<&'a Assignment>,
    /// Cut generator for relaxation points and candidate incumbents.
    pub separator: Option<&'a dyn CutSeparator>,
    /// External stop request.
    pub cancel: Option<&'a CancelToken>,
    /// Maximum relaxation/separation rounds before branching.
    pub max_cut_rounds: usize,
    /// Feasibility tolerance.
    pub tolerance: f64,
}

impl<'a> OptimizeRequest<'a> {
    /// Request with the given budget and nothing else attached.
    pub fn new(time_limit: Duration) -> Self {
        Self {
            time_limit,
            warm_start: None,
            separator: None,
            cancel: None,
            max_cut_rounds: 50,
            tolerance: 1e-6,
        }
    }
}

/// An engine failure not covered by [`MipStatus`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendError {
    message: String,
}

impl BackendError {
    /// Creates an error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Error text.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for BackendError {}

/// A MIP engine able to minimize a [`MipModel`].
///
/// Implementations call `request.separator` on every candidate incumbent and
/// must not accept a point for which it returns cuts.
pub trait MipBackend {
    /// Minimizes `model` under `request`.
    fn optimize(
        &self,
        model: &MipModel,
        request: OptimizeRequest<'_>,
    ) -> Result<MipOutcome, BackendError>;
}
