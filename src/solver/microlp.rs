//! Pure-Rust branch-and-cut backend on top of `good_lp`'s microlp engine.
//!
//! microlp exposes neither callbacks nor a time limit, so the search tree is
//! driven here and the engine only ever solves LP relaxations:
//!
//! 1. Pop a node (a set of fixed binaries) and solve its relaxation. Prune
//!    it if infeasible or bounded by the incumbent.
//! 2. Hand the point to the separator and append every new cut. Re-solve
//!    while cuts keep coming and the round limit allows.
//! 3. An integral point without cuts becomes the incumbent; a fractional one
//!    is split on its most fractional binary.
//!
//! Everything runs on the calling thread. The budget and the cancel token are
//! checked before each relaxation, so a run overshoots its limit by at most
//! one LP solve. On timeout or cancellation the incumbent is returned.

use std::collections::HashSet;
use std::time::Instant;

use good_lp::{
    constraint, microlp, variable, Expression, ProblemVariables, ResolutionError, Solution as _,
    SolverModel, Variable,
};
use tracing::{debug, info, trace, warn};

use super::{BackendError, MipBackend, MipOutcome, MipStatus, OptimizeRequest};
use crate::formulation::{Assignment, LinearExpr, MipModel, Sense, VarKind};
use crate::separation::{Cut, CutKind};

/// Binaries fixed on the path from the root to a node, by variable index.
type Fixings = Vec<(usize, f64)>;

/// Branch-and-cut driven around microlp.
#[derive(Debug, Clone, Copy, Default)]
pub struct MicroLpBackend;

impl MicroLpBackend {
    /// Creates the backend.
    pub fn new() -> Self {
        Self
    }
}

impl MipBackend for MicroLpBackend {
    fn optimize(
        &self,
        model: &MipModel,
        request: OptimizeRequest<'_>,
    ) -> Result<MipOutcome, BackendError> {
        let deadline = Instant::now().checked_add(request.time_limit);
        let tol = request.tolerance;
        let stop = || {
            request.cancel.is_some_and(|c| c.is_cancelled())
                || deadline.is_some_and(|d| Instant::now() >= d)
        };

        let mut incumbent = request.warm_start.and_then(|start| {
            if let Some(reason) = model.first_violation(start, tol) {
                warn!(%reason, "warm start rejected");
                return None;
            }
            if request.separator.is_some_and(|sep| !sep.separate(start).is_empty()) {
                warn!("warm start violates a separated cut; rejected");
                return None;
            }
            Some((start.clone(), model.objective_value(start)))
        });

        let mut working = model.clone();
        let mut seen = HashSet::new();
        let mut cuts_added = 0;
        let mut nodes: Vec<Fixings> = vec![Vec::new()];
        let mut explored = 0usize;

        while let Some(fixings) = nodes.pop() {
            explored += 1;
            let mut rounds = 0;
            loop {
                if stop() {
                    warn!(has_incumbent = incumbent.is_some(), explored, "search interrupted");
                    return Ok(match incumbent {
                        Some((values, objective)) => MipOutcome {
                            status: MipStatus::TimeLimit,
                            values: Some(values),
                            objective: Some(objective),
                            cuts_added,
                        },
                        None => MipOutcome::without_point(MipStatus::NoSolution, cuts_added),
                    });
                }

                let Some(point) = solve_relaxation(&working, &fixings)? else {
                    trace!(depth = fixings.len(), "node infeasible");
                    break;
                };
                let bound = working.objective_value(&point);
                if incumbent.as_ref().is_some_and(|(_, best)| bound >= best - tol) {
                    trace!(depth = fixings.len(), bound, "node pruned by bound");
                    break;
                }

                let branch_on = most_fractional(&working, &point, tol);
                let candidate = match branch_on {
                    Some(_) => point,
                    None => snap_integers(&working, point),
                };
                let cuts = request
                    .separator
                    .map_or_else(Vec::new, |sep| sep.separate(&candidate));
                let found = cuts.len();
                let added = append_cuts(&mut working, cuts, &mut seen);
                cuts_added += added;
                if added > 0 {
                    debug!(depth = fixings.len(), round = rounds, added, bound, "cuts appended");
                }

                match branch_on {
                    None if found == 0 => {
                        let value = model.objective_value(&candidate);
                        info!(objective = value, explored, "new incumbent");
                        incumbent = Some((candidate, value));
                        break;
                    }
                    None if added == 0 => {
                        return Err(BackendError::new(
                            "engine returned a point violating a cut already in the model",
                        ));
                    }
                    Some(var) if added == 0 || rounds >= request.max_cut_rounds => {
                        for value in [0.0, 1.0] {
                            let mut child = fixings.clone();
                            child.push((var, value));
                            nodes.push(child);
                        }
                        break;
                    }
                    _ => rounds += 1,
                }
            }
        }

        info!(cuts_added, explored, "search closed");
        Ok(match incumbent {
            Some((values, objective)) => MipOutcome {
                status: MipStatus::Optimal,
                values: Some(values),
                objective: Some(objective),
                cuts_added,
            },
            None => MipOutcome::without_point(MipStatus::Infeasible, cuts_added),
        })
    }
}

/// Appends the cuts not seen before; returns how many were new.
fn append_cuts(
    model: &mut MipModel,
    cuts: Vec<Cut>,
    seen: &mut HashSet<(CutKind, Vec<usize>)>,
) -> usize {
    let mut added = 0;
    for cut in cuts {
        if seen.insert(cut.key()) {
            model.add_constraint(cut.to_constraint());
            added += 1;
        }
    }
    added
}

/// Binary farthest from integrality, lowest index on ties; `None` if every
/// binary is within `tol` of 0 or 1.
fn most_fractional(model: &MipModel, point: &Assignment, tol: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (k, (var, &v)) in model.variables().iter().zip(point.values()).enumerate() {
        if var.kind != VarKind::Binary {
            continue;
        }
        let gap = (v - v.floor()).min(v.ceil() - v);
        if gap > tol && best.map_or(true, |(_, g)| gap > g) {
            best = Some((k, gap));
        }
    }
    best.map(|(k, _)| k)
}

/// Rounds integer variables, which the simplex reports with float noise.
fn snap_integers(model: &MipModel, point: Assignment) -> Assignment {
    let values = point
        .values()
        .iter()
        .zip(model.variables())
        .map(|(&v, var)| match var.kind {
            VarKind::Binary => v.round(),
            VarKind::Continuous => v,
        })
        .collect();
    Assignment::from_values(values)
}

/// Translates the LP relaxation of `model` into good_lp and solves it once.
/// Binaries become continuous on `[0, 1]` unless pinned by `fixings`.
///
/// `Ok(None)` means the relaxation is infeasible.
fn solve_relaxation(
    model: &MipModel,
    fixings: &[(usize, f64)],
) -> Result<Option<Assignment>, BackendError> {
    let mut pinned = vec![None; model.num_variables()];
    for &(k, value) in fixings {
        pinned[k] = Some(value);
    }

    let mut vars = ProblemVariables::new();
    let handles: Vec<Variable> = model
        .variables()
        .iter()
        .zip(&pinned)
        .map(|(v, pin)| {
            let def = match *pin {
                Some(value) => variable().min(value).max(value),
                None => {
                    let def = variable().min(v.lower);
                    match v.upper {
                        Some(upper) => def.max(upper),
                        None => def,
                    }
                }
            };
            vars.add(def)
        })
        .collect();

    let to_expr = |e: &LinearExpr, sign: f64| -> Expression {
        e.terms()
            .iter()
            .map(|&(id, c)| (sign * c) * handles[id.index()])
            .sum()
    };

    let mut problem = vars.minimise(to_expr(model.objective(), 1.0)).using(microlp);
    for row in model.constraints() {
        let c = match row.sense {
            Sense::Le => constraint::leq(to_expr(&row.expr, 1.0), row.rhs),
            Sense::Ge => constraint::leq(to_expr(&row.expr, -1.0), -row.rhs),
            Sense::Eq => constraint::eq(to_expr(&row.expr, 1.0), row.rhs),
        };
        problem = problem.with(c);
    }

    match problem.solve() {
        Ok(solution) => Ok(Some(Assignment::from_values(
            handles.iter().map(|&h| solution.value(h)).collect(),
        ))),
        Err(ResolutionError::Infeasible) => Ok(None),
        Err(ResolutionError::Unbounded) => Err(BackendError::new("model is unbounded")),
        Err(e) => Err(BackendError::new(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::formulation::{LinearConstraint, VarId};
    use crate::separation::CutSeparator;
    use crate::solver::CancelToken;

    const LONG: Duration = Duration::from_secs(60);

    /// max 5a + 4b + 3c  s.t. 2a + 3b + c ≤ 5, binaries.
    fn knapsack() -> (MipModel, [VarId; 3]) {
        let mut m = MipModel::new();
        let a = m.add_binary("a");
        let b = m.add_binary("b");
        let c = m.add_binary("c");
        m.add_constraint(LinearConstraint::new(
            "weight",
            LinearExpr::new().with_term(a, 2.0).with_term(b, 3.0).with_term(c, 1.0),
            Sense::Le,
            5.0,
        ));
        m.set_objective(
            LinearExpr::new()
                .with_term(a, -5.0)
                .with_term(b, -4.0)
                .with_term(c, -3.0),
        );
        (m, [a, b, c])
    }

    /// Lazily forbids choosing both of two binaries.
    struct PairSeparator(VarId, VarId);

    impl CutSeparator for PairSeparator {
        fn separate(&self, assignment: &Assignment) -> Vec<Cut> {
            let lhs = assignment.value(self.0) + assignment.value(self.1);
            if lhs <= 1.0 + 1e-6 {
                return Vec::new();
            }
            vec![Cut {
                kind: CutKind::Plain,
                subset: vec![1, 2],
                arcs: vec![self.0, self.1],
                rhs: 1.0,
                lhs_value: lhs,
            }]
        }
    }

    #[test]
    fn test_knapsack_optimal() {
        let (m, [a, b, c]) = knapsack();
        let out = MicroLpBackend::new()
            .optimize(&m, OptimizeRequest::new(LONG))
            .expect("solves");
        assert_eq!(out.status, MipStatus::Optimal);
        let values = out.values.expect("point");
        assert_eq!(values.value(a), 1.0);
        assert_eq!(values.value(b), 1.0);
        assert_eq!(values.value(c), 0.0);
        assert!((out.objective.expect("objective") + 9.0).abs() < 1e-6);
        assert_eq!(out.cuts_added, 0);
    }

    #[test]
    fn test_infeasible_model() {
        let mut m = MipModel::new();
        let x = m.add_continuous("x", 0.0, Some(1.0));
        m.add_constraint(LinearConstraint::new("too_much", LinearExpr::sum([x]), Sense::Ge, 2.0));
        m.set_objective(LinearExpr::sum([x]));
        let out = MicroLpBackend::new()
            .optimize(&m, OptimizeRequest::new(LONG))
            .expect("runs");
        assert_eq!(out.status, MipStatus::Infeasible);
        assert!(out.values.is_none());
    }

    #[test]
    fn test_separator_cuts_are_enforced() {
        let (m, [a, b, _]) = knapsack();
        let sep = PairSeparator(a, b);
        let request = OptimizeRequest {
            separator: Some(&sep),
            ..OptimizeRequest::new(LONG)
        };
        let out = MicroLpBackend::new().optimize(&m, request).expect("solves");
        assert_eq!(out.status, MipStatus::Optimal);
        assert_eq!(out.cuts_added, 1);
        let values = out.values.expect("point");
        assert!(values.value(a) + values.value(b) <= 1.0 + 1e-9);
        // best without {a, b} together: a + c
        assert!((out.objective.expect("objective") + 8.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_budget_returns_warm_start() {
        let (m, [_, b, c]) = knapsack();
        let mut start = Assignment::zeros(3);
        start.set(b, 1.0);
        start.set(c, 1.0);
        let request = OptimizeRequest {
            warm_start: Some(&start),
            ..OptimizeRequest::new(Duration::ZERO)
        };
        let out = MicroLpBackend::new().optimize(&m, request).expect("runs");
        assert_eq!(out.status, MipStatus::TimeLimit);
        assert_eq!(out.values.as_ref(), Some(&start));
        assert!((out.objective.expect("objective") + 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_budget_without_start() {
        let (m, _) = knapsack();
        let out = MicroLpBackend::new()
            .optimize(&m, OptimizeRequest::new(Duration::ZERO))
            .expect("runs");
        assert_eq!(out.status, MipStatus::NoSolution);
    }

    #[test]
    fn test_infeasible_warm_start_is_ignored() {
        let (m, _) = knapsack();
        let start = Assignment::from_values(vec![1.0, 1.0, 1.0]);
        let request = OptimizeRequest {
            warm_start: Some(&start),
            ..OptimizeRequest::new(Duration::ZERO)
        };
        let out = MicroLpBackend::new().optimize(&m, request).expect("runs");
        assert_eq!(out.status, MipStatus::NoSolution);
    }

    #[test]
    fn test_cancelled_before_start() {
        let (m, [a, _, _]) = knapsack();
        let mut start = Assignment::zeros(3);
        start.set(a, 1.0);
        let token = CancelToken::new();
        token.cancel();
        let request = OptimizeRequest {
            warm_start: Some(&start),
            cancel: Some(&token),
            ..OptimizeRequest::new(LONG)
        };
        let out = MicroLpBackend::new().optimize(&m, request).expect("runs");
        assert_eq!(out.status, MipStatus::TimeLimit);
        assert_eq!(out.values, Some(start));
    }

    #[test]
    fn test_cuts_survive_branching() {
        let (m, [a, b, _]) = knapsack();
        let sep = PairSeparator(a, b);
        let request = OptimizeRequest {
            separator: Some(&sep),
            max_cut_rounds: 0,
            ..OptimizeRequest::new(LONG)
        };
        let out = MicroLpBackend::new().optimize(&m, request).expect("solves");
        assert_eq!(out.status, MipStatus::Optimal);
        assert_eq!(out.cuts_added, 1);
        assert!((out.objective.expect("objective") + 8.0).abs() < 1e-6);
    }

    /// Never cuts; raises `token` on its `at`-th call.
    struct CancelOnCall {
        token: CancelToken,
        calls: AtomicUsize,
        at: usize,
    }

    impl CutSeparator for CancelOnCall {
        fn separate(&self, _: &Assignment) -> Vec<Cut> {
            if self.calls.fetch_add(1, Ordering::SeqCst) + 1 == self.at {
                self.token.cancel();
            }
            Vec::new()
        }
    }

    #[test]
    fn test_cancel_mid_search_stops_all_work() {
        let (m, [_, b, c]) = knapsack();
        let mut start = Assignment::zeros(3);
        start.set(b, 1.0);
        start.set(c, 1.0);
        let token = CancelToken::new();
        // call 1 checks the warm start, call 2 sees the fractional root
        let sep = CancelOnCall {
            token: token.clone(),
            calls: AtomicUsize::new(0),
            at: 2,
        };
        let request = OptimizeRequest {
            warm_start: Some(&start),
            separator: Some(&sep),
            cancel: Some(&token),
            ..OptimizeRequest::new(LONG)
        };
        let out = MicroLpBackend::new().optimize(&m, request).expect("runs");
        assert_eq!(out.status, MipStatus::TimeLimit);
        assert_eq!(out.values, Some(start));
        assert_eq!(sep.calls.load(Ordering::SeqCst), 2);

        if cfg!(target_os = "linux") {
            for task in std::fs::read_dir("/proc/self/task").expect("task list") {
                let comm = task
                    .ok()
                    .and_then(|t| std::fs::read_to_string(t.path().join("comm")).ok())
                    .unwrap_or_default();
                assert!(!comm.starts_with("microlp"), "solver thread still alive");
            }
        }
    }
}
