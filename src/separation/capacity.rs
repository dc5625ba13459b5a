//! Rounded capacity cut separation.
//!
//! For every customer t, a maximum depot → t flow on the support graph of
//! the current `x` values is computed. A flow below 1 means t is
//! fractionally cut off from the depot; the sink side S of the minimum cut
//! then yields
//!
//! ```text
//! plain:         Σ_{i,j ∈ S} x[i,j] ≤ |S| − 1
//! strengthened:  Σ_{i,j ∈ S} x[i,j] ≤ |S| − max(1, ⌈q(S) / Q⌉)
//! ```
//!
//! Only strictly violated inequalities are returned.

use std::collections::HashSet;

use tracing::{debug, trace, warn};

use super::{Cut, CutKind, CutPolicy, CutSeparator, FlowNetwork};
use crate::formulation::{ArcTable, Assignment, VarId};
use crate::models::{Instance, DEPOT};

/// Separates rounded capacity cuts via max-flow / min-cut.
///
/// Holds only immutable instance data, so it can be invoked any number of
/// times from the search loop.
#[derive(Debug, Clone)]
pub struct CapacityCutSeparator {
    demands: Vec<i32>,
    capacity: i32,
    x: ArcTable<Option<VarId>>,
    tolerance: f64,
    policy: CutPolicy,
}

impl CapacityCutSeparator {
    /// Creates a separator over the arc variables `x` of `instance`'s
    /// formulation.
    pub fn new(instance: &Instance, x: ArcTable<Option<VarId>>) -> Self {
        Self {
            demands: instance.demands().to_vec(),
            capacity: instance.capacity(),
            x,
            tolerance: 1e-6,
            policy: CutPolicy::default(),
        }
    }

    /// Sets the numeric tolerance ε.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets which cuts are emitted per subset.
    pub fn with_policy(mut self, policy: CutPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Values of every `x[i,j]` under `assignment`; diagonal cells are 0.
    pub fn arc_values(&self, assignment: &Assignment) -> ArcTable<f64> {
        let n = self.x.num_vertices();
        let mut values = ArcTable::new(n, 0.0);
        for (i, j, var) in self.x.arcs() {
            if let Some(var) = var {
                values.set(i, j, assignment.value(*var));
            }
        }
        values
    }

    /// Minimum number of vehicles needed to serve `subset`, at least 1.
    pub fn min_vehicles(&self, subset: &[usize]) -> i64 {
        let demand: i64 = subset.iter().map(|&v| i64::from(self.demands[v])).sum();
        let cap = i64::from(self.capacity);
        ((demand + cap - 1) / cap).max(1)
    }

    /// Cuts for one customer subset, given the current arc values.
    ///
    /// Appends to `out` every violated inequality whose key is not in
    /// `seen`.
    fn cuts_for_subset(
        &self,
        subset: &[usize],
        values: &ArcTable<f64>,
        seen: &mut HashSet<(CutKind, Vec<usize>)>,
        out: &mut Vec<Cut>,
    ) {
        let mut arcs = Vec::with_capacity(subset.len() * subset.len());
        let mut lhs = 0.0;
        for &i in subset {
            for &j in subset {
                if i == j {
                    continue;
                }
                if let Some(var) = *self.x.get(i, j) {
                    arcs.push(var);
                    lhs += *values.get(i, j);
                }
            }
        }

        let size = subset.len() as f64;
        let plain_rhs = size - 1.0;
        let strong_rhs = size - self.min_vehicles(subset) as f64;
        let eps = self.tolerance;

        let mut emit = |kind: CutKind, rhs: f64| {
            if lhs <= rhs + eps || !seen.insert((kind, subset.to_vec())) {
                return;
            }
            let cut = Cut {
                kind,
                subset: subset.to_vec(),
                arcs: arcs.clone(),
                rhs,
                lhs_value: lhs,
            };
            trace!(kind = ?cut.kind, subset = ?cut.subset, rhs, lhs, "violated capacity cut");
            out.push(cut);
        };

        match self.policy {
            CutPolicy::Both => {
                emit(CutKind::Plain, plain_rhs);
                emit(CutKind::Strengthened, strong_rhs);
            }
            CutPolicy::StrongestOnly => {
                if strong_rhs < plain_rhs {
                    emit(CutKind::Strengthened, strong_rhs);
                } else {
                    emit(CutKind::Plain, plain_rhs);
                }
            }
        }
    }
}

impl CutSeparator for CapacityCutSeparator {
    fn separate(&self, assignment: &Assignment) -> Vec<Cut> {
        let values = self.arc_values(assignment);
        let network = FlowNetwork::from_arc_values(&values);
        let n = values.num_vertices();
        let mut seen = HashSet::new();
        let mut cuts = Vec::new();

        for t in (0..n).filter(|&v| v != DEPOT) {
            let min_cut = match network.min_cut(DEPOT, t, self.tolerance) {
                Ok(c) => c,
                Err(e) => {
                    warn!(vertex = t, error = %e, "max-flow failed; vertex skipped");
                    continue;
                }
            };
            if min_cut.value >= 1.0 - self.tolerance {
                continue;
            }
            let subset: Vec<usize> =
                min_cut.sink_side.into_iter().filter(|&v| v != DEPOT).collect();
            if subset.is_empty() {
                continue;
            }
            self.cuts_for_subset(&subset, &values, &mut seen, &mut cuts);
        }

        debug!(cuts = cuts.len(), edges = network.num_edges(), "capacity separation");
        cuts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::DistanceMatrix;
    use crate::formulation::{Formulation, FormulationBuilder};

    /// Depot plus three customers of demand 3, Q = 5.
    fn setup() -> (Instance, Formulation) {
        let dm = DistanceMatrix::from_points(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)]);
        let inst = Instance::new("sep", dm, vec![0, 3, 3, 3], 5).expect("valid");
        let form = FormulationBuilder::new(&inst).build();
        (inst, form)
    }

    fn assign(form: &Formulation, arcs: &[(usize, usize, f64)]) -> Assignment {
        let mut a = Assignment::zeros(form.model().num_variables());
        for &(i, j, v) in arcs {
            a.set(form.x(i, j).expect("arc"), v);
        }
        a
    }

    fn separator(inst: &Instance, form: &Formulation, policy: CutPolicy) -> CapacityCutSeparator {
        CapacityCutSeparator::new(inst, form.arc_vars().clone()).with_policy(policy)
    }

    #[test]
    fn test_subtour_yields_both_cuts_under_parity() {
        let (inst, form) = setup();
        // 0 ↔ 1 plus a detached 2 ↔ 3 cycle
        let a = assign(&form, &[(0, 1, 1.0), (1, 0, 1.0), (2, 3, 1.0), (3, 2, 1.0)]);
        let cuts = separator(&inst, &form, CutPolicy::Both).separate(&a);

        assert_eq!(cuts.len(), 2);
        let plain = cuts.iter().find(|c| c.kind == CutKind::Plain).expect("plain");
        let strong = cuts.iter().find(|c| c.kind == CutKind::Strengthened).expect("strong");
        assert_eq!(plain.subset, vec![2, 3]);
        assert_eq!(plain.rhs, 1.0);
        // q(S) = 6 needs two vehicles of capacity 5
        assert_eq!(strong.rhs, 0.0);
        assert!(strong.rhs <= plain.rhs);
        assert!((plain.lhs_value - 2.0).abs() < 1e-12);
        assert_eq!(plain.arcs.len(), 2);
    }

    #[test]
    fn test_strongest_only_keeps_the_tighter_cut() {
        let (inst, form) = setup();
        let a = assign(&form, &[(0, 1, 1.0), (1, 0, 1.0), (2, 3, 1.0), (3, 2, 1.0)]);
        let cuts = separator(&inst, &form, CutPolicy::StrongestOnly).separate(&a);
        assert_eq!(cuts.len(), 1);
        assert_eq!(cuts[0].kind, CutKind::Strengthened);
        assert_eq!(cuts[0].subset, vec![2, 3]);
    }

    #[test]
    fn test_only_strengthened_when_plain_holds() {
        let (inst, form) = setup();
        let a = assign(
            &form,
            &[
                (0, 1, 1.0),
                (1, 0, 1.0),
                (0, 2, 0.25),
                (0, 3, 0.5),
                (2, 3, 0.5),
                (3, 2, 0.5),
            ],
        );
        let cuts = separator(&inst, &form, CutPolicy::Both).separate(&a);
        // x(S) = 1 equals |S| − 1, so only the capacity-aware bound is violated
        assert_eq!(cuts.len(), 1);
        assert_eq!(cuts[0].kind, CutKind::Strengthened);
        assert_eq!(cuts[0].subset, vec![2, 3]);
        assert!(cuts[0].violation() > 0.0);
    }

    #[test]
    fn test_connected_integer_routing_yields_no_cuts() {
        let (inst, form) = setup();
        let a = assign(
            &form,
            &[(0, 1, 1.0), (1, 0, 1.0), (0, 2, 1.0), (2, 3, 1.0), (3, 0, 1.0)],
        );
        for policy in [CutPolicy::Both, CutPolicy::StrongestOnly] {
            assert!(separator(&inst, &form, policy).separate(&a).is_empty());
        }
    }

    #[test]
    fn test_plain_cut_for_light_subtour() {
        let dm = DistanceMatrix::from_points(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)]);
        let inst = Instance::new("light", dm, vec![0, 1, 1, 1], 5).expect("valid");
        let form = FormulationBuilder::new(&inst).build();
        let a = assign(&form, &[(0, 1, 1.0), (1, 0, 1.0), (2, 3, 1.0), (3, 2, 1.0)]);
        let cuts = separator(&inst, &form, CutPolicy::StrongestOnly).separate(&a);
        assert_eq!(cuts.len(), 1);
        assert_eq!(cuts[0].kind, CutKind::Plain);
        assert_eq!(cuts[0].rhs, 1.0);
    }

    #[test]
    fn test_failed_max_flow_skips_only_that_vertex() {
        let (inst, form) = setup();
        // the depot → 1 flow is unbounded, 2 ↔ 3 is still a detached cycle
        let a = assign(
            &form,
            &[(0, 1, f64::INFINITY), (1, 0, 1.0), (2, 3, 1.0), (3, 2, 1.0)],
        );
        let cuts = separator(&inst, &form, CutPolicy::StrongestOnly).separate(&a);
        let found: Vec<(CutKind, Vec<usize>)> = cuts.iter().map(Cut::key).collect();
        assert_eq!(found, vec![(CutKind::Strengthened, vec![2, 3])]);
    }

    #[test]
    fn test_min_vehicles() {
        let (inst, form) = setup();
        let sep = separator(&inst, &form, CutPolicy::Both);
        assert_eq!(sep.min_vehicles(&[1]), 1);
        assert_eq!(sep.min_vehicles(&[1, 2]), 2);
        assert_eq!(sep.min_vehicles(&[1, 2, 3]), 2);
    }

    #[test]
    fn test_arc_values_flat() {
        let (inst, form) = setup();
        let a = assign(&form, &[(2, 1, 0.4)]);
        let values = separator(&inst, &form, CutPolicy::Both).arc_values(&a);
        assert_eq!(*values.get(2, 1), 0.4);
        assert_eq!(*values.get(1, 2), 0.0);
    }
}
