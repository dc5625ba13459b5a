//! Single-commodity flow formulation of the CVRP.
//!
//! For every ordered pair of distinct vertices `(i, j)` the model holds a
//! binary arc variable `x[i,j]` and a continuous flow variable `f[i,j]`
//! carrying the demand collected so far when the arc is used. Capacity is
//! enforced through arc-wise flow bounds, so no vehicle index is needed:
//!
//! ```text
//! min  Σ c[i,j]·x[i,j]
//! s.t. Σ_i x[i,j] = 1,  Σ_i x[j,i] = 1                  j ∈ customers
//!      Σ_j x[0,j] ≤ m,  Σ_j x[0,j] − Σ_j x[j,0] = 0
//!      Σ_i f[j,i] − Σ_i f[i,j] = q[j]                     j ∈ customers
//!      max(0, q[i], −q[j])·x[i,j] ≤ f[i,j] ≤ min(Q, Q+q[i], Q−q[j])·x[i,j]
//! ```
//!
//! The relaxation is weak; rounded capacity cuts tighten it during search.

use super::{ArcTable, Assignment, LinearConstraint, LinearExpr, MipModel, Sense, VarId};
use crate::models::{Instance, Route, UsedArc, DEPOT};

/// Lower and upper bound of `f[i,j]` when arc `(i, j)` is used.
///
/// # Examples
///
/// ```
/// use u_cvrp::formulation::flow_bounds;
///
/// // Leaving a customer with demand 3 towards one with demand 4, Q = 10.
/// assert_eq!(flow_bounds(3, 4, 10), (3.0, 6.0));
/// ```
pub fn flow_bounds(demand_from: i32, demand_to: i32, capacity: i32) -> (f64, f64) {
    let (qi, qj, cap) = (
        i64::from(demand_from),
        i64::from(demand_to),
        i64::from(capacity),
    );
    let lower = 0.max(qi).max(-qj);
    let upper = cap.min(cap + qi).min(cap - qj);
    (lower as f64, upper as f64)
}

/// The built program plus the arc-indexed variable tables.
#[derive(Debug, Clone)]
pub struct Formulation {
    model: MipModel,
    x: ArcTable<Option<VarId>>,
    f: ArcTable<Option<VarId>>,
    fleet_size: usize,
}

impl Formulation {
    /// The mixed-integer program.
    pub fn model(&self) -> &MipModel {
        &self.model
    }

    /// Arc variable `x[i,j]`; `None` on the diagonal.
    pub fn x(&self, i: usize, j: usize) -> Option<VarId> {
        *self.x.get(i, j)
    }

    /// Flow variable `f[i,j]`; `None` on the diagonal.
    pub fn f(&self, i: usize, j: usize) -> Option<VarId> {
        *self.f.get(i, j)
    }

    /// The whole `x` table.
    pub fn arc_vars(&self) -> &ArcTable<Option<VarId>> {
        &self.x
    }

    /// Fleet bound m used for the depot out-degree.
    pub fn fleet_size(&self) -> usize {
        self.fleet_size
    }

    /// Arcs whose `x` rounds to 1, each with its flow value.
    pub fn used_arcs(&self, assignment: &Assignment) -> Vec<UsedArc> {
        self.x
            .arcs()
            .filter_map(|(i, j, var)| {
                let var = (*var)?;
                if assignment.value(var) <= 0.5 {
                    return None;
                }
                let flow = self.f(i, j).map_or(0.0, |fv| assignment.value(fv));
                Some(UsedArc {
                    from: i,
                    to: j,
                    flow,
                })
            })
            .collect()
    }

    /// Complete assignment encoding `routes`: `x = 1` on every traversed arc
    /// and `f` set to the load collected before leaving the tail vertex.
    ///
    /// Routes are expected to be capacity-feasible, as produced by
    /// [`closest_neighbor_routes`](crate::constructive::closest_neighbor_routes).
    pub fn warm_start(&self, routes: &[Route]) -> Assignment {
        let mut assignment = Assignment::zeros(self.model.num_variables());
        for route in routes {
            let mut prev = DEPOT;
            let mut load = 0;
            for visit in route.visits() {
                self.mark(&mut assignment, prev, visit.customer_id, load);
                prev = visit.customer_id;
                load = visit.load_after;
            }
            if prev != DEPOT {
                self.mark(&mut assignment, prev, DEPOT, load);
            }
        }
        assignment
    }

    fn mark(&self, assignment: &mut Assignment, i: usize, j: usize, load: i64) {
        if let (Some(xv), Some(fv)) = (self.x(i, j), self.f(i, j)) {
            assignment.set(xv, 1.0);
            assignment.set(fv, load as f64);
        }
    }
}

/// Builds the flow formulation for an [`Instance`].
///
/// # Examples
///
/// ```
/// use u_cvrp::distance::DistanceMatrix;
/// use u_cvrp::formulation::FormulationBuilder;
/// use u_cvrp::models::Instance;
///
/// let dm = DistanceMatrix::from_points(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]);
/// let instance = Instance::new("tri", dm, vec![0, 3, 4], 5).unwrap();
///
/// let formulation = FormulationBuilder::new(&instance).with_fleet_size(2).build();
/// // 6 arcs, each with an x and an f variable
/// assert_eq!(formulation.model().num_variables(), 12);
/// assert!(formulation.x(1, 1).is_none());
/// ```
pub struct FormulationBuilder<'a> {
    instance: &'a Instance,
    fleet_size: usize,
}

impl<'a> FormulationBuilder<'a> {
    /// Creates a builder whose fleet bound defaults to one vehicle per
    /// customer.
    pub fn new(instance: &'a Instance) -> Self {
        Self {
            instance,
            fleet_size: instance.num_customers().max(1),
        }
    }

    /// Sets the fleet bound m.
    pub fn with_fleet_size(mut self, m: usize) -> Self {
        self.fleet_size = m;
        self
    }

    /// Creates every variable and constraint.
    pub fn build(&self) -> Formulation {
        let inst = self.instance;
        let n = inst.num_vertices();
        let capacity = inst.capacity();
        let mut model = MipModel::new();
        let mut x = ArcTable::new(n, None);
        let mut f = ArcTable::new(n, None);

        for i in 0..n {
            for j in 0..n {
                if i != j {
                    x.set(i, j, Some(model.add_binary(format!("x_{i}_{j}"))));
                }
            }
        }
        let q = f64::from(capacity);
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    let var = model.add_continuous(format!("f_{i}_{j}"), 0.0, Some(q));
                    f.set(i, j, Some(var));
                }
            }
        }

        let mut objective = LinearExpr::new();
        for (i, j, var) in x.arcs() {
            if let Some(var) = var {
                objective.add_term(*var, inst.distance(i, j));
            }
        }
        model.set_objective(objective);

        let incoming = |j: usize| LinearExpr::sum((0..n).filter_map(|i| *x.get(i, j)));
        let outgoing = |i: usize| LinearExpr::sum((0..n).filter_map(|j| *x.get(i, j)));

        let degree = |name: String, expr: LinearExpr| {
            LinearConstraint::new(name, expr, Sense::Eq, 1.0)
        };
        for j in inst.customers() {
            model.add_constraint(degree(format!("in_{j}"), incoming(j)));
            model.add_constraint(degree(format!("out_{j}"), outgoing(j)));
        }

        model.add_constraint(LinearConstraint::new(
            "fleet",
            outgoing(DEPOT),
            Sense::Le,
            self.fleet_size as f64,
        ));

        let mut balance = outgoing(DEPOT);
        for i in inst.customers() {
            if let Some(var) = *x.get(i, DEPOT) {
                balance.add_term(var, -1.0);
            }
        }
        model.add_constraint(LinearConstraint::new("depot_balance", balance, Sense::Eq, 0.0));

        for j in inst.customers() {
            let mut conservation = LinearExpr::new();
            for i in 0..n {
                if let Some(out) = *f.get(j, i) {
                    conservation.add_term(out, 1.0);
                }
                if let Some(inflow) = *f.get(i, j) {
                    conservation.add_term(inflow, -1.0);
                }
            }
            model.add_constraint(LinearConstraint::new(
                format!("flow_{j}"),
                conservation,
                Sense::Eq,
                f64::from(inst.demand(j)),
            ));
        }

        for (i, j, var) in x.arcs() {
            let (Some(xv), Some(fv)) = (*var, *f.get(i, j)) else {
                continue;
            };
            let (lower, upper) = flow_bounds(inst.demand(i), inst.demand(j), capacity);
            model.add_constraint(LinearConstraint::new(
                format!("flow_lb_{i}_{j}"),
                LinearExpr::new().with_term(fv, 1.0).with_term(xv, -lower),
                Sense::Ge,
                0.0,
            ));
            model.add_constraint(LinearConstraint::new(
                format!("flow_ub_{i}_{j}"),
                LinearExpr::new().with_term(fv, 1.0).with_term(xv, -upper),
                Sense::Le,
                0.0,
            ));
        }

        Formulation {
            model,
            x,
            f,
            fleet_size: self.fleet_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constructive::closest_neighbor_routes;
    use crate::distance::DistanceMatrix;

    fn square(capacity: i32) -> Instance {
        let dm = DistanceMatrix::from_points(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
        Instance::new("square", dm, vec![0, 2, 3, 2], capacity).expect("valid")
    }

    #[test]
    fn test_flow_bounds() {
        assert_eq!(flow_bounds(0, 4, 10), (0.0, 6.0));
        assert_eq!(flow_bounds(4, 0, 10), (4.0, 10.0));
        assert_eq!(flow_bounds(3, 4, 10), (3.0, 6.0));
    }

    #[test]
    fn test_sizes() {
        let inst = square(10);
        let form = FormulationBuilder::new(&inst).build();
        let n = 4;
        assert_eq!(form.model().num_variables(), 2 * n * (n - 1));
        // in/out per customer, fleet, balance, conservation per customer, 2 per arc
        let expected = 2 * 3 + 1 + 1 + 3 + 2 * n * (n - 1);
        assert_eq!(form.model().constraints().len(), expected);
        assert_eq!(form.fleet_size(), 3);
        for v in 0..n {
            assert!(form.x(v, v).is_none());
            assert!(form.f(v, v).is_none());
        }
    }

    #[test]
    fn test_objective_uses_distances() {
        let inst = square(10);
        let form = FormulationBuilder::new(&inst).build();
        let mut a = Assignment::zeros(form.model().num_variables());
        a.set(form.x(0, 2).expect("arc"), 1.0);
        assert!((form.model().objective_value(&a) - 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_fleet_constraint_rhs() {
        let inst = square(10);
        let form = FormulationBuilder::new(&inst).with_fleet_size(2).build();
        let fleet = form
            .model()
            .constraints()
            .iter()
            .find(|c| c.name == "fleet")
            .expect("fleet row");
        assert_eq!(fleet.rhs, 2.0);
        assert_eq!(fleet.sense, Sense::Le);
        assert_eq!(fleet.expr.terms().len(), 3);
    }

    #[test]
    fn test_warm_start_is_feasible() {
        let inst = square(4);
        let routes = closest_neighbor_routes(&inst).expect("routes");
        let form = FormulationBuilder::new(&inst).build();
        let start = form.warm_start(&routes);
        assert_eq!(form.model().first_violation(&start, 1e-9), None);

        let total: f64 = routes.iter().map(|r| r.total_distance()).sum();
        assert!((form.model().objective_value(&start) - total).abs() < 1e-9);
    }

    #[test]
    fn test_warm_start_over_fleet_is_infeasible() {
        let inst = square(4);
        let routes = closest_neighbor_routes(&inst).expect("routes");
        assert!(routes.len() > 1);
        let form = FormulationBuilder::new(&inst).with_fleet_size(1).build();
        let start = form.warm_start(&routes);
        assert_eq!(
            form.model().first_violation(&start, 1e-9),
            Some("fleet is violated".to_string())
        );
    }

    #[test]
    fn test_used_arcs_carry_flow() {
        let inst = square(10);
        let routes = closest_neighbor_routes(&inst).expect("routes");
        let form = FormulationBuilder::new(&inst).build();
        let start = form.warm_start(&routes);
        let arcs = form.used_arcs(&start);
        // single route 0 → 1 → 2 → 3 → 0
        let flows: Vec<(usize, usize, f64)> = arcs.iter().map(|a| (a.from, a.to, a.flow)).collect();
        assert_eq!(
            flows,
            vec![(0, 1, 0.0), (1, 2, 2.0), (2, 3, 5.0), (3, 0, 7.0)]
        );
    }
}
