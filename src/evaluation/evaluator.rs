//! Cost, load, and coverage checks for customer sequences.

use crate::models::{Instance, Route, Violation, ViolationType, Visit, DEPOT};

/// Turns customer sequences into [`Route`]s and reports every routing rule
/// they break.
///
/// # Examples
///
/// ```
/// use u_cvrp::distance::DistanceMatrix;
/// use u_cvrp::evaluation::RouteEvaluator;
/// use u_cvrp::models::Instance;
///
/// let dm = DistanceMatrix::from_points(&[(0.0, 0.0), (0.0, 2.0), (0.0, 5.0)]);
/// let instance = Instance::new("ray", dm, vec![0, 4, 6], 12).unwrap();
///
/// let (route, violations) = RouteEvaluator::new(&instance).build_route(&[1, 2]);
/// assert_eq!(route.total_load(), 10);
/// assert!((route.total_distance() - 10.0).abs() < 1e-10);
/// assert!(violations.is_empty());
/// ```
pub struct RouteEvaluator<'a> {
    instance: &'a Instance,
}

impl<'a> RouteEvaluator<'a> {
    /// Evaluator over `instance`.
    pub fn new(instance: &'a Instance) -> Self {
        Self { instance }
    }

    /// Route serving `stops` in order, with the violations it carries.
    ///
    /// The depot and out-of-range vertices are reported and skipped.
    /// Violations are tagged with route index 0.
    pub fn build_route(&self, stops: &[usize]) -> (Route, Vec<Violation>) {
        self.walk(0, stops)
    }

    fn walk(&self, route_index: usize, stops: &[usize]) -> (Route, Vec<Violation>) {
        let inst = self.instance;
        let mut route = Route::new();
        let mut violations = Vec::new();
        let mut load = 0;
        let mut cost = 0.0;
        let mut at = DEPOT;

        for &v in stops {
            if v == DEPOT || v >= inst.num_vertices() {
                let kind = ViolationType::InvalidVertex { vertex: v, route_index };
                violations.push(Violation::new(kind));
                continue;
            }
            cost += inst.distance(at, v);
            load += i64::from(inst.demand(v));
            route.push_visit(Visit {
                customer_id: v,
                load_after: load,
            });
            at = v;
        }
        if at != DEPOT {
            cost += inst.distance(at, DEPOT);
        }
        route.set_total_distance(cost);

        if load > i64::from(inst.capacity()) {
            violations.push(Violation::new(ViolationType::CapacityExceeded {
                route_index,
                load,
                capacity: inst.capacity(),
            }));
        }
        (route, violations)
    }

    /// Builds every route and checks that each customer is served exactly
    /// once.
    ///
    /// Returns the routes, their summed cost, and all violations in route
    /// order followed by missing customers.
    pub fn evaluate_routes(&self, routes: &[Vec<usize>]) -> (Vec<Route>, f64, Vec<Violation>) {
        let mut served = vec![false; self.instance.num_vertices()];
        let mut violations = Vec::new();
        let mut built = Vec::with_capacity(routes.len());

        for (k, stops) in routes.iter().enumerate() {
            let (route, mut found) = self.walk(k, stops);
            for v in route.customer_ids() {
                if std::mem::replace(&mut served[v], true) {
                    found.push(Violation::new(ViolationType::CustomerRepeated {
                        customer_id: v,
                        route_index: k,
                    }));
                }
            }
            violations.append(&mut found);
            built.push(route);
        }

        violations.extend(
            self.instance
                .customers()
                .filter(|&v| !served[v])
                .map(|customer_id| Violation::new(ViolationType::CustomerMissing { customer_id })),
        );
        let total = built.iter().map(Route::total_distance).sum();
        (built, total, violations)
    }
}
