//! End-to-end solve of one instance.

use tracing::{debug, info, instrument, warn};

use super::{CancelToken, MipBackend, MipStatus, OptimizeRequest, SolverConfig};
use crate::constructive::closest_neighbor_routes;
use crate::error::CvrpError;
use crate::evaluation::RouteEvaluator;
use crate::formulation::{Formulation, FormulationBuilder};
use crate::models::{Instance, SolveStatus, Solution, UsedArc, DEPOT};
use crate::separation::CapacityCutSeparator;

/// Builds the formulation, seeds it with the closest-neighbor routing,
/// attaches capacity-cut separation, and turns the engine's answer into
/// routes.
///
/// # Examples
///
/// ```
/// use u_cvrp::distance::DistanceMatrix;
/// use u_cvrp::models::{Instance, SolveStatus};
/// use u_cvrp::solver::{MicroLpBackend, SolverConfig, SolverDriver};
///
/// let dm = DistanceMatrix::from_points(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]);
/// let instance = Instance::new("tri", dm, vec![0, 3, 4], 5).unwrap();
///
/// let driver = SolverDriver::new(MicroLpBackend::new(), SolverConfig::default());
/// let solution = driver.solve(&instance, None).unwrap();
/// assert_eq!(solution.status(), SolveStatus::Optimal);
/// assert_eq!(solution.num_routes(), 2);
/// assert!((solution.objective() - 4.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct SolverDriver<B> {
    backend: B,
    config: SolverConfig,
}

impl<B: MipBackend> SolverDriver<B> {
    /// Creates a driver.
    pub fn new(backend: B, config: SolverConfig) -> Self {
        Self { backend, config }
    }

    /// Active configuration.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Solves `instance` to optimality or until the configured time limit.
    ///
    /// `cancel` stops the search early; the result is then reported like a
    /// timeout.
    #[instrument(skip_all, fields(instance = %instance.id(), vertices = instance.num_vertices()))]
    pub fn solve(
        &self,
        instance: &Instance,
        cancel: Option<&CancelToken>,
    ) -> Result<Solution, CvrpError> {
        if instance.num_customers() == 0 {
            info!("no customers to serve");
            return Ok(Solution::new(instance.id(), Vec::new(), Vec::new(), SolveStatus::Optimal));
        }

        let fleet = self.config.fleet_size_for(instance.num_vertices());
        let formulation = FormulationBuilder::new(instance).with_fleet_size(fleet).build();
        debug!(
            variables = formulation.model().num_variables(),
            constraints = formulation.model().constraints().len(),
            fleet,
            "formulation built"
        );

        let heuristic = closest_neighbor_routes(instance)?;
        let heuristic_cost: f64 = heuristic.iter().map(|r| r.total_distance()).sum();
        let warm_start = if heuristic.len() <= fleet {
            Some(formulation.warm_start(&heuristic))
        } else {
            warn!(routes = heuristic.len(), fleet, "heuristic exceeds fleet bound; no warm start");
            None
        };
        info!(routes = heuristic.len(), cost = heuristic_cost, "closest-neighbor incumbent");

        let separator = CapacityCutSeparator::new(instance, formulation.arc_vars().clone())
            .with_tolerance(self.config.tolerance)
            .with_policy(self.config.cut_policy);

        let request = OptimizeRequest {
            time_limit: self.config.time_limit,
            warm_start: warm_start.as_ref(),
            separator: Some(&separator),
            cancel,
            max_cut_rounds: self.config.max_cut_rounds,
            tolerance: self.config.tolerance,
        };
        let outcome = self
            .backend
            .optimize(formulation.model(), request)
            .map_err(|e| CvrpError::Solver {
                instance: instance.id().to_string(),
                message: e.to_string(),
            })?;

        let status = match outcome.status {
            MipStatus::Optimal => SolveStatus::Optimal,
            MipStatus::TimeLimit => SolveStatus::TimeLimit,
            MipStatus::Infeasible => {
                return Err(CvrpError::Infeasible {
                    instance: instance.id().to_string(),
                })
            }
            MipStatus::NoSolution => {
                return Err(CvrpError::NoSolution {
                    instance: instance.id().to_string(),
                })
            }
        };
        let values = outcome.values.ok_or_else(|| CvrpError::Solver {
            instance: instance.id().to_string(),
            message: "engine reported a solution without values".into(),
        })?;

        let arcs = formulation.used_arcs(&values);
        let solution = self.assemble(instance, &formulation, arcs, status)?;
        info!(
            status = ?solution.status(),
            objective = solution.objective(),
            routes = solution.num_routes(),
            cuts = outcome.cuts_added,
            "solve finished"
        );
        Ok(solution.with_cuts_added(outcome.cuts_added))
    }

    fn assemble(
        &self,
        instance: &Instance,
        formulation: &Formulation,
        arcs: Vec<UsedArc>,
        status: SolveStatus,
    ) -> Result<Solution, CvrpError> {
        let failed = |message: String| CvrpError::Solver {
            instance: instance.id().to_string(),
            message,
        };

        let tours = trace_routes(instance.num_vertices(), &arcs).map_err(failed)?;
        if tours.len() > formulation.fleet_size() {
            return Err(failed(format!(
                "{} routes exceed the fleet bound {}",
                tours.len(),
                formulation.fleet_size()
            )));
        }

        let (routes, _, violations) = RouteEvaluator::new(instance).evaluate_routes(&tours);
        if let Some(v) = violations.first() {
            return Err(failed(format!("engine routing is infeasible: {:?}", v.kind)));
        }
        Ok(Solution::new(instance.id(), routes, arcs, status))
    }
}

/// Follows successor arcs from every depot departure, in ascending order of
/// first customer.
///
/// Fails if a vertex has several successors, a walk never returns to the
/// depot, or some customer lies on a cycle avoiding the depot.
fn trace_routes(n: usize, arcs: &[UsedArc]) -> Result<Vec<Vec<usize>>, String> {
    let mut next = vec![None; n];
    let mut starts = Vec::new();
    for arc in arcs {
        if arc.from == DEPOT {
            starts.push(arc.to);
        } else if next[arc.from].replace(arc.to).is_some() {
            return Err(format!("vertex {} has several successors", arc.from));
        }
    }
    starts.sort_unstable();

    let mut visited = vec![false; n];
    let mut tours = Vec::with_capacity(starts.len());
    for first in starts {
        let mut tour = Vec::new();
        let mut v = first;
        while v != DEPOT {
            if visited[v] {
                return Err(format!("vertex {v} is reached twice"));
            }
            visited[v] = true;
            tour.push(v);
            v = next[v].ok_or_else(|| format!("route stops at vertex {v}"))?;
        }
        tours.push(tour);
    }

    if let Some(stray) = (1..n).find(|&v| !visited[v]) {
        return Err(format!("vertex {stray} lies on a subtour detached from the depot"));
    }
    Ok(tours)
}
