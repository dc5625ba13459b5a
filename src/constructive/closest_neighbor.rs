//! Closest-neighbor constructive heuristic.
//!
//! Builds routes greedily: starting from the depot, always visit the closest
//! unvisited customer whose demand still fits the remaining capacity. When no
//! such customer exists, close the route and open a new one.
//!
//! # Complexity
//!
//! O(n²) where n = number of customers.
//!
//! The routing is feasible but not optimized; its only job is to hand the
//! branch-and-cut search a first incumbent.

use crate::distance::DistanceMatrix;
use crate::error::CvrpError;
use crate::evaluation::RouteEvaluator;
use crate::models::{Instance, Route, ValidationError, ValidationErrorKind, DEPOT};

/// Constructs routes with the closest-neighbor heuristic.
///
/// Each returned route is a full vertex sequence that starts and ends at
/// `depot`. Every customer appears in exactly one route and no route's
/// cumulative demand exceeds `capacity`. Distance ties are broken by the
/// lowest vertex id, so identical input always yields identical routes.
///
/// # Errors
///
/// Fails if a customer's demand is negative or larger than `capacity`, since
/// no route could ever take it.
///
/// # Panics
///
/// Panics if a customer id is out of range for `demands` or `distances`.
///
/// # Examples
///
/// ```
/// use u_cvrp::distance::DistanceMatrix;
/// use u_cvrp::constructive::closest_neighbor;
///
/// let dm = DistanceMatrix::from_points(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0)]);
/// let demands = [0, 10, 10, 10];
///
/// let routes = closest_neighbor(0, &[1, 2, 3], &demands, &dm, 20).unwrap();
/// assert_eq!(routes, vec![vec![0, 1, 2, 0], vec![0, 3, 0]]);
/// ```
pub fn closest_neighbor(
    depot: usize,
    customers: &[usize],
    demands: &[i32],
    distances: &DistanceMatrix,
    capacity: i32,
) -> Result<Vec<Vec<usize>>, ValidationError> {
    let mut pending: Vec<usize> = customers.iter().copied().filter(|&c| c != depot).collect();
    pending.sort_unstable();
    pending.dedup();

    for &c in &pending {
        let q = demands[c];
        if q < 0 {
            return Err(ValidationError::new(
                ValidationErrorKind::NegativeDemand,
                format!("demand[{c}] = {q}"),
            ));
        }
        if q > capacity {
            return Err(ValidationError::new(
                ValidationErrorKind::DemandExceedsCapacity,
                format!("demand[{c}] = {q} exceeds vehicle capacity {capacity}"),
            ));
        }
    }

    let mut routes = Vec::new();

    while !pending.is_empty() {
        let mut route = vec![depot];
        let mut current = depot;
        let mut load: i32 = 0;

        loop {
            // `pending` is sorted, so a strict comparison keeps the lowest id on ties
            let mut best: Option<(usize, f64)> = None;
            for (pos, &c) in pending.iter().enumerate() {
                if demands[c] > capacity - load {
                    continue;
                }
                let d = distances.get(current, c);
                match best {
                    Some((_, best_d)) if d >= best_d => {}
                    _ => best = Some((pos, d)),
                }
            }

            match best {
                Some((pos, _)) => {
                    let next = pending.remove(pos);
                    load += demands[next];
                    route.push(next);
                    current = next;
                }
                None => break,
            }
        }

        route.push(depot);
        routes.push(route);
    }

    Ok(routes)
}

/// Runs [`closest_neighbor`] on a validated instance and evaluates the result.
///
/// Returned routes carry their distance and per-visit cumulative load.
pub fn closest_neighbor_routes(instance: &Instance) -> Result<Vec<Route>, CvrpError> {
    let customers: Vec<usize> = instance.customers().collect();
    let tours = closest_neighbor(
        DEPOT,
        &customers,
        instance.demands(),
        instance.distances(),
        instance.capacity(),
    )
    .map_err(|e| CvrpError::Validation {
        instance: instance.id().to_string(),
        errors: vec![e],
    })?;

    let evaluator = RouteEvaluator::new(instance);
    Ok(tours
        .iter()
        .map(|tour| evaluator.build_route(&tour[1..tour.len() - 1]).0)
        .collect())
}
