//! Route and visit types.

use serde::Serialize;

use super::DEPOT;

/// One customer stop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Visit {
    /// Customer vertex.
    pub customer_id: usize,
    /// Demand picked up so far, this stop included.
    pub load_after: i64,
}

/// The stops of one vehicle, between leaving and re-entering the depot.
///
/// The depot itself is implicit: it is prepended and appended by
/// [`Route::vertices`] and [`Route::arcs`].
///
/// # Examples
///
/// ```
/// use u_cvrp::models::{Route, Visit};
///
/// let mut route = Route::new();
/// route.push_visit(Visit { customer_id: 2, load_after: 4 });
/// route.push_visit(Visit { customer_id: 1, load_after: 7 });
/// assert_eq!(route.vertices(), vec![0, 2, 1, 0]);
/// assert_eq!(route.arcs(), vec![(0, 2), (2, 1), (1, 0)]);
/// assert_eq!(route.total_load(), 7);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Route {
    stops: Vec<Visit>,
    distance: f64,
}

impl Route {
    /// A route with no stops.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `visit` as the last stop.
    pub fn push_visit(&mut self, visit: Visit) {
        self.stops.push(visit);
    }

    /// Stops in service order.
    pub fn visits(&self) -> &[Visit] {
        &self.stops
    }

    /// Number of customers served.
    pub fn len(&self) -> usize {
        self.stops.len()
    }

    /// Returns `true` if no customer is served.
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Served customers in order.
    pub fn customer_ids(&self) -> Vec<usize> {
        self.stops.iter().map(|v| v.customer_id).collect()
    }

    /// Closed walk `depot, c1, ..., ck, depot`.
    pub fn vertices(&self) -> Vec<usize> {
        std::iter::once(DEPOT)
            .chain(self.stops.iter().map(|v| v.customer_id))
            .chain(std::iter::once(DEPOT))
            .collect()
    }

    /// Arcs of [`vertices`](Self::vertices); empty for a route without stops.
    pub fn arcs(&self) -> Vec<(usize, usize)> {
        if self.stops.is_empty() {
            return Vec::new();
        }
        self.vertices().windows(2).map(|w| (w[0], w[1])).collect()
    }

    /// Travel cost, as recorded by [`RouteEvaluator`](crate::evaluation::RouteEvaluator).
    pub fn total_distance(&self) -> f64 {
        self.distance
    }

    /// Demand picked up over the whole route.
    pub fn total_load(&self) -> i64 {
        self.stops.last().map_or(0, |v| v.load_after)
    }

    /// Records the travel cost.
    pub fn set_total_distance(&mut self, d: f64) {
        self.distance = d;
    }
}
