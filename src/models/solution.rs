//! Solution and violation types.

use serde::Serialize;

use super::Route;

/// A type of constraint violation in a route set.
#[derive(Debug, Clone, PartialEq)]
pub enum ViolationType {
    /// A route picks up more than Q.
    CapacityExceeded {
        /// Offending route.
        route_index: usize,
        /// Demand picked up by it.
        load: i64,
        /// Q.
        capacity: i32,
    },
    /// A customer is served by no route.
    CustomerMissing {
        /// Customer that was left out.
        customer_id: usize,
    },
    /// A customer is served more than once.
    CustomerRepeated {
        /// Customer that appears again.
        customer_id: usize,
        /// Route holding the repeated occurrence.
        route_index: usize,
    },
    /// A route references the depot mid-route or a vertex outside the instance.
    InvalidVertex {
        /// Offending vertex.
        vertex: usize,
        /// Route holding it.
        route_index: usize,
    },
}

/// One broken routing rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// What is broken, and where.
    pub kind: ViolationType,
}

impl Violation {
    /// Wraps `kind`.
    pub fn new(kind: ViolationType) -> Self {
        Self { kind }
    }
}

/// How a solve ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    /// The search closed: the routing is optimal.
    Optimal,
    /// The budget ran out; the routing is the best incumbent and may be
    /// suboptimal.
    TimeLimit,
}

/// An arc used by the solution together with the load it carries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UsedArc {
    /// Tail vertex.
    pub from: usize,
    /// Head vertex.
    pub to: usize,
    /// Value of the flow variable f[from, to].
    pub flow: f64,
}

/// A solved routing for one instance.
///
/// Routes are ordered by their first customer; arcs are ordered by
/// `(from, to)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    instance: String,
    routes: Vec<Route>,
    arcs: Vec<UsedArc>,
    objective: f64,
    status: SolveStatus,
    cuts_added: usize,
}

impl Solution {
    /// Assembles a solution.
    pub fn new(
        instance: impl Into<String>,
        routes: Vec<Route>,
        mut arcs: Vec<UsedArc>,
        status: SolveStatus,
    ) -> Self {
        arcs.sort_by_key(|a| (a.from, a.to));
        let objective = routes.iter().map(|r| r.total_distance()).sum();
        Self {
            instance: instance.into(),
            routes,
            arcs,
            objective,
            status,
            cuts_added: 0,
        }
    }

    /// Records how many cuts the search appended.
    pub fn with_cuts_added(mut self, cuts: usize) -> Self {
        self.cuts_added = cuts;
        self
    }

    /// Identifier of the solved instance.
    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// Routes, ordered by first customer.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Vehicles used.
    pub fn num_routes(&self) -> usize {
        self.routes.len()
    }

    /// Arcs with x = 1 and their flow values.
    pub fn arcs(&self) -> &[UsedArc] {
        &self.arcs
    }

    /// Total travel cost over all routes.
    pub fn objective(&self) -> f64 {
        self.objective
    }

    /// How the solve ended.
    pub fn status(&self) -> SolveStatus {
        self.status
    }

    /// `true` when the budget expired before optimality was proven.
    pub fn possibly_suboptimal(&self) -> bool {
        self.status == SolveStatus::TimeLimit
    }

    /// Number of cuts appended during the search.
    pub fn cuts_added(&self) -> usize {
        self.cuts_added
    }

    /// Customer stops over all routes.
    pub fn num_served(&self) -> usize {
        self.routes.iter().map(Route::len).sum()
    }

    /// Vertex sequences of every route, depot at both ends.
    pub fn route_vertices(&self) -> Vec<Vec<usize>> {
        self.routes.iter().map(|r| r.vertices()).collect()
    }
}
