//! Constructive heuristics for building an initial CVRP routing.
//!
//! - [`closest_neighbor`] — Greedy closest-neighbor route building with
//!   capacity-aware extension and lowest-id tie-breaking, O(n²)

mod closest_neighbor;

pub use closest_neighbor::{closest_neighbor, closest_neighbor_routes};
