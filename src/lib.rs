//! # u-cvrp
//!
//! Exact solver for the capacitated vehicle routing problem (CVRP) by
//! branch-and-cut over a single-commodity flow formulation.
//!
//! ## Modules
//!
//! - [`models`] — Instance, route, and solution types; instance validation
//! - [`distance`] — Dense distance matrix
//! - [`evaluation`] — Route cost, load, and coverage checks
//! - [`constructive`] — Closest-neighbor heuristic used as warm start
//! - [`formulation`] — Backend-neutral MILP and the flow model builder
//! - [`separation`] — Rounded capacity cuts via max-flow / min-cut
//! - [`solver`] — Configuration, MIP backend seam, and the solve driver
//! - [`source`] — Instance sources, result sinks, request handling
//!
//! ## Example
//!
//! ```
//! use u_cvrp::distance::DistanceMatrix;
//! use u_cvrp::models::Instance;
//! use u_cvrp::solver::{MicroLpBackend, SolverConfig, SolverDriver};
//!
//! let dm = DistanceMatrix::from_points(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
//! let instance = Instance::new("line", dm, vec![0, 2, 2], 10)?;
//! let solution = SolverDriver::new(MicroLpBackend::new(), SolverConfig::default())
//!     .solve(&instance, None)?;
//! assert_eq!(solution.num_routes(), 1);
//! assert!((solution.objective() - 4.0).abs() < 1e-6);
//! # Ok::<(), u_cvrp::CvrpError>(())
//! ```

pub mod constructive;
pub mod distance;
mod error;
pub mod evaluation;
pub mod formulation;
pub mod models;
pub mod separation;
pub mod solver;
pub mod source;

pub use error::CvrpError;
