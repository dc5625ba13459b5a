//! Integer-programming formulation of the CVRP.
//!
//! - [`MipModel`] and friends describe a MILP independently of any engine.
//! - [`ArcTable`] stores per-arc data flat, indexed by `i·n + j`.
//! - [`FormulationBuilder`] emits the single-commodity flow model.

mod arcs;
mod builder;
mod model;

pub use arcs::ArcTable;
pub use builder::{flow_bounds, Formulation, FormulationBuilder};
pub use model::{
    Assignment, LinearConstraint, LinearExpr, MipModel, Sense, VarId, VarKind, Variable,
};
