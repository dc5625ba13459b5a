//! Cutting-plane separation for the flow formulation.
//!
//! - [`CutSeparator`] — the hook a MIP search calls on each candidate point
//! - [`CapacityCutSeparator`] — rounded capacity cuts via max-flow / min-cut
//! - [`FlowNetwork`] — support-graph max-flow and residual min-cut partition

mod capacity;
mod cut;
mod network;

pub use capacity::CapacityCutSeparator;
pub use cut::{Cut, CutKind, CutPolicy, CutSeparator};
pub use network::{FlowError, FlowNetwork, MinCut};
