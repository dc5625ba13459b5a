//! Route evaluation: distance, cumulative load, and feasibility checks.

mod evaluator;

pub use evaluator::RouteEvaluator;
