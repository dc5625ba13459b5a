//! Domain model types for capacitated vehicle routing.
//!
//! Provides the validated problem instance, routes as ordered sequences of
//! customer visits, and the solution handed back to callers.

mod instance;
mod route;
mod solution;
mod validation;

pub use instance::{Instance, InstanceData, DEPOT};
pub use route::{Route, Visit};
pub use solution::{Solution, SolveStatus, UsedArc, Violation, ViolationType};
pub use validation::{validate_instance, ValidationError, ValidationErrorKind, ValidationResult};
