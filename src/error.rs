//! Crate-level error type.

use std::fmt;

use crate::models::ValidationError;

/// Errors surfaced by instance loading, solving, and delivery.
///
/// Transient max-flow failures during cut separation never appear here; they
/// are absorbed by the separator.
#[derive(Debug, Clone, PartialEq)]
pub enum CvrpError {
    /// The instance is malformed; no solve was attempted.
    Validation {
        /// Instance identifier.
        instance: String,
        /// Every violated constraint, in detection order.
        errors: Vec<ValidationError>,
    },
    /// The instance source has no instance under this identifier.
    NotFound {
        /// Requested identifier.
        id: String,
    },
    /// The instance payload exists but could not be decoded.
    Malformed {
        /// Requested identifier.
        id: String,
        /// Decoder message.
        message: String,
    },
    /// The solver proved that no feasible routing exists.
    Infeasible {
        /// Instance identifier.
        instance: String,
    },
    /// The budget ran out (or the solve was cancelled) before any feasible
    /// point was known.
    NoSolution {
        /// Instance identifier.
        instance: String,
    },
    /// The MIP engine failed, or its answer could not be turned into routes.
    Solver {
        /// Instance identifier.
        instance: String,
        /// Cause reported by the engine or reconstruction.
        message: String,
    },
    /// The result sink rejected the solution.
    Delivery {
        /// Cause reported by the sink.
        message: String,
    },
}

impl fmt::Display for CvrpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CvrpError::Validation { instance, errors } => {
                write!(f, "instance '{instance}' is invalid")?;
                for (i, e) in errors.iter().enumerate() {
                    let sep = if i == 0 { ": " } else { "; " };
                    write!(f, "{sep}{e}")?;
                }
                Ok(())
            }
            CvrpError::NotFound { id } => write!(f, "instance '{id}' not found"),
            CvrpError::Malformed { id, message } => {
                write!(f, "instance '{id}' could not be decoded: {message}")
            }
            CvrpError::Infeasible { instance } => {
                write!(f, "instance '{instance}' has no feasible routing")
            }
            CvrpError::NoSolution { instance } => write!(
                f,
                "no feasible solution found for instance '{instance}' within the budget"
            ),
            CvrpError::Solver { instance, message } => {
                write!(f, "solver failed on instance '{instance}': {message}")
            }
            CvrpError::Delivery { message } => write!(f, "result delivery failed: {message}"),
        }
    }
}

impl std::error::Error for CvrpError {}
