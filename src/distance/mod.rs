//! Distance matrices.
//!
//! Provides a dense, row-major distance matrix for routing instances.

mod matrix;

pub use matrix::DistanceMatrix;
