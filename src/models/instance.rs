//! CVRP instance types.

use serde::{Deserialize, Serialize};

use super::validation::validate_instance;
use crate::distance::DistanceMatrix;
use crate::error::CvrpError;

/// Index of the depot vertex.
pub const DEPOT: usize = 0;

/// Raw instance payload as stored by instance sources.
///
/// Field names follow the stored JSON documents:
///
/// ```json
/// { "num_vertices": 3,
///   "distance_matrix": [[0, 2, 2], [2, 0, 3], [2, 3, 0]],
///   "demands": [0, 3, 4],
///   "vehicle_capacity": 5 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceData {
    /// Vertex count, depot included.
    pub num_vertices: usize,
    /// Row-major `num_vertices × num_vertices` travel costs.
    pub distance_matrix: Vec<Vec<f64>>,
    /// Demand per vertex; entry 0 is the depot.
    pub demands: Vec<i32>,
    /// Capacity Q shared by every vehicle.
    pub vehicle_capacity: i32,
}

/// A validated, immutable CVRP instance.
///
/// Vertex 0 is the depot; vertices `1..n` are customers.
///
/// # Examples
///
/// ```
/// use u_cvrp::distance::DistanceMatrix;
/// use u_cvrp::models::Instance;
///
/// let dm = DistanceMatrix::from_points(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]);
/// let instance = Instance::new("toy", dm, vec![0, 3, 4], 5).unwrap();
/// assert_eq!(instance.num_vertices(), 3);
/// assert_eq!(instance.customers().collect::<Vec<_>>(), vec![1, 2]);
/// assert_eq!(instance.total_demand(), 7);
///
/// let dm = DistanceMatrix::from_points(&[(0.0, 0.0), (1.0, 0.0)]);
/// assert!(Instance::new("heavy", dm, vec![0, 9], 5).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    id: String,
    distances: DistanceMatrix,
    demands: Vec<i32>,
    capacity: i32,
}

impl Instance {
    /// Creates a validated instance.
    ///
    /// The vertex count is the length of `demands`.
    pub fn new(
        id: impl Into<String>,
        distances: DistanceMatrix,
        demands: Vec<i32>,
        capacity: i32,
    ) -> Result<Self, CvrpError> {
        let id = id.into();
        let n = distances.size();
        let rows = (0..n).map(|i| distances.row(i).to_vec()).collect();
        let data = InstanceData {
            num_vertices: demands.len(),
            distance_matrix: rows,
            demands,
            vehicle_capacity: capacity,
        };
        Self::from_data(id, data)
    }

    /// Validates raw data and converts it into an instance.
    ///
    /// Every violated constraint is reported, not just the first.
    pub fn from_data(id: impl Into<String>, data: InstanceData) -> Result<Self, CvrpError> {
        let id = id.into();
        if let Err(errors) = validate_instance(&data) {
            return Err(CvrpError::Validation {
                instance: id,
                errors,
            });
        }
        let distances = DistanceMatrix::from_rows(&data.distance_matrix).ok_or_else(|| {
            CvrpError::Malformed {
                id: id.clone(),
                message: "distance matrix is not square".into(),
            }
        })?;
        Ok(Self {
            id,
            distances,
            demands: data.demands,
            capacity: data.vehicle_capacity,
        })
    }

    /// Converts back into the raw stored form.
    pub fn to_data(&self) -> InstanceData {
        let n = self.num_vertices();
        InstanceData {
            num_vertices: n,
            distance_matrix: (0..n).map(|i| self.distances.row(i).to_vec()).collect(),
            demands: self.demands.clone(),
            vehicle_capacity: self.capacity,
        }
    }

    /// Instance identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Vertex count n, depot included.
    pub fn num_vertices(&self) -> usize {
        self.demands.len()
    }

    /// Number of customers (n − 1).
    pub fn num_customers(&self) -> usize {
        self.num_vertices().saturating_sub(1)
    }

    /// Customer vertex ids in ascending order.
    pub fn customers(&self) -> impl Iterator<Item = usize> {
        1..self.num_vertices()
    }

    /// Demand of vertex `v`.
    pub fn demand(&self, v: usize) -> i32 {
        self.demands[v]
    }

    /// All demands, depot first.
    pub fn demands(&self) -> &[i32] {
        &self.demands
    }

    /// Vehicle capacity Q.
    pub fn capacity(&self) -> i32 {
        self.capacity
    }

    /// Travel cost of arc `(from, to)`.
    pub fn distance(&self, from: usize, to: usize) -> f64 {
        self.distances.get(from, to)
    }

    /// The full distance matrix.
    pub fn distances(&self) -> &DistanceMatrix {
        &self.distances
    }

    /// Sum of all customer demands.
    pub fn total_demand(&self) -> i64 {
        self.demands.iter().map(|&q| i64::from(q)).sum()
    }
}
