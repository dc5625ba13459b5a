//! Structural validation of raw instance data.
//!
//! Detects, before any model is built:
//! - Empty instances (no depot)
//! - Distance matrix / demand vector dimension mismatches
//! - Negative or non-finite distances
//! - A non-zero depot demand
//! - Negative customer demands and demands above vehicle capacity
//! - Non-positive vehicle capacity

use std::fmt;

use super::InstanceData;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description naming the offending entry.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// The instance has no vertices, so not even a depot.
    EmptyInstance,
    /// Matrix rows/columns or the demand vector disagree with the vertex count.
    DimensionMismatch,
    /// A distance is below zero.
    NegativeDistance,
    /// A distance is NaN or infinite.
    NonFiniteDistance,
    /// The depot (vertex 0) carries demand.
    NonZeroDepotDemand,
    /// A customer demand is below zero.
    NegativeDemand,
    /// A customer demand cannot fit in any single vehicle.
    DemandExceedsCapacity,
    /// Vehicle capacity is zero or negative.
    InvalidCapacity,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validates raw instance data.
///
/// Checks:
/// 1. At least one vertex (the depot)
/// 2. The distance matrix is `num_vertices × num_vertices`
/// 3. Every distance is finite and non-negative
/// 4. There is one demand per vertex
/// 5. Vehicle capacity is positive
/// 6. The depot demand is zero
/// 7. Every customer demand lies in `0..=capacity`
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_instance(data: &InstanceData) -> ValidationResult {
    let mut errors = Vec::new();
    let n = data.num_vertices;

    if n == 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyInstance,
            "instance has no vertices",
        ));
    }

    if data.distance_matrix.len() != n {
        errors.push(ValidationError::new(
            ValidationErrorKind::DimensionMismatch,
            format!(
                "distance matrix has {} rows, expected {n}",
                data.distance_matrix.len()
            ),
        ));
    }

    for (i, row) in data.distance_matrix.iter().enumerate() {
        if row.len() != n {
            errors.push(ValidationError::new(
                ValidationErrorKind::DimensionMismatch,
                format!("distance matrix row {i} has {} entries, expected {n}", row.len()),
            ));
        }
        for (j, &d) in row.iter().enumerate() {
            if !d.is_finite() {
                errors.push(ValidationError::new(
                    ValidationErrorKind::NonFiniteDistance,
                    format!("distance[{i}][{j}] is {d}"),
                ));
            } else if d < 0.0 {
                errors.push(ValidationError::new(
                    ValidationErrorKind::NegativeDistance,
                    format!("distance[{i}][{j}] = {d}"),
                ));
            }
        }
    }

    if data.demands.len() != n {
        errors.push(ValidationError::new(
            ValidationErrorKind::DimensionMismatch,
            format!("{} demands given for {n} vertices", data.demands.len()),
        ));
    }

    let capacity = data.vehicle_capacity;
    if capacity <= 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidCapacity,
            format!("vehicle capacity = {capacity}"),
        ));
    }

    if let Some(&depot_demand) = data.demands.first() {
        if depot_demand != 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::NonZeroDepotDemand,
                format!("depot demand = {depot_demand}"),
            ));
        }
    }

    for (i, &q) in data.demands.iter().enumerate().skip(1) {
        if q < 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::NegativeDemand,
                format!("demand[{i}] = {q}"),
            ));
        } else if capacity > 0 && q > capacity {
            errors.push(ValidationError::new(
                ValidationErrorKind::DemandExceedsCapacity,
                format!("demand[{i}] = {q} exceeds vehicle capacity {capacity}"),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> InstanceData {
        InstanceData {
            num_vertices: 3,
            distance_matrix: vec![
                vec![0.0, 2.0, 2.0],
                vec![2.0, 0.0, 3.0],
                vec![2.0, 3.0, 0.0],
            ],
            demands: vec![0, 3, 4],
            vehicle_capacity: 5,
        }
    }

    fn kinds(result: ValidationResult) -> Vec<ValidationErrorKind> {
        result
            .expect_err("should fail")
            .into_iter()
            .map(|e| e.kind)
            .collect()
    }

    #[test]
    fn test_valid_instance() {
        assert!(validate_instance(&triangle()).is_ok());
    }

    #[test]
    fn test_empty_instance() {
        let data = InstanceData {
            num_vertices: 0,
            distance_matrix: vec![],
            demands: vec![],
            vehicle_capacity: 5,
        };
        assert_eq!(
            kinds(validate_instance(&data)),
            vec![ValidationErrorKind::EmptyInstance]
        );
    }

    #[test]
    fn test_row_count_mismatch() {
        let mut data = triangle();
        data.distance_matrix.pop();
        assert_eq!(
            kinds(validate_instance(&data)),
            vec![ValidationErrorKind::DimensionMismatch]
        );
    }

    #[test]
    fn test_ragged_row() {
        let mut data = triangle();
        data.distance_matrix[1].push(9.0);
        let errors = validate_instance(&data).expect_err("ragged");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ValidationErrorKind::DimensionMismatch);
        assert!(errors[0].message.contains("row 1"));
    }

    #[test]
    fn test_bad_distances() {
        let mut data = triangle();
        data.distance_matrix[0][1] = -1.0;
        data.distance_matrix[2][0] = f64::NAN;
        assert_eq!(
            kinds(validate_instance(&data)),
            vec![
                ValidationErrorKind::NegativeDistance,
                ValidationErrorKind::NonFiniteDistance,
            ]
        );
    }

    #[test]
    fn test_demand_count_mismatch() {
        let mut data = triangle();
        data.demands.push(1);
        assert_eq!(
            kinds(validate_instance(&data)),
            vec![ValidationErrorKind::DimensionMismatch]
        );
    }

    #[test]
    fn test_depot_demand() {
        let mut data = triangle();
        data.demands[0] = 1;
        assert_eq!(
            kinds(validate_instance(&data)),
            vec![ValidationErrorKind::NonZeroDepotDemand]
        );
    }

    #[test]
    fn test_demand_exceeds_capacity() {
        let mut data = triangle();
        data.demands[2] = 6;
        let errors = validate_instance(&data).expect_err("too heavy");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ValidationErrorKind::DemandExceedsCapacity);
        assert!(errors[0].message.contains("demand[2] = 6"));
    }

    #[test]
    fn test_negative_demand() {
        let mut data = triangle();
        data.demands[1] = -2;
        assert_eq!(
            kinds(validate_instance(&data)),
            vec![ValidationErrorKind::NegativeDemand]
        );
    }

    #[test]
    fn test_invalid_capacity_reported_once() {
        let mut data = triangle();
        data.vehicle_capacity = 0;
        assert_eq!(
            kinds(validate_instance(&data)),
            vec![ValidationErrorKind::InvalidCapacity]
        );
    }
}
