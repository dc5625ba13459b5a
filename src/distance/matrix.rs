//! Dense distance matrix.

/// Travel costs between every ordered pair of vertices.
///
/// Cells are kept flat with cost `(i, j)` at `i * n + j`, matching
/// [`ArcTable`](crate::formulation::ArcTable). Costs need not be symmetric.
///
/// # Examples
///
/// ```
/// use u_cvrp::distance::DistanceMatrix;
///
/// let dm = DistanceMatrix::from_rows(&[vec![0.0, 4.0], vec![6.0, 0.0]]).unwrap();
/// assert_eq!(dm.get(0, 1), 4.0);
/// assert_eq!(dm.get(1, 0), 6.0);
/// assert_eq!(dm.row(1), &[6.0, 0.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    cells: Vec<f64>,
    n: usize,
}

impl DistanceMatrix {
    /// All-zero matrix over `n` vertices.
    pub fn new(n: usize) -> Self {
        Self {
            cells: vec![0.0; n * n],
            n,
        }
    }

    /// Euclidean costs between planar points.
    pub fn from_points(points: &[(f64, f64)]) -> Self {
        let cells = points
            .iter()
            .flat_map(|&(ax, ay)| {
                points
                    .iter()
                    .map(move |&(bx, by)| (ax - bx).hypot(ay - by))
            })
            .collect();
        Self {
            cells,
            n: points.len(),
        }
    }

    /// Matrix from nested rows; `None` unless the rows form a square.
    pub fn from_rows(rows: &[Vec<f64>]) -> Option<Self> {
        let n = rows.len();
        if rows.iter().any(|r| r.len() != n) {
            return None;
        }
        Some(Self {
            cells: rows.concat(),
            n,
        })
    }

    #[inline]
    fn offset(&self, from: usize, to: usize) -> usize {
        from * self.n + to
    }

    /// Cost of travelling `from → to`. Panics on an out-of-range vertex.
    pub fn get(&self, from: usize, to: usize) -> f64 {
        self.cells[self.offset(from, to)]
    }

    /// Overwrites the cost of `from → to`.
    pub fn set(&mut self, from: usize, to: usize, cost: f64) {
        let k = self.offset(from, to);
        self.cells[k] = cost;
    }

    /// Vertex count.
    pub fn size(&self) -> usize {
        self.n
    }

    /// Costs of leaving vertex `from`.
    pub fn row(&self, from: usize) -> &[f64] {
        let start = self.offset(from, 0);
        &self.cells[start..start + self.n]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_are_euclidean() {
        let dm = DistanceMatrix::from_points(&[(1.0, 1.0), (4.0, 5.0), (1.0, -2.0)]);
        assert_eq!(dm.size(), 3);
        assert!((dm.get(0, 1) - 5.0).abs() < 1e-12);
        assert!((dm.get(2, 0) - 3.0).abs() < 1e-12);
        assert_eq!(dm.get(1, 1), 0.0);
        assert_eq!(dm.get(1, 2), dm.get(2, 1));
    }

    #[test]
    fn test_rows_keep_direction() {
        let dm = DistanceMatrix::from_rows(&[
            vec![0.0, 1.0, 7.0],
            vec![2.0, 0.0, 3.0],
            vec![9.0, 4.0, 0.0],
        ])
        .expect("square");
        assert_eq!(dm.get(0, 2), 7.0);
        assert_eq!(dm.get(2, 0), 9.0);
        assert_eq!(dm.row(1), &[2.0, 0.0, 3.0]);
    }

    #[test]
    fn test_rows_must_be_square() {
        assert!(DistanceMatrix::from_rows(&[vec![0.0, 2.0], vec![3.0]]).is_none());
        assert!(DistanceMatrix::from_rows(&[vec![0.0, 2.0, 1.0], vec![3.0, 0.0, 1.0]]).is_none());
        assert_eq!(DistanceMatrix::from_rows(&[]).map(|d| d.size()), Some(0));
    }

    #[test]
    fn test_overwrite_single_direction() {
        let mut dm = DistanceMatrix::new(2);
        dm.set(1, 0, 2.5);
        assert_eq!(dm.get(1, 0), 2.5);
        assert_eq!(dm.get(0, 1), 0.0);
    }
}
