//! Flat arc-indexed storage.

/// Dense per-arc table over an n-vertex complete digraph.
///
/// Cell `(i, j)` lives at `i * n + j`, matching
/// [`DistanceMatrix`](crate::distance::DistanceMatrix), so the separation
/// loop walks contiguous memory.
///
/// # Examples
///
/// ```
/// use u_cvrp::formulation::ArcTable;
///
/// let mut t = ArcTable::new(3, 0.0);
/// t.set(1, 2, 0.5);
/// assert_eq!(t.get(1, 2), &0.5);
/// assert_eq!(t.index(1, 2), 5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ArcTable<T> {
    n: usize,
    cells: Vec<T>,
}

impl<T: Clone> ArcTable<T> {
    /// Creates a table for `n` vertices with every cell set to `fill`.
    pub fn new(n: usize, fill: T) -> Self {
        Self {
            n,
            cells: vec![fill; n * n],
        }
    }
}

impl<T> ArcTable<T> {
    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.n
    }

    /// Flat position of arc `(i, j)`.
    #[inline]
    pub fn index(&self, i: usize, j: usize) -> usize {
        i * self.n + j
    }

    /// Cell of arc `(i, j)`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> &T {
        &self.cells[i * self.n + j]
    }

    /// Overwrites the cell of arc `(i, j)`.
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: T) {
        let k = self.index(i, j);
        self.cells[k] = value;
    }

    /// Iterates `(i, j, &cell)` for every ordered pair with `i != j`.
    pub fn arcs(&self) -> impl Iterator<Item = (usize, usize, &T)> + '_ {
        let n = self.n;
        self.cells
            .iter()
            .enumerate()
            .map(move |(k, cell)| (k / n, k % n, cell))
            .filter(|&(i, j, _)| i != j)
    }
}
