//! Max-flow / min-cut over the support graph of a fractional solution.

use std::collections::VecDeque;
use std::fmt;

use petgraph::algo::ford_fulkerson;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::formulation::ArcTable;

/// Why a max-flow computation was abandoned for one sink.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowError {
    /// Source and sink coincide.
    SameEndpoints(usize),
    /// A terminal is not a vertex of the network.
    NodeOutOfRange(usize),
    /// The computed flow value is NaN or infinite.
    NonFiniteFlow(f64),
}

impl fmt::Display for FlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowError::SameEndpoints(v) => write!(f, "source and sink are both vertex {v}"),
            FlowError::NodeOutOfRange(v) => write!(f, "vertex {v} is not in the network"),
            FlowError::NonFiniteFlow(value) => write!(f, "max-flow value {value} is not finite"),
        }
    }
}

impl std::error::Error for FlowError {}

/// Result of a minimum s–t cut.
#[derive(Debug, Clone, PartialEq)]
pub struct MinCut {
    /// Max-flow value, equal to the cut capacity.
    pub value: f64,
    /// Vertices on the sink side (not reachable from the source in the
    /// residual network), ascending.
    pub sink_side: Vec<usize>,
}

/// Directed capacitated network over vertices `0..n`.
#[derive(Debug, Clone)]
pub struct FlowNetwork {
    graph: DiGraph<(), f64>,
}

impl FlowNetwork {
    /// Creates a network with `n` vertices and no edges.
    pub fn new(n: usize) -> Self {
        let mut graph = DiGraph::with_capacity(n, n * 2);
        for _ in 0..n {
            graph.add_node(());
        }
        Self { graph }
    }

    /// Support graph of arc values: one edge per arc with a positive value,
    /// whose capacity is that value.
    pub fn from_arc_values(values: &ArcTable<f64>) -> Self {
        let mut net = Self::new(values.num_vertices());
        for (i, j, &v) in values.arcs() {
            if v > 0.0 {
                net.add_edge(i, j, v);
            }
        }
        net
    }

    /// Adds edge `u → v` with the given capacity.
    pub fn add_edge(&mut self, u: usize, v: usize, capacity: f64) {
        self.graph
            .add_edge(NodeIndex::new(u), NodeIndex::new(v), capacity);
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    pub fn num_edges(&self) -> usize {
        self.graph.edge_count()
    }

    /// Computes a maximum `source → sink` flow and the induced minimum cut.
    ///
    /// Residual capacities at or below `tol` are treated as saturated when
    /// partitioning the vertices.
    pub fn min_cut(&self, source: usize, sink: usize, tol: f64) -> Result<MinCut, FlowError> {
        let n = self.num_vertices();
        for v in [source, sink] {
            if v >= n {
                return Err(FlowError::NodeOutOfRange(v));
            }
        }
        if source == sink {
            return Err(FlowError::SameEndpoints(source));
        }

        let (value, flows) =
            ford_fulkerson(&self.graph, NodeIndex::new(source), NodeIndex::new(sink));
        if !value.is_finite() {
            return Err(FlowError::NonFiniteFlow(value));
        }

        let mut reached = vec![false; n];
        reached[source] = true;
        let mut queue = VecDeque::from([source]);
        while let Some(u) = queue.pop_front() {
            let node = NodeIndex::new(u);
            for e in self.graph.edges_directed(node, Direction::Outgoing) {
                let residual = *e.weight() - flows[e.id().index()];
                let w = e.target().index();
                if residual > tol && !reached[w] {
                    reached[w] = true;
                    queue.push_back(w);
                }
            }
            for e in self.graph.edges_directed(node, Direction::Incoming) {
                let w = e.source().index();
                if flows[e.id().index()] > tol && !reached[w] {
                    reached[w] = true;
                    queue.push_back(w);
                }
            }
        }

        let sink_side = (0..n).filter(|&v| !reached[v]).collect();
        Ok(MinCut { value, sink_side })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_simple_bottleneck() {
        // 0 → 1 → 2 with capacities 3 and 1
        let mut net = FlowNetwork::new(3);
        net.add_edge(0, 1, 3.0);
        net.add_edge(1, 2, 1.0);
        let cut = net.min_cut(0, 2, EPS).expect("flow");
        assert!((cut.value - 1.0).abs() < EPS);
        assert_eq!(cut.sink_side, vec![2]);
    }

    #[test]
    fn test_parallel_paths() {
        let mut net = FlowNetwork::new(4);
        net.add_edge(0, 1, 0.5);
        net.add_edge(0, 2, 0.25);
        net.add_edge(1, 3, 0.5);
        net.add_edge(2, 3, 1.0);
        let cut = net.min_cut(0, 3, EPS).expect("flow");
        assert!((cut.value - 0.75).abs() < EPS);
        assert_eq!(cut.sink_side, vec![1, 2, 3]);
    }

    #[test]
    fn test_disconnected_sink() {
        let mut net = FlowNetwork::new(4);
        net.add_edge(0, 1, 1.0);
        net.add_edge(1, 0, 1.0);
        net.add_edge(2, 3, 1.0);
        net.add_edge(3, 2, 1.0);
        let cut = net.min_cut(0, 3, EPS).expect("flow");
        assert_eq!(cut.value, 0.0);
        assert_eq!(cut.sink_side, vec![2, 3]);
    }

    #[test]
    fn test_from_arc_values_skips_zero() {
        let mut values = ArcTable::new(3, 0.0);
        values.set(0, 1, 1.0);
        values.set(1, 2, 0.0);
        values.set(2, 0, 0.3);
        let net = FlowNetwork::from_arc_values(&values);
        assert_eq!(net.num_vertices(), 3);
        assert_eq!(net.num_edges(), 2);
    }

    #[test]
    fn test_bad_terminals() {
        let net = FlowNetwork::new(2);
        assert_eq!(net.min_cut(0, 0, EPS), Err(FlowError::SameEndpoints(0)));
        assert_eq!(net.min_cut(0, 5, EPS), Err(FlowError::NodeOutOfRange(5)));
    }

    #[test]
    fn test_infinite_capacity_is_rejected() {
        let mut net = FlowNetwork::new(3);
        net.add_edge(0, 1, f64::INFINITY);
        net.add_edge(1, 2, 1.0);
        assert!(matches!(net.min_cut(0, 1, EPS), Err(FlowError::NonFiniteFlow(_))));
    }
}
