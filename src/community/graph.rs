// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Weighted undirected graph used at every aggregation level.
//!
//! Nodes are the dense range `0..N`. Edges are kept as given, parallel edges
//! included, and every derived aggregate (degrees, total weight, incident
//! edge lists) is computed once at construction.

use fixedbitset::FixedBitSet;
use foldhash::{HashSet, HashSetExt};
use petgraph::graph::UnGraph;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{LouvainError, Result};

/// An undirected weighted edge. `source == target` is a self-loop.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: usize,
    pub target: usize,
    pub weight: f64,
}

impl Edge {
    pub fn new(source: usize, target: usize, weight: f64) -> Self {
        Edge {
            source,
            target,
            weight,
        }
    }

    #[inline]
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }

    /// The endpoint opposite to `node`. Only meaningful when `node` is an
    /// endpoint of this edge.
    #[inline]
    pub fn other(&self, node: usize) -> usize {
        if self.source == node {
            self.target
        } else {
            self.source
        }
    }
}

/// Incident edge indices of one node. Most nodes in sparse graphs have a
/// handful of edges, so they stay inline.
type IncidentEdges = SmallVec<[usize; 8]>;

/// Represents one aggregation level of the graph for the Louvain algorithm
#[derive(Clone, Debug)]
pub struct WeightedGraph {
    /// Number of nodes in the graph
    num_nodes: usize,
    /// Edges as supplied, indexed by position
    edges: Vec<Edge>,
    /// Twice the sum of all edge weights (sum of all degrees)
    total_weight2: f64,
    /// Weighted degree per node, self-loops counted twice
    degree: Vec<f64>,
    /// Summed self-loop weight per node
    self_loops: Vec<f64>,
    /// Edge indices touching each node; a self-loop is listed once
    incident: Vec<IncidentEdges>,
}

impl WeightedGraph {
    /// Build a graph from an explicit node list and an edge list.
    ///
    /// # Arguments
    /// * `nodes` - The node ids, which must be exactly the range `0..N` in any order
    /// * `edges` - Undirected weighted edges between those nodes
    ///
    /// # Returns
    /// * `InvalidGraph` if the ids are not dense, an edge references an unknown
    ///   node, or a weight is negative or not finite
    pub fn new<I, E>(nodes: I, edges: E) -> Result<Self>
    where
        I: IntoIterator<Item = usize>,
        E: IntoIterator<Item = (usize, usize, f64)>,
    {
        let nodes: Vec<usize> = nodes.into_iter().collect();
        let num_nodes = nodes.len();
        let mut seen = FixedBitSet::with_capacity(num_nodes);
        for &node in &nodes {
            if node >= num_nodes {
                return Err(LouvainError::InvalidGraph(format!(
                    "node id {node} is outside the dense range 0..{num_nodes}"
                )));
            }
            if seen.put(node) {
                return Err(LouvainError::InvalidGraph(format!(
                    "node id {node} is listed more than once"
                )));
            }
        }
        Self::with_node_count(num_nodes, edges)
    }

    /// Build a graph whose nodes are implicitly `0..num_nodes`.
    pub fn with_node_count<E>(num_nodes: usize, edges: E) -> Result<Self>
    where
        E: IntoIterator<Item = (usize, usize, f64)>,
    {
        let edges = edges
            .into_iter()
            .map(|(source, target, weight)| Edge::new(source, target, weight))
            .collect();
        Self::from_edges(num_nodes, edges)
    }

    /// Build a graph over `0..num_nodes` from [`Edge`] values.
    pub fn from_edges(num_nodes: usize, edges: Vec<Edge>) -> Result<Self> {
        for (idx, edge) in edges.iter().enumerate() {
            for endpoint in [edge.source, edge.target] {
                if endpoint >= num_nodes {
                    return Err(LouvainError::InvalidGraph(format!(
                        "edge {idx} ({}, {}) references node {endpoint}, but the graph has {num_nodes} nodes",
                        edge.source, edge.target
                    )));
                }
            }
            if !edge.weight.is_finite() || edge.weight < 0.0 {
                return Err(LouvainError::InvalidGraph(format!(
                    "edge {idx} ({}, {}) has weight {}, weights must be finite and non-negative",
                    edge.source, edge.target, edge.weight
                )));
            }
        }
        Ok(Self::from_validated(num_nodes, edges))
    }

    /// Convert a petgraph undirected graph.
    ///
    /// Node indices of a `petgraph::Graph` are always compact, so they are
    /// used directly as node ids.
    ///
    /// # Arguments
    /// * `graph` - The input graph
    /// * `weight_fn` - Extracts the weight of an edge from its payload
    pub fn from_petgraph<N, E, F>(graph: &UnGraph<N, E>, mut weight_fn: F) -> Result<Self>
    where
        F: FnMut(&E) -> f64,
    {
        let edges: Vec<Edge> = graph
            .edge_references()
            .map(|edge| {
                Edge::new(
                    edge.source().index(),
                    edge.target().index(),
                    weight_fn(edge.weight()),
                )
            })
            .collect();
        Self::from_edges(graph.node_count(), edges)
    }

    /// Compute the derived aggregates in one pass over the edges.
    pub(crate) fn from_validated(num_nodes: usize, edges: Vec<Edge>) -> Self {
        let mut degree = vec![0.0; num_nodes];
        let mut self_loops = vec![0.0; num_nodes];
        let mut incident = vec![IncidentEdges::new(); num_nodes];
        let mut total_weight2 = 0.0;

        for (idx, edge) in edges.iter().enumerate() {
            total_weight2 += 2.0 * edge.weight;
            degree[edge.source] += edge.weight;
            degree[edge.target] += edge.weight;
            incident[edge.source].push(idx);
            if edge.is_self_loop() {
                self_loops[edge.source] += edge.weight;
            } else {
                incident[edge.target].push(idx);
            }
        }

        WeightedGraph {
            num_nodes,
            edges,
            total_weight2,
            degree,
            self_loops,
            incident,
        }
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.num_nodes
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Node ids, always `0..node_count()`.
    pub fn nodes(&self) -> std::ops::Range<usize> {
        0..self.num_nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Twice the total edge weight, `2m`.
    #[inline]
    pub fn total_weight2(&self) -> f64 {
        self.total_weight2
    }

    /// Total edge weight, `m`.
    #[inline]
    pub fn total_weight(&self) -> f64 {
        self.total_weight2 / 2.0
    }

    /// Weighted degree of `node`, self-loops counted twice.
    #[inline]
    pub fn degree(&self, node: usize) -> f64 {
        self.degree[node]
    }

    /// Summed weight of the self-loops on `node`.
    #[inline]
    pub fn self_loop_weight(&self, node: usize) -> f64 {
        self.self_loops[node]
    }

    /// Indices into [`edges`](Self::edges) of the edges touching `node`.
    pub fn incident_edges(&self, node: usize) -> &[usize] {
        &self.incident[node]
    }

    /// Lazily yields `(neighbor, weight)` for every incident edge of `node`,
    /// skipping self-loops. A neighbor joined by parallel edges is yielded
    /// once per edge.
    pub fn neighbor_weights(&self, node: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.incident[node].iter().filter_map(move |&idx| {
            let edge = &self.edges[idx];
            if edge.is_self_loop() {
                None
            } else {
                Some((edge.other(node), edge.weight))
            }
        })
    }

    /// Distinct neighbors of `node` in order of first appearance, excluding
    /// `node` itself.
    pub fn neighbors(&self, node: usize) -> Vec<usize> {
        let mut seen = HashSet::with_capacity(self.incident[node].len());
        self.neighbor_weights(node)
            .filter_map(|(neighbor, _)| seen.insert(neighbor).then_some(neighbor))
            .collect()
    }

    /// Weight between `a` and `b`, summed over parallel edges; `0.0` if they
    /// are not adjacent. `edge_weight(a, a)` is the self-loop weight.
    pub fn edge_weight(&self, a: usize, b: usize) -> f64 {
        if a == b {
            return self.self_loops[a];
        }
        self.neighbor_weights(a)
            .filter(|&(neighbor, _)| neighbor == b)
            .map(|(_, weight)| weight)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::{Edge, WeightedGraph};
    use crate::error::LouvainError;

    fn triangle_with_loop() -> WeightedGraph {
        WeightedGraph::with_node_count(
            4,
            vec![
                (0, 1, 1.0),
                (1, 2, 2.0),
                (2, 0, 0.5),
                (2, 2, 3.0),
                (1, 0, 1.5),
            ],
        )
        .unwrap()
    }

    #[test]
    fn degrees_sum_to_twice_the_total_weight() {
        let graph = triangle_with_loop();
        assert_eq!(graph.total_weight2(), 16.0);
        assert_eq!(graph.total_weight(), 8.0);
        assert_eq!(graph.degree(0), 3.0);
        assert_eq!(graph.degree(1), 4.5);
        assert_eq!(graph.degree(2), 8.5);
        assert_eq!(graph.degree(3), 0.0);
        let sum: f64 = graph.nodes().map(|n| graph.degree(n)).sum();
        assert_eq!(sum, graph.total_weight2());
    }

    #[test]
    fn self_loops_are_listed_once() {
        let graph = triangle_with_loop();
        assert_eq!(graph.incident_edges(2), &[1, 2, 3]);
        assert_eq!(graph.self_loop_weight(2), 3.0);
        assert_eq!(graph.edge_weight(2, 2), 3.0);
    }

    #[test]
    fn neighbors_are_distinct_and_exclude_self() {
        let graph = triangle_with_loop();
        assert_eq!(graph.neighbors(0), vec![1, 2]);
        assert_eq!(graph.neighbors(2), vec![1, 0]);
        assert!(graph.neighbors(3).is_empty());
        assert_eq!(graph.neighbor_weights(0).count(), 3);
    }

    #[test]
    fn edge_weight_sums_parallel_edges_in_both_directions() {
        let graph = triangle_with_loop();
        assert_eq!(graph.edge_weight(0, 1), 2.5);
        assert_eq!(graph.edge_weight(1, 0), 2.5);
        assert_eq!(graph.edge_weight(0, 3), 0.0);
    }

    #[test]
    fn rejects_edge_outside_range() {
        let err = WeightedGraph::with_node_count(3, vec![(0, 3, 1.0)]).unwrap_err();
        assert!(matches!(err, LouvainError::InvalidGraph(_)));
    }

    #[test]
    fn rejects_bad_weights() {
        for weight in [-1.0, f64::NAN, f64::INFINITY] {
            let err = WeightedGraph::with_node_count(2, vec![(0, 1, weight)]).unwrap_err();
            assert!(matches!(err, LouvainError::InvalidGraph(_)));
        }
        assert!(WeightedGraph::with_node_count(2, vec![(0, 1, 0.0)]).is_ok());
    }

    #[test]
    fn rejects_sparse_or_duplicate_node_ids() {
        let edges = vec![(0, 1, 1.0), (1, 2, 1.0)];
        assert!(WeightedGraph::new(vec![2, 0, 1], edges.clone()).is_ok());
        assert!(matches!(
            WeightedGraph::new(vec![0, 1, 3], edges.clone()),
            Err(LouvainError::InvalidGraph(_))
        ));
        assert!(matches!(
            WeightedGraph::new(vec![0, 1, 1], edges),
            Err(LouvainError::InvalidGraph(_))
        ));
    }

    #[test]
    fn from_edges_accepts_edge_values() {
        let graph =
            WeightedGraph::from_edges(2, vec![Edge::new(0, 1, 2.0), Edge::new(1, 1, 1.0)]).unwrap();
        assert_eq!(graph.degree(1), 4.0);
        assert_eq!(graph.edges()[1].other(1), 1);
        assert!(graph.edges()[1].is_self_loop());
    }
}
