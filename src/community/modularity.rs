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

//! Newman-Girvan modularity of a partition.

use fixedbitset::FixedBitSet;

use super::graph::WeightedGraph;
use crate::error::{LouvainError, Result};

/// Calculate the modularity of a graph given a partition.
///
/// Modularity is a measure of the quality of a division of a network into
/// communities. Higher values indicate a better partition.
///
/// # Arguments
/// * `graph` - The graph the partition refers to
/// * `partition` - Communities as lists of node ids; empty lists are ignored
///
/// # Returns
/// * `DegenerateGraph` if the graph has no edge weight
/// * `InvalidPartition` if a node is unknown, repeated, or missing
pub fn modularity(graph: &WeightedGraph, partition: &[Vec<usize>]) -> Result<f64> {
    modularity_with_resolution(graph, partition, 1.0)
}

/// Modularity with a resolution parameter:
///
/// ```text
/// Q = Σ_c [ L_c / m - γ (k_c / (2m))² ]
/// ```
///
/// where `L_c` is the weight of the edges inside community `c` (self-loops
/// once), `k_c` the summed degree of its members and `m` the total edge
/// weight. With `γ = 1` this equals `(1/2m) Σ_ij [A_ij - k_i k_j / 2m]` over
/// pairs in the same community.
pub fn modularity_with_resolution(
    graph: &WeightedGraph,
    partition: &[Vec<usize>],
    resolution: f64,
) -> Result<f64> {
    let membership = membership_of(graph.node_count(), partition)?;
    modularity_of_membership(graph, &membership, resolution)
}

/// Modularity of a per-node community assignment with labels in
/// `0..node_count`.
pub(crate) fn modularity_of_membership(
    graph: &WeightedGraph,
    membership: &[usize],
    resolution: f64,
) -> Result<f64> {
    if !resolution.is_finite() {
        return Err(LouvainError::InvalidParameter {
            name: "resolution",
            message: "must be finite",
        });
    }
    let m = graph.total_weight();
    if m == 0.0 {
        return Err(LouvainError::DegenerateGraph);
    }

    let n = graph.node_count();
    let mut l_c = vec![0.0; n];
    let mut k_c = vec![0.0; n];
    for node in graph.nodes() {
        k_c[membership[node]] += graph.degree(node);
    }
    for edge in graph.edges() {
        let comm = membership[edge.source];
        if comm == membership[edge.target] {
            l_c[comm] += edge.weight;
        }
    }

    let q = l_c
        .iter()
        .zip(&k_c)
        .map(|(&lc, &kc)| lc / m - resolution * (kc / (2.0 * m)).powi(2))
        .sum();
    Ok(q)
}

/// Validate `partition` and map every node to the index of its community.
pub(crate) fn membership_of(num_nodes: usize, partition: &[Vec<usize>]) -> Result<Vec<usize>> {
    let mut membership = vec![0; num_nodes];
    let mut seen = FixedBitSet::with_capacity(num_nodes);
    for (cid, comm) in partition.iter().filter(|comm| !comm.is_empty()).enumerate() {
        for &node in comm {
            if node >= num_nodes {
                return Err(LouvainError::InvalidPartition(format!(
                    "node {node} is out of bounds for a graph with {num_nodes} nodes"
                )));
            }
            if seen.put(node) {
                return Err(LouvainError::InvalidPartition(format!(
                    "node {node} belongs to more than one community"
                )));
            }
            membership[node] = cid;
        }
    }
    if seen.count_ones(..) != num_nodes {
        return Err(LouvainError::InvalidPartition(format!(
            "partition covers {} of {num_nodes} nodes",
            seen.count_ones(..)
        )));
    }
    Ok(membership)
}
