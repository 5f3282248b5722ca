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

//! Second phase of the Louvain method: collapsing communities into nodes.

use foldhash::fast::RandomState;
use indexmap::IndexMap;

use super::common::relabel_dense;
use super::graph::{Edge, WeightedGraph};
use super::state::{CommunityState, NO_COMMUNITY};
use crate::error::{LouvainError, Result};

/// The next level produced by [`aggregate`].
#[derive(Clone, Debug)]
pub struct Aggregation {
    /// One node per non-empty community of the previous level
    pub graph: WeightedGraph,
    /// `level_map[old_node]` is the node of `graph` that absorbed it
    pub level_map: Vec<usize>,
}

/// Generate a new aggregated graph based on the partition in `state`.
///
/// Communities are renumbered densely in the order their first member
/// appears. Every old edge adds its weight to the edge between the
/// communities of its endpoints; edges inside a community, old self-loops
/// included, become a single self-loop on the new node. Degrees and the
/// total weight carry over unchanged.
///
/// A community without internal weight gets no self-loop entry at all. Its
/// node then reports a self-loop weight of `0.0`, which is what a zero-weight
/// entry would contribute to degrees and gains.
///
/// # Arguments
/// * `graph` - The current level
/// * `state` - A complete assignment of that level
///
/// # Returns
/// * `InvalidPartition` if a node is still removed from its community
pub fn aggregate(graph: &WeightedGraph, state: &CommunityState) -> Result<Aggregation> {
    if let Some(node) = state
        .assignments()
        .iter()
        .position(|&comm| comm == NO_COMMUNITY)
    {
        return Err(LouvainError::InvalidPartition(format!(
            "node {node} is not in any community"
        )));
    }
    let (level_map, num_communities) = relabel_dense(state.assignments());

    // Unordered community pairs in first-encountered order
    let mut combined: IndexMap<(usize, usize), f64, RandomState> =
        IndexMap::with_capacity_and_hasher(graph.edge_count(), RandomState::default());
    for edge in graph.edges() {
        let a = level_map[edge.source];
        let b = level_map[edge.target];
        let key = if a <= b { (a, b) } else { (b, a) };
        *combined.entry(key).or_insert(0.0) += edge.weight;
    }

    let edges = combined
        .into_iter()
        .map(|((a, b), weight)| Edge::new(a, b, weight))
        .collect();

    Ok(Aggregation {
        graph: WeightedGraph::from_validated(num_communities, edges),
        level_map,
    })
}
