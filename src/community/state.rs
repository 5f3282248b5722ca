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

//! Community membership and per-community weight sums for one level.

use super::common::group_by_labels;
use super::graph::WeightedGraph;
use crate::error::{LouvainError, Result};

/// Marks a node that has been taken out of its community and not yet
/// re-inserted.
pub const NO_COMMUNITY: usize = usize::MAX;

/// Mutable community assignment of one aggregation level.
///
/// Community ids are in `0..node_count`; every node starts in the community
/// carrying its own id. For a community `c`:
/// * `s_in(c)` is the weight of edges with both endpoints in `c`, each edge
///   and each self-loop counted once.
/// * `s_tot(c)` is the summed strength of the members of `c`.
///
/// A node's strength is the `k_i` of the move gain. It is the weighted degree
/// unless the state was built with [`with_strength`](Self::with_strength).
#[derive(Clone, Debug)]
pub struct CommunityState {
    community: Vec<usize>,
    strength: Vec<f64>,
    s_in: Vec<f64>,
    s_tot: Vec<f64>,
    sizes: Vec<usize>,
    non_empty: usize,
}

impl CommunityState {
    /// One singleton community per node, weighted by degree.
    pub fn new(graph: &WeightedGraph) -> Self {
        Self::with_strength(graph, |node| graph.degree(node))
    }

    /// One singleton community per node, with `strength(node)` as the node's
    /// `k_i` in place of its degree.
    pub fn with_strength<F>(graph: &WeightedGraph, strength: F) -> Self
    where
        F: FnMut(usize) -> f64,
    {
        let n = graph.node_count();
        let strength: Vec<f64> = graph.nodes().map(strength).collect();
        CommunityState {
            community: (0..n).collect(),
            s_in: graph.nodes().map(|node| graph.self_loop_weight(node)).collect(),
            s_tot: strength.clone(),
            strength,
            sizes: vec![1; n],
            non_empty: n,
        }
    }

    /// Start from an arbitrary assignment; `labels[node]` is the community of
    /// `node` and must be below `node_count`.
    pub fn from_assignment(graph: &WeightedGraph, labels: &[usize]) -> Result<Self> {
        let n = graph.node_count();
        if labels.len() != n {
            return Err(LouvainError::InvalidPartition(format!(
                "assignment has {} labels for {n} nodes",
                labels.len()
            )));
        }
        if let Some(&label) = labels.iter().find(|&&label| label >= n) {
            return Err(LouvainError::InvalidPartition(format!(
                "community id {label} is not below the node count {n}"
            )));
        }

        let mut s_in = vec![0.0; n];
        let mut s_tot = vec![0.0; n];
        let mut sizes = vec![0; n];
        for (node, &comm) in labels.iter().enumerate() {
            s_tot[comm] += graph.degree(node);
            sizes[comm] += 1;
        }
        for edge in graph.edges() {
            let comm = labels[edge.source];
            if comm == labels[edge.target] {
                s_in[comm] += edge.weight;
            }
        }
        let non_empty = sizes.iter().filter(|&&size| size > 0).count();

        Ok(CommunityState {
            community: labels.to_vec(),
            strength: graph.nodes().map(|node| graph.degree(node)).collect(),
            s_in,
            s_tot,
            sizes,
            non_empty,
        })
    }

    /// Community of `node`, or `None` while it is removed.
    #[inline]
    pub fn community(&self, node: usize) -> Option<usize> {
        match self.community[node] {
            NO_COMMUNITY => None,
            c => Some(c),
        }
    }

    /// Raw assignment, [`NO_COMMUNITY`] for a removed node.
    pub fn assignments(&self) -> &[usize] {
        &self.community
    }

    #[inline]
    pub fn s_in(&self, community: usize) -> f64 {
        self.s_in[community]
    }

    #[inline]
    pub fn s_tot(&self, community: usize) -> f64 {
        self.s_tot[community]
    }

    /// The `k_i` of `node` in the move gain.
    #[inline]
    pub fn strength(&self, node: usize) -> f64 {
        self.strength[node]
    }

    /// Number of members of `community`.
    #[inline]
    pub fn size(&self, community: usize) -> usize {
        self.sizes[community]
    }

    /// Take `node` out of its community.
    ///
    /// `k_i_in` is the weight of the edges joining `node` to the other members
    /// of its community, self-loops excluded; the node's own self-loops are
    /// subtracted from `s_in` separately.
    pub fn remove_from_community(&mut self, graph: &WeightedGraph, node: usize, k_i_in: f64) {
        let community = self.community[node];
        debug_assert_ne!(community, NO_COMMUNITY, "node {node} is already removed");
        self.s_in[community] -= k_i_in + graph.self_loop_weight(node);
        self.s_tot[community] -= self.strength[node];
        self.sizes[community] -= 1;
        if self.sizes[community] == 0 {
            self.non_empty -= 1;
        }
        self.community[node] = NO_COMMUNITY;
    }

    /// Put a removed `node` into `community`; the exact inverse of
    /// [`remove_from_community`](Self::remove_from_community).
    pub fn add_to_community(
        &mut self,
        graph: &WeightedGraph,
        node: usize,
        community: usize,
        k_i_in: f64,
    ) {
        debug_assert_eq!(self.community[node], NO_COMMUNITY);
        self.s_in[community] += k_i_in + graph.self_loop_weight(node);
        self.s_tot[community] += self.strength[node];
        if self.sizes[community] == 0 {
            self.non_empty += 1;
        }
        self.sizes[community] += 1;
        self.community[node] = community;
    }

    /// Number of non-empty communities.
    #[inline]
    pub fn community_count(&self) -> usize {
        self.non_empty
    }

    /// True when every node is alone, i.e. the partition equals the initial one.
    #[inline]
    pub fn is_singleton(&self) -> bool {
        self.non_empty == self.community.len()
    }

    /// The non-empty communities, ordered by their smallest member.
    pub fn partition(&self) -> Vec<Vec<usize>> {
        group_by_labels(&self.community)
    }

    /// The quantity whose change is [`modularity_gain`](super::modularity_gain):
    /// `Σ_c s_in(c)/m2 - resolution * (s_tot(c)/m2)²`.
    pub fn objective(&self, m2: f64, resolution: f64) -> f64 {
        self.s_in
            .iter()
            .zip(&self.s_tot)
            .zip(&self.sizes)
            .filter(|(_, size)| **size > 0)
            .map(|((&s_in, &s_tot), _)| s_in / m2 - resolution * (s_tot / m2).powi(2))
            .sum()
    }
}
