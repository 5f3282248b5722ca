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
// https://arxiv.org/abs/0803.0476

use std::borrow::Cow;

use log::{debug, info, log_enabled, warn, Level};
use serde::{Deserialize, Serialize};

use super::aggregate::{aggregate, Aggregation};
use super::common::{build_rng, group_by_labels, sweep_order};
use super::graph::WeightedGraph;
use super::local_move::optimize_local_moves;
use super::modularity::{membership_of, modularity_of_membership};
use super::state::CommunityState;
use crate::error::{LouvainError, Result};

// ========================
// Configuration and Results
// ========================

/// The `k_i` a super-node carries into the move gain at levels above the
/// first. Level 0 always uses the weighted degree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateStrength {
    /// Degree minus the self-loop, so the weight a community collapsed into
    /// its self-loop counts once. Super-nodes look lighter and keep merging.
    #[default]
    SelfLoopsOnce,
    /// The weighted degree, self-loops counted twice, at every level.
    Degree,
}

impl AggregateStrength {
    /// Singleton state for `graph`, the aggregation level `level`.
    fn initial_state(self, graph: &WeightedGraph, level: usize) -> CommunityState {
        match self {
            AggregateStrength::SelfLoopsOnce if level > 0 => {
                CommunityState::with_strength(graph, |node| {
                    graph.degree(node) - graph.self_loop_weight(node)
                })
            }
            _ => CommunityState::new(graph),
        }
    }
}

/// Tuning knobs for [`detect_communities_with`].
///
/// Missing fields take their defaults when deserialized, so `{}` is a valid
/// configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LouvainConfig {
    /// Weight of the expected-edge terms in the move gain. `1.0` evaluates
    /// the gain exactly as documented on
    /// [`modularity_gain`](super::modularity_gain); `0.5` ranks moves like
    /// the classic Newman-Girvan ΔQ. Higher values yield smaller communities.
    pub resolution: f64,
    /// `None` sweeps nodes in ascending id order. `Some(seed)` shuffles the
    /// order once per level with a seeded RNG, which is just as reproducible.
    pub seed: Option<u64>,
    /// Maximum number of sweeps per level.
    pub max_passes: Option<usize>,
    /// Maximum number of aggregation levels.
    pub max_levels: Option<usize>,
    /// Node strength on aggregated levels.
    pub aggregate_strength: AggregateStrength,
}

impl Default for LouvainConfig {
    fn default() -> Self {
        LouvainConfig {
            resolution: 1.0,
            seed: None,
            max_passes: None,
            max_levels: None,
            aggregate_strength: AggregateStrength::default(),
        }
    }
}

impl LouvainConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.resolution.is_finite() || self.resolution <= 0.0 {
            return Err(LouvainError::InvalidParameter {
                name: "resolution",
                message: "must be finite and positive",
            });
        }
        if self.max_passes == Some(0) {
            return Err(LouvainError::InvalidParameter {
                name: "max_passes",
                message: "must be at least 1",
            });
        }
        if self.max_levels == Some(0) {
            return Err(LouvainError::InvalidParameter {
                name: "max_levels",
                message: "must be at least 1",
            });
        }
        Ok(())
    }
}

/// Final partition together with the per-level history that produced it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Communities {
    /// Communities over the original node ids. Members are ascending and
    /// communities are ordered by their smallest member.
    pub partition: Vec<Vec<usize>>,
    /// Modularity of `partition` on the input graph
    pub modularity: f64,
    /// `level_maps[l][node]` is the node of level `l + 1` that absorbed
    /// `node` of level `l`
    pub level_maps: Vec<Vec<usize>>,
}

impl Communities {
    /// Number of communities.
    pub fn len(&self) -> usize {
        self.partition.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partition.is_empty()
    }

    /// Number of aggregation levels performed.
    pub fn levels(&self) -> usize {
        self.level_maps.len()
    }

    /// Index into `partition` of the community of every original node.
    ///
    /// Fails with `InvalidPartition` when `partition` does not cover
    /// `0..N` exactly once, which only a hand-built or deserialized value can
    /// do.
    pub fn membership(&self) -> Result<Vec<usize>> {
        let num_nodes = match self.level_maps.first() {
            Some(level_map) => level_map.len(),
            None => self.partition.iter().map(Vec::len).sum(),
        };
        membership_of(num_nodes, &self.partition)
    }

    /// The partition of the original nodes after `level + 1` aggregations, or
    /// `None` past the last level. The last level is `partition` itself.
    pub fn partition_at_level(&self, level: usize) -> Option<Vec<Vec<usize>>> {
        let maps = self.level_maps.get(..=level)?;
        let num_nodes = maps.first()?.len();
        Some(group_by_labels(&compose_level_maps(num_nodes, maps)))
    }
}

// ========================
// Louvain Algorithm Implementation
// ========================

/// Translate level-0 nodes through every recorded level map, oldest first.
fn compose_level_maps(num_nodes: usize, level_maps: &[Vec<usize>]) -> Vec<usize> {
    let mut membership: Vec<usize> = (0..num_nodes).collect();
    for level_map in level_maps {
        for comm in membership.iter_mut() {
            *comm = level_map[*comm];
        }
    }
    membership
}

/// Find communities in a graph using the Louvain method with the default
/// [`LouvainConfig`].
pub fn detect_communities(graph: &WeightedGraph) -> Result<Communities> {
    detect_communities_with(graph, &LouvainConfig::default())
}

/// Find communities in a graph using the Louvain method.
///
/// This is an implementation of the Louvain Community Detection Algorithm,
/// as described in "Fast unfolding of communities in large networks" by
/// Blondel et al. Each level moves nodes greedily between neighboring
/// communities until no move helps, then collapses every community into a
/// single node of the next level. The method stops at the first level where
/// no node moves, and the partition reached so far is mapped back to the
/// original nodes.
///
/// `m2` stays the input's total weight at every level. With the default
/// [`AggregateStrength::SelfLoopsOnce`] a super-node enters the gain with its
/// internal weight counted once, which lets coarse levels keep merging.
/// Modularity of the recorded levels is therefore not monotone: a later level
/// can score below an earlier one, though never below the singleton
/// partition on the graphs exercised by the test suite.
///
/// # Arguments
/// * `graph` - The undirected weighted graph to analyze
/// * `config` - Resolution, sweep order and iteration caps
///
/// # Returns
/// * The partition of the original nodes and its modularity
/// * `InvalidParameter` for a rejected configuration
/// * `DegenerateGraph` if the graph has no edge weight
pub fn detect_communities_with(
    graph: &WeightedGraph,
    config: &LouvainConfig,
) -> Result<Communities> {
    config.validate()?;
    if graph.total_weight2() == 0.0 {
        return Err(LouvainError::DegenerateGraph);
    }

    let mut rng = build_rng(config.seed);
    let mut current: Cow<'_, WeightedGraph> = Cow::Borrowed(graph);
    let mut level_maps: Vec<Vec<usize>> = Vec::new();

    loop {
        let level = level_maps.len();
        if config.max_levels.is_some_and(|cap| level >= cap) {
            warn!("stopping after the maximum of {level} aggregation levels");
            break;
        }

        // Start with each node in its own community
        let mut state = config.aggregate_strength.initial_state(&current, level);
        let order = sweep_order(current.node_count(), rng.as_mut());
        let stats = optimize_local_moves(
            &current,
            &mut state,
            config.resolution,
            config.max_passes,
            &order,
        );

        // Nothing moved, so the partition equals the one this level started with
        if state.is_singleton() {
            debug!("level {level}: no improving move after {} passes", stats.passes);
            break;
        }

        let Aggregation {
            graph: next,
            level_map,
        } = aggregate(&current, &state)?;
        info!(
            "level {level}: {} nodes -> {} communities ({} passes, {} moves)",
            current.node_count(),
            next.node_count(),
            stats.passes,
            stats.moves
        );
        level_maps.push(level_map);

        if log_enabled!(Level::Debug) {
            let membership = compose_level_maps(graph.node_count(), &level_maps);
            let q = modularity_of_membership(graph, &membership, 1.0)?;
            debug!("level {level}: modularity {q:.6}");
        }

        current = Cow::Owned(next);
    }

    let membership = compose_level_maps(graph.node_count(), &level_maps);
    let modularity = modularity_of_membership(graph, &membership, 1.0)?;
    let partition = group_by_labels(&membership);
    info!(
        "louvain finished after {} levels: {} communities, modularity {modularity:.6}",
        level_maps.len(),
        partition.len()
    );

    Ok(Communities {
        partition,
        modularity,
        level_maps,
    })
}

#[cfg(test)]
mod tests {
    use super::{detect_communities, detect_communities_with, AggregateStrength, LouvainConfig};
    use crate::community::graph::WeightedGraph;
    use crate::error::LouvainError;

    fn two_triangles() -> WeightedGraph {
        WeightedGraph::with_node_count(
            6,
            vec![
                (0, 1, 1.0),
                (1, 2, 1.0),
                (0, 2, 1.0),
                (3, 4, 1.0),
                (4, 5, 1.0),
                (3, 5, 1.0),
                (2, 3, 1.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn two_triangles_split_at_the_bridge() {
        let result = detect_communities(&two_triangles()).unwrap();
        assert_eq!(result.partition, vec![vec![0, 1, 2], vec![3, 4, 5]]);
        assert_eq!(result.levels(), 1);
        assert_eq!(result.level_maps, vec![vec![0, 0, 0, 1, 1, 1]]);
        // 6/7 - 2 * (7/14)^2
        assert!((result.modularity - 0.35714285714285715).abs() < 1e-12);
        assert_eq!(result.membership(), Ok(vec![0, 0, 0, 1, 1, 1]));
        assert_eq!(result.partition_at_level(0), Some(result.partition.clone()));
        assert_eq!(result.partition_at_level(1), None);
    }

    #[test]
    fn no_improvement_returns_singletons() {
        // A lone edge: joining its endpoints does not pay off at resolution 1.
        let graph = WeightedGraph::with_node_count(2, vec![(0, 1, 1.0)]).unwrap();
        let result = detect_communities(&graph).unwrap();
        assert_eq!(result.partition, vec![vec![0], vec![1]]);
        assert_eq!(result.levels(), 0);
        assert!((result.modularity - (-0.5)).abs() < 1e-15);
        assert_eq!(result.partition_at_level(0), None);
    }

    #[test]
    fn zero_weight_graph_is_degenerate() {
        let graph = WeightedGraph::with_node_count(4, vec![(0, 1, 0.0)]).unwrap();
        assert_eq!(
            detect_communities(&graph),
            Err(LouvainError::DegenerateGraph)
        );
        let empty = WeightedGraph::with_node_count(0, Vec::new()).unwrap();
        assert_eq!(
            detect_communities(&empty),
            Err(LouvainError::DegenerateGraph)
        );
    }

    #[test]
    fn rejects_invalid_config() {
        let graph = two_triangles();
        for config in [
            LouvainConfig {
                resolution: 0.0,
                ..LouvainConfig::default()
            },
            LouvainConfig {
                resolution: f64::NAN,
                ..LouvainConfig::default()
            },
            LouvainConfig {
                max_passes: Some(0),
                ..LouvainConfig::default()
            },
            LouvainConfig {
                max_levels: Some(0),
                ..LouvainConfig::default()
            },
        ] {
            assert!(matches!(
                detect_communities_with(&graph, &config),
                Err(LouvainError::InvalidParameter { .. })
            ));
        }
    }

    #[test]
    fn level_cap_limits_aggregation() {
        // Four triangles in a ring: triangles first, then pairs of triangles.
        let mut edges = Vec::new();
        for t in 0..4 {
            let base = 3 * t;
            edges.extend([(base, base + 1, 1.0), (base + 1, base + 2, 1.0), (base, base + 2, 1.0)]);
            edges.push((base + 2, (base + 3) % 12, 1.0));
        }
        let graph = WeightedGraph::with_node_count(12, edges).unwrap();
        let config = LouvainConfig {
            resolution: 0.5,
            ..LouvainConfig::default()
        };
        let uncapped = detect_communities_with(&graph, &config).unwrap();
        assert_eq!(uncapped.levels(), 2);
        assert_eq!(uncapped.partition, vec![(0..6).collect::<Vec<_>>(), (6..12).collect()]);

        let capped = detect_communities_with(
            &graph,
            &LouvainConfig {
                max_levels: Some(1),
                ..config
            },
        )
        .unwrap();
        assert_eq!(capped.levels(), 1);
        assert_eq!(capped.partition.len(), 4);
        assert_eq!(Some(capped.partition), uncapped.partition_at_level(0));
    }

    #[test]
    fn super_nodes_count_their_self_loop_once_by_default() {
        // Two pairs of triangles. Each pair merges only when the collapsed
        // triangles count their internal weight once.
        let mut edges = Vec::new();
        for t in 0..4 {
            let base = 3 * t;
            edges.extend([(base, base + 1, 1.0), (base + 1, base + 2, 1.0), (base, base + 2, 1.0)]);
            edges.push((base + 2, (base + 3) % 12, 1.0));
        }
        let graph = WeightedGraph::with_node_count(12, edges).unwrap();

        let once = detect_communities_with(
            &graph,
            &LouvainConfig {
                resolution: 0.5,
                ..LouvainConfig::default()
            },
        )
        .unwrap();
        assert_eq!(once.levels(), 2);

        let degree = detect_communities_with(
            &graph,
            &LouvainConfig {
                resolution: 0.5,
                aggregate_strength: AggregateStrength::Degree,
                ..LouvainConfig::default()
            },
        )
        .unwrap();
        assert_eq!(degree.levels(), 1);
        assert_eq!(degree.partition, once.partition_at_level(0).unwrap());
    }

    #[test]
    fn membership_rejects_a_partition_with_gaps() {
        let mut result = detect_communities(&two_triangles()).unwrap();
        result.partition[1].retain(|&node| node != 4);
        assert!(matches!(
            result.membership(),
            Err(LouvainError::InvalidPartition(_))
        ));
    }
}
