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

//! First phase of the Louvain method: greedy local moving.

use foldhash::{HashMap, HashMapExt};
use log::{debug, warn};

use super::graph::WeightedGraph;
use super::state::CommunityState;

/// Outcome of one local-moving phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LocalMoveStats {
    /// Number of full sweeps over the nodes
    pub passes: usize,
    /// Number of accepted moves across all sweeps
    pub moves: usize,
    /// False when `max_passes` stopped the phase before a quiet sweep
    pub converged: bool,
}

/// Modularity gain of inserting an isolated node into a community.
///
/// ```text
/// gain = [ (s_in + k_i_in)/m2 - γ((s_tot + k_i)/m2)² ]
///      - [ s_in/m2 - γ(s_tot/m2)² - γ(k_i/m2)² ]
///      = (k_i_in·m2 - 2γ·s_tot·k_i) / m2²
/// ```
///
/// The internal weight `s_in` cancels out. The reduced form keeps equal gains
/// bit-for-bit equal when weights are integral, so ties are decided by
/// community id rather than by rounding.
///
/// # Arguments
/// * `s_tot` - Summed degree of the community without the node
/// * `k_i` - Strength of the node, its degree unless the level says otherwise
/// * `k_i_in` - Weight of the edges joining the node to the community
/// * `m2` - Twice the total edge weight
/// * `resolution` - γ, weight of the expected-edge terms
#[inline]
pub fn modularity_gain(s_tot: f64, k_i: f64, k_i_in: f64, m2: f64, resolution: f64) -> f64 {
    (k_i_in * m2 - 2.0 * resolution * s_tot * k_i) / (m2 * m2)
}

/// Calculate the weight from `node` to each neighboring community.
///
/// Fills `weights` (cleared first) with one entry per distinct community
/// among the neighbors, self-loops excluded.
fn neighbor_community_weights(
    graph: &WeightedGraph,
    state: &CommunityState,
    node: usize,
    weights: &mut HashMap<usize, f64>,
) {
    weights.clear();
    for (neighbor, weight) in graph.neighbor_weights(node) {
        if let Some(comm) = state.community(neighbor) {
            *weights.entry(comm).or_insert(0.0) += weight;
        }
    }
}

/// Moves nodes between communities until a full sweep changes nothing.
///
/// Each node is taken out of its community, the gain of inserting it into
/// every neighboring community is evaluated, and it is put back into the
/// community with the largest strictly positive gain. Equal gains go to the
/// lowest community id. With no positive gain the node returns to where it
/// was.
///
/// # Arguments
/// * `graph` - The current level
/// * `state` - Community assignment of that level, modified in place
/// * `resolution` - Passed to [`modularity_gain`]
/// * `max_passes` - Optional cap on the number of sweeps
/// * `order` - Node visiting order, a permutation of the node ids
///
/// # Returns
/// * Sweep and move counts. A graph without edge weight is left untouched.
pub fn optimize_local_moves(
    graph: &WeightedGraph,
    state: &mut CommunityState,
    resolution: f64,
    max_passes: Option<usize>,
    order: &[usize],
) -> LocalMoveStats {
    let m2 = graph.total_weight2();
    let mut stats = LocalMoveStats {
        converged: true,
        ..LocalMoveStats::default()
    };
    if m2 == 0.0 {
        return stats;
    }

    let mut weights: HashMap<usize, f64> = HashMap::new();
    loop {
        if max_passes.is_some_and(|cap| stats.passes >= cap) {
            warn!(
                "local moving stopped after {} passes without converging",
                stats.passes
            );
            stats.converged = false;
            break;
        }
        stats.passes += 1;
        let mut nb_moves = 0;

        for &node in order {
            let Some(current_comm) = state.community(node) else {
                continue;
            };
            let k_i = state.strength(node);

            neighbor_community_weights(graph, state, node, &mut weights);
            let weight_to_current = weights.get(&current_comm).copied().unwrap_or(0.0);
            state.remove_from_community(graph, node, weight_to_current);

            // The node's own community is the baseline at zero gain.
            let mut best_comm = current_comm;
            let mut best_gain = 0.0;
            for (&candidate, &k_i_in) in &weights {
                let gain = modularity_gain(state.s_tot(candidate), k_i, k_i_in, m2, resolution);
                if gain > best_gain || (gain > 0.0 && gain == best_gain && candidate < best_comm) {
                    best_gain = gain;
                    best_comm = candidate;
                }
            }

            let weight_to_best = weights.get(&best_comm).copied().unwrap_or(0.0);
            state.add_to_community(graph, node, best_comm, weight_to_best);
            if best_comm != current_comm {
                nb_moves += 1;
            }
        }

        debug!("pass {}: {} nodes moved", stats.passes, nb_moves);
        stats.moves += nb_moves;
        if nb_moves == 0 {
            break;
        }
    }

    stats
}
