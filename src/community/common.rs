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

//! Common utilities shared by the local-moving phase, aggregation and the
//! driver.

use foldhash::{HashMap, HashMapExt};
use rand::prelude::*;
use rand_pcg::Pcg64;

use super::state::NO_COMMUNITY;

// ============================================================================
// Sweep Order
// ============================================================================

/// Type alias for the RNG used to shuffle the sweep order.
pub(crate) type CommunityRng = Pcg64;

/// Build an RNG only when a seed is given; without one the sweep order stays
/// ascending.
#[inline]
pub(crate) fn build_rng(seed: Option<u64>) -> Option<CommunityRng> {
    seed.map(Pcg64::seed_from_u64)
}

/// Node visiting order for one level: ascending ids, shuffled in place when an
/// RNG is supplied.
pub(crate) fn sweep_order(num_nodes: usize, rng: Option<&mut CommunityRng>) -> Vec<usize> {
    let mut nodes: Vec<usize> = (0..num_nodes).collect();
    if let Some(rng) = rng {
        nodes.shuffle(rng);
    }
    nodes
}

// ============================================================================
// Label/Community Grouping
// ============================================================================

/// Group nodes by their labels into communities.
///
/// Takes a vector of labels (where labels[i] is the community label for node i)
/// and returns a vector of communities (each community is a vector of node indices).
/// Nodes labelled [`NO_COMMUNITY`] are left out.
#[inline]
pub(crate) fn group_by_labels(labels: &[usize]) -> Vec<Vec<usize>> {
    let n = labels.len();
    let mut comms: HashMap<usize, Vec<usize>> = HashMap::with_capacity(n);
    for (node, &label) in labels.iter().enumerate() {
        if label != NO_COMMUNITY {
            comms.entry(label).or_default().push(node);
        }
    }
    // Members are pushed in ascending order, so the first one is the minimum.
    let mut result: Vec<Vec<usize>> = comms.into_values().collect();
    result.sort_unstable_by_key(|comm| comm[0]);
    result
}

/// Relabel communities densely as `0..C` in order of first appearance.
///
/// Every label must be below `labels.len()`. Returns the relabelled
/// assignment and `C`.
pub(crate) fn relabel_dense(labels: &[usize]) -> (Vec<usize>, usize) {
    let mut new_id = vec![NO_COMMUNITY; labels.len()];
    let mut next = 0;
    let relabelled = labels
        .iter()
        .map(|&label| {
            if new_id[label] == NO_COMMUNITY {
                new_id[label] = next;
                next += 1;
            }
            new_id[label]
        })
        .collect();
    (relabelled, next)
}
