// Licensed under the Apache License, Version 2.0 (the "License"); you may
// not use this file except in compliance with the License. You may obtain
// a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied. See the
// License for the specific language governing permissions and limitations
// under the License.

//! Louvain community detection for weighted undirected graphs.
//!
//! ```
//! use louvain::{detect_communities, WeightedGraph};
//!
//! // Two triangles joined by a single edge.
//! let graph = WeightedGraph::with_node_count(
//!     6,
//!     vec![
//!         (0, 1, 1.0), (1, 2, 1.0), (0, 2, 1.0),
//!         (3, 4, 1.0), (4, 5, 1.0), (3, 5, 1.0),
//!         (2, 3, 1.0),
//!     ],
//! )?;
//! let result = detect_communities(&graph)?;
//! assert_eq!(result.partition, vec![vec![0, 1, 2], vec![3, 4, 5]]);
//! assert!(result.modularity > 0.35);
//! # Ok::<(), louvain::LouvainError>(())
//! ```

pub mod community;
pub mod error;

pub use community::{
    aggregate, detect_communities, detect_communities_with, modularity, modularity_gain,
    modularity_with_resolution, optimize_local_moves, AggregateStrength, Aggregation,
    Communities, CommunityState, Edge, LocalMoveStats, LouvainConfig, WeightedGraph,
    NO_COMMUNITY,
};
pub use error::{LouvainError, Result};
