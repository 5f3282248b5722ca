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

pub mod aggregate;
mod common;
pub mod graph;
pub mod local_move;
pub mod louvain;
pub mod modularity;
pub mod state;

pub use aggregate::{aggregate, Aggregation};
pub use graph::{Edge, WeightedGraph};
pub use local_move::{modularity_gain, optimize_local_moves, LocalMoveStats};
pub use louvain::{
    detect_communities, detect_communities_with, AggregateStrength, Communities, LouvainConfig,
};
pub use modularity::{modularity, modularity_with_resolution};
pub use state::{CommunityState, NO_COMMUNITY};
