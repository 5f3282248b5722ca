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

//! Error type shared by graph construction, optimization and evaluation.

use thiserror::Error;

/// Result alias for `louvain`.
pub type Result<T> = std::result::Result<T, LouvainError>;

/// Errors returned by the community detection routines.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LouvainError {
    /// Node ids are not a dense `0..N` range, an edge references an unknown
    /// node, or an edge weight is negative or not finite.
    #[error("invalid graph: {0}")]
    InvalidGraph(String),

    /// The total edge weight is zero, so modularity is undefined.
    #[error("degenerate graph: total edge weight is zero, modularity is undefined")]
    DegenerateGraph,

    /// A partition does not cover every node exactly once.
    #[error("invalid partition: {0}")]
    InvalidPartition(String),

    /// A configuration value is out of range.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Why the value was rejected.
        message: &'static str,
    },
}
