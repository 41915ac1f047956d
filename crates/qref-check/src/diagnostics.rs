//! Topology problems reported by verification.
//!
//! [`TopologyProblem`] is data, not an error path: verification always runs
//! to completion and returns every problem it finds. Each variant names the
//! fully-qualified port (or cycle path) it concerns, and its `Display` output
//! is the human-readable diagnostic line.

use serde::{Deserialize, Serialize};

/// A non-fatal structural defect found in one nesting level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TopologyProblem {
    /// The level's local graph contains a cycle. `path` starts and ends on
    /// the same node.
    #[error("Cycle detected: {}", path.join(" -> "))]
    Cycle {
        /// Fully-qualified node names along the cycle.
        path: Vec<String>,
    },

    /// A port is the source of more than one connection.
    #[error("Too many outgoing connections from {port}.")]
    TooManyOutgoing { port: String },

    /// A port is the target of more than one connection.
    #[error("Too many incoming connections to {port}.")]
    TooManyIncoming { port: String },

    /// A port that must feed something is never a connection source.
    #[error("No outgoing connection from {port}.")]
    NoOutgoing { port: String },

    /// A port that must be fed is never a connection target.
    #[error("No incoming connection to {port}.")]
    NoIncoming { port: String },

    /// A routine's own through port appears in one of its connections.
    #[error("A through port {port} is connected via an internal connection.")]
    ThroughPortConnected { port: String },
}

impl TopologyProblem {
    /// `true` for [`TopologyProblem::Cycle`].
    pub fn is_cycle(&self) -> bool {
        matches!(self, TopologyProblem::Cycle { .. })
    }

    /// The fully-qualified port this problem names, if it names one.
    pub fn port(&self) -> Option<&str> {
        match self {
            TopologyProblem::Cycle { .. } => None,
            TopologyProblem::TooManyOutgoing { port }
            | TopologyProblem::TooManyIncoming { port }
            | TopologyProblem::NoOutgoing { port }
            | TopologyProblem::NoIncoming { port }
            | TopologyProblem::ThroughPortConnected { port } => Some(port),
        }
    }
}
