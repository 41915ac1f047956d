//! Topology verification for qref routine trees.
//!
//! Every nesting level is checked independently: a [`LocalGraph`] of the
//! level is searched for a cycle, and the level's ports are checked for
//! missing, duplicated or illegal connections. See [`verify_topology`].

pub mod connectivity;
pub mod cycle;
pub mod diagnostics;
pub mod local_graph;
pub mod verify;

pub use connectivity::check_ports;
pub use cycle::find_first_cycle;
pub use diagnostics::TopologyProblem;
pub use local_graph::LocalGraph;
pub use verify::{
    verify_level, verify_routine, verify_topology, verify_topology_with, VerificationResult,
    VerifyOptions,
};
