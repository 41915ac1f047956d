//! Recursive topology verification over a routine tree.
//!
//! Each routine is checked on its own: its local graph goes through cycle
//! detection, then its ports go through the connectivity rules. Then its
//! children are visited in declaration order with the routine's name appended
//! to the ancestor path. Problems come out in pre-order.

use qref_core::{CoreError, ProgramLike, Routine};
use rayon::prelude::*;
use serde::Serialize;

use crate::connectivity::check_ports;
use crate::cycle::find_first_cycle;
use crate::diagnostics::TopologyProblem;
use crate::local_graph::{qualify, LocalGraph};

/// Knobs for a verification run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerifyOptions {
    /// Verify sibling subtrees on the rayon thread pool. The problem list is
    /// identical to a sequential run.
    pub parallel: bool,
}

/// Outcome of verifying a program.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerificationResult {
    pub problems: Vec<TopologyProblem>,
}

impl VerificationResult {
    /// `true` iff no problems were found.
    pub fn is_valid(&self) -> bool {
        self.problems.is_empty()
    }

    /// The problems as diagnostic lines.
    pub fn messages(&self) -> Vec<String> {
        self.problems.iter().map(ToString::to_string).collect()
    }
}

/// Verifies a program, a bare routine, or a raw document.
///
/// Only a raw document that fails to validate is an error; topology
/// problems are always returned as data.
pub fn verify_topology<'a>(
    input: impl Into<ProgramLike<'a>>,
) -> Result<VerificationResult, CoreError> {
    verify_topology_with(input, &VerifyOptions::default())
}

/// [`verify_topology`] with explicit options.
pub fn verify_topology_with<'a>(
    input: impl Into<ProgramLike<'a>>,
    options: &VerifyOptions,
) -> Result<VerificationResult, CoreError> {
    let root = input.into().into_routine()?;
    Ok(verify_routine(&root, options))
}

/// Verifies the tree rooted at `routine`.
#[tracing::instrument(skip_all, fields(root = %routine.name(), parallel = options.parallel))]
pub fn verify_routine(routine: &Routine, options: &VerifyOptions) -> VerificationResult {
    let problems = if options.parallel {
        verify_subtree_parallel(routine, &[])
    } else {
        verify_subtree(routine)
    };
    tracing::debug!(problems = problems.len(), "verification finished");
    VerificationResult { problems }
}

/// Problems of one routine, ignoring its descendants.
pub fn verify_level(routine: &Routine, ancestors: &[&str]) -> Vec<TopologyProblem> {
    let graph = LocalGraph::build(routine, ancestors);
    let mut problems = Vec::new();

    if let Some(path) = find_first_cycle(&graph) {
        tracing::debug!(cycle = ?path, "cycle detected");
        problems.push(TopologyProblem::Cycle { path });
    }
    problems.extend(check_ports(routine, ancestors));

    tracing::trace!(
        routine = %qualify(ancestors, routine.name()),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        problems = problems.len(),
        "verified level"
    );
    problems
}

/// Pre-order walk with an explicit stack, so deep trees cannot overflow.
fn verify_subtree(root: &Routine) -> Vec<TopologyProblem> {
    let mut problems = Vec::new();
    let mut stack: Vec<(&Routine, Vec<&str>)> = vec![(root, Vec::new())];

    while let Some((routine, ancestors)) = stack.pop() {
        problems.extend(verify_level(routine, &ancestors));

        let mut path = ancestors;
        path.push(routine.name().as_str());
        // Reversed, so the first child is popped first.
        for child in routine.children().rev() {
            stack.push((child, path.clone()));
        }
    }

    problems
}

fn verify_subtree_parallel(routine: &Routine, ancestors: &[&str]) -> Vec<TopologyProblem> {
    let mut problems = verify_level(routine, ancestors);

    let mut path = ancestors.to_vec();
    path.push(routine.name().as_str());
    let children: Vec<&Routine> = routine.children().collect();
    let nested: Vec<Vec<TopologyProblem>> = children
        .par_iter()
        .map(|child| verify_subtree_parallel(child, &path))
        .collect();

    problems.extend(nested.into_iter().flatten());
    problems
}
