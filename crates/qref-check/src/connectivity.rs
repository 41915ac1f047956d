//! Port connectivity rules for one nesting level.
//!
//! - A connection source may appear in at most one connection, and so may a
//!   connection target.
//! - When the routine has children, its own input ports must feed something
//!   and its own output ports must be fed.
//! - Every child port that is not an output must be fed, and every child port
//!   that is not an input must feed something. Child through ports therefore
//!   need both.
//! - The routine's own through ports must not appear in any connection.
//!
//! Problems come out grouped in the order above (fan-out, fan-in, missing
//! outgoing, missing incoming, through) and sorted by name within a group.

use std::collections::{BTreeMap, BTreeSet};

use qref_core::{Direction, Routine};

use crate::diagnostics::TopologyProblem;
use crate::local_graph::qualify;

/// Checks the ports of `routine` and its direct children against its
/// connections.
pub fn check_ports(routine: &Routine, ancestors: &[&str]) -> Vec<TopologyProblem> {
    let prefix = qualify(ancestors, routine.name());
    let fq = |local: &str| format!("{prefix}.{local}");

    let mut sources: BTreeMap<String, usize> = BTreeMap::new();
    let mut targets: BTreeMap<String, usize> = BTreeMap::new();
    for connection in routine.connections() {
        *sources.entry(connection.source.to_string()).or_default() += 1;
        *targets.entry(connection.target.to_string()).or_default() += 1;
    }

    let mut requiring_outgoing: BTreeSet<String> = BTreeSet::new();
    let mut requiring_incoming: BTreeSet<String> = BTreeSet::new();
    let mut unconnectable: BTreeSet<String> = BTreeSet::new();

    let has_children = !routine.is_leaf();
    for port in routine.ports() {
        match port.direction {
            Direction::Input if has_children => {
                requiring_outgoing.insert(port.name.to_string());
            }
            Direction::Output if has_children => {
                requiring_incoming.insert(port.name.to_string());
            }
            Direction::Through => {
                unconnectable.insert(port.name.to_string());
            }
            _ => {}
        }
    }

    for child in routine.children() {
        for port in child.ports() {
            let name = format!("{}.{}", child.name(), port.name);
            if port.direction != Direction::Output {
                requiring_incoming.insert(name.clone());
            }
            if port.direction != Direction::Input {
                requiring_outgoing.insert(name);
            }
        }
    }

    let mut problems = Vec::new();

    problems.extend(
        sources
            .iter()
            .filter(|&(_, &count)| count > 1)
            .map(|(name, _)| TopologyProblem::TooManyOutgoing { port: fq(name) }),
    );
    problems.extend(
        targets
            .iter()
            .filter(|&(_, &count)| count > 1)
            .map(|(name, _)| TopologyProblem::TooManyIncoming { port: fq(name) }),
    );
    problems.extend(
        requiring_outgoing
            .iter()
            .filter(|name| !sources.contains_key(*name))
            .map(|name| TopologyProblem::NoOutgoing { port: fq(name) }),
    );
    problems.extend(
        requiring_incoming
            .iter()
            .filter(|name| !targets.contains_key(*name))
            .map(|name| TopologyProblem::NoIncoming { port: fq(name) }),
    );
    problems.extend(
        unconnectable
            .iter()
            .filter(|name| sources.contains_key(*name) || targets.contains_key(*name))
            .map(|name| TopologyProblem::ThroughPortConnected { port: fq(name) }),
    );

    problems
}
