//! Flat directed graph of one nesting level.
//!
//! Nodes are fully-qualified names. Edges are the routine's declared
//! connections plus, for every child `C`, an edge `C.p -> C` from each input
//! port and `C -> C.q` to each output port. The child node therefore stands
//! for "consumes all inputs, then produces all outputs", which is enough for
//! cycle detection. Through ports of children get no implicit edges.
//!
//! Only one level is ever materialized, so memory stays proportional to the
//! routine's own ports, children and connections.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use qref_core::{Direction, Routine};

/// The local graph of a single routine.
#[derive(Debug, Clone, Default)]
pub struct LocalGraph {
    graph: DiGraph<String, ()>,
    index: HashMap<String, NodeIndex>,
}

impl LocalGraph {
    /// Builds the local graph of `routine`, whose ancestors (from the program
    /// root, excluding the routine itself) are `ancestors`.
    ///
    /// Node insertion order is deterministic: connection endpoints in
    /// connection order, then children in declaration order.
    pub fn build(routine: &Routine, ancestors: &[&str]) -> Self {
        let prefix = qualify(ancestors, routine.name());
        let mut local = LocalGraph::default();

        for connection in routine.connections() {
            let source = format!("{prefix}.{}", connection.source);
            let target = format!("{prefix}.{}", connection.target);
            local.add_edge(source, target);
        }

        for child in routine.children() {
            let child_node = format!("{prefix}.{}", child.name());
            local.node(&child_node);
            for port in child.ports() {
                let port_node = format!("{child_node}.{}", port.name);
                match port.direction {
                    Direction::Input => local.add_edge(port_node, child_node.clone()),
                    Direction::Output => local.add_edge(child_node.clone(), port_node),
                    Direction::Through => {}
                }
            }
        }

        local
    }

    fn node(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(name.to_string());
        self.index.insert(name.to_string(), idx);
        idx
    }

    fn add_edge(&mut self, source: String, target: String) {
        let a = self.node(&source);
        let b = self.node(&target);
        self.graph.add_edge(a, b, ());
    }

    /// The underlying petgraph graph; node weights are fully-qualified names.
    pub fn graph(&self) -> &DiGraph<String, ()> {
        &self.graph
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains_node(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn contains_edge(&self, source: &str, target: &str) -> bool {
        match (self.index.get(source), self.index.get(target)) {
            (Some(&a), Some(&b)) => self.graph.contains_edge(a, b),
            _ => false,
        }
    }

    /// Successors of `name`, sorted.
    pub fn successors(&self, name: &str) -> Vec<&str> {
        let Some(&idx) = self.index.get(name) else {
            return Vec::new();
        };
        let mut out: Vec<&str> = self
            .graph
            .neighbors(idx)
            .map(|n| self.graph[n].as_str())
            .collect();
        out.sort_unstable();
        out
    }
}

/// Joins `ancestors` and `name` with `.`.
pub(crate) fn qualify(ancestors: &[&str], name: &str) -> String {
    let mut out = String::new();
    for ancestor in ancestors {
        out.push_str(ancestor);
        out.push('.');
    }
    out.push_str(name);
    out
}
