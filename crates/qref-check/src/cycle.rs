//! Cycle detection over a local graph.
//!
//! Iterative three-color depth-first search. Start nodes are taken in node
//! index order and successors in petgraph's adjacency order, so the reported
//! cycle is the same on every run. The search keeps the current DFS path, so
//! the first back edge `u -> v` yields the cycle directly as the path suffix
//! starting at `v`, closed with `v` again. Runs in O(V + E) and never
//! recurses, so long chains cannot exhaust the stack.

use petgraph::graph::{Neighbors, NodeIndex};

use crate::local_graph::LocalGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Not yet visited.
    White,
    /// On the current DFS path.
    Gray,
    /// Fully explored.
    Black,
}

/// Returns the first cycle of `local`, as fully-qualified names
/// `[n0, n1, ..., n0]`, or `None` if the graph is acyclic.
pub fn find_first_cycle(local: &LocalGraph) -> Option<Vec<String>> {
    let graph = local.graph();
    let mut color = vec![Color::White; graph.node_count()];
    // Position of each gray node in `path`.
    let mut depth = vec![0usize; graph.node_count()];

    for start in graph.node_indices() {
        if color[start.index()] != Color::White {
            continue;
        }

        let mut path: Vec<NodeIndex> = vec![start];
        let mut stack: Vec<(NodeIndex, Neighbors<'_, ()>)> = vec![(start, graph.neighbors(start))];
        color[start.index()] = Color::Gray;

        while let Some((node, successors)) = stack.last_mut() {
            let node = *node;
            let next = successors.next();
            match next {
                Some(next) => match color[next.index()] {
                    Color::White => {
                        color[next.index()] = Color::Gray;
                        depth[next.index()] = path.len();
                        path.push(next);
                        stack.push((next, graph.neighbors(next)));
                    }
                    Color::Gray => {
                        let mut cycle: Vec<String> = path[depth[next.index()]..]
                            .iter()
                            .map(|&n| graph[n].clone())
                            .collect();
                        cycle.push(graph[next].clone());
                        return Some(cycle);
                    }
                    Color::Black => {}
                },
                None => {
                    color[node.index()] = Color::Black;
                    path.pop();
                    stack.pop();
                }
            }
        }
    }

    None
}
