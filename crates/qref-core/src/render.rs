//! Graphviz DOT rendering of routine trees.
//!
//! Graphviz has no nested nodes, so the two kinds of routine are drawn
//! differently:
//!
//! - A leaf is one `Mrecord` node whose record fields are its ports. Edges
//!   address them as `"root.child":port`.
//! - A routine with children is a `cluster_` subgraph holding one circle node
//!   per port. Ports of one direction share a `rank=same` group, and edges
//!   address them as plain nodes, `"root.child.port"`.

use std::fmt::{self, Write};

use crate::connection::PortRef;
use crate::port::Port;
use crate::routine::Routine;
use crate::types::Direction;

const INDENT: &str = "    ";
const LEAF_ATTRS: &str = r##"shape=Mrecord, style=bold, color="#0288f5", fontsize=12"##;
const PORT_ATTRS: &str = r##"style=bold, color="#ffa44a", fontsize=10, shape=circle"##;

/// Renders `routine` and all of its descendants as a Graphviz `digraph`.
pub fn to_dot(routine: &Routine) -> String {
    Dot(routine).to_string()
}

/// `Display` adapter writing the DOT text of a routine tree.
pub struct Dot<'a>(pub &'a Routine);

impl fmt::Display for Dot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "digraph qref {{")?;
        writeln!(f, "{INDENT}rankdir=LR;")?;
        writeln!(f, "{INDENT}fontname=\"Helvetica\";")?;
        writeln!(f, "{INDENT}splines=false;")?;
        write_routine(f, self.0, self.0.name().as_str(), 1)?;
        writeln!(f, "}}")
    }
}

fn write_routine<W: Write>(
    out: &mut W,
    routine: &Routine,
    path: &str,
    depth: usize,
) -> fmt::Result {
    if routine.is_leaf() {
        write_leaf(out, routine, path, depth)
    } else {
        write_cluster(out, routine, path, depth)
    }
}

fn write_leaf<W: Write>(out: &mut W, routine: &Routine, path: &str, depth: usize) -> fmt::Result {
    let indent = INDENT.repeat(depth);
    let mut label = format!(
        "{{{}|{}|{}}}",
        ports_row(routine, Direction::Input),
        routine.name(),
        ports_row(routine, Direction::Output),
    );
    if ports_of(routine, Direction::Through).next().is_some() {
        label.push('|');
        label.push_str(&ports_row(routine, Direction::Through));
    }
    writeln!(out, "{indent}\"{path}\" [label=\"{label}\", {LEAF_ATTRS}];")
}

fn write_cluster<W: Write>(
    out: &mut W,
    routine: &Routine,
    path: &str,
    depth: usize,
) -> fmt::Result {
    let indent = INDENT.repeat(depth);
    let inner = INDENT.repeat(depth + 1);
    writeln!(out, "{indent}subgraph \"cluster_{path}\" {{")?;
    writeln!(out, "{inner}label=\"{}\";", routine.name())?;
    writeln!(out, "{inner}style=rounded;")?;

    for (direction, group) in [
        (Direction::Input, "inputs"),
        (Direction::Output, "outputs"),
        (Direction::Through, "through"),
    ] {
        write_port_group(out, routine, path, direction, group, depth + 1)?;
    }

    // Invisible anchors on both sides keep through ports in the middle column.
    for port in ports_of(routine, Direction::Through) {
        let name = &port.name;
        writeln!(out, "{inner}\"{path}.{name}_in\" [label=\"\", style=invis];")?;
        writeln!(out, "{inner}\"{path}.{name}_out\" [label=\"\", style=invis];")?;
        writeln!(out, "{inner}\"{path}.{name}_in\" -> \"{path}.{name}\" [style=invis];")?;
        writeln!(out, "{inner}\"{path}.{name}\" -> \"{path}.{name}_out\" [style=invis];")?;
    }

    for child in routine.children() {
        let child_path = format!("{path}.{}", child.name());
        write_routine(out, child, &child_path, depth + 1)?;
    }

    for connection in routine.connections() {
        let source = endpoint(routine, path, &connection.source);
        let target = endpoint(routine, path, &connection.target);
        writeln!(out, "{inner}{source} -> {target};")?;
    }
    writeln!(out, "{indent}}}")
}

fn write_port_group<W: Write>(
    out: &mut W,
    routine: &Routine,
    path: &str,
    direction: Direction,
    group: &str,
    depth: usize,
) -> fmt::Result {
    let mut ports = ports_of(routine, direction).peekable();
    if ports.peek().is_none() {
        return Ok(());
    }
    let indent = INDENT.repeat(depth);
    writeln!(out, "{indent}subgraph \"{path}: {group}\" {{")?;
    writeln!(out, "{indent}{INDENT}rank=same;")?;
    for port in ports {
        let name = &port.name;
        writeln!(out, "{indent}{INDENT}\"{path}.{name}\" [label=\"{name}\", {PORT_ATTRS}];")?;
    }
    writeln!(out, "{indent}}}")
}

/// The DOT reference of a connection endpoint inside the cluster at `path`.
fn endpoint(routine: &Routine, path: &str, endpoint: &PortRef) -> String {
    let port = &endpoint.port;
    match &endpoint.child {
        None => format!("\"{path}.{port}\""),
        Some(child) => match routine.child(child.as_str()) {
            Some(leaf) if leaf.is_leaf() => format!("\"{path}.{child}\":{port}"),
            _ => format!("\"{path}.{child}.{port}\""),
        },
    }
}

fn ports_of(routine: &Routine, direction: Direction) -> impl Iterator<Item = &Port> + '_ {
    routine.ports().filter(move |port| port.direction == direction)
}

/// A record row `{<p> p|<q> q}` of the ports with the given direction.
fn ports_row(routine: &Routine, direction: Direction) -> String {
    let cells: Vec<String> = ports_of(routine, direction)
        .map(|port| format!("<{0}> {0}", port.name))
        .collect();
    format!("{{{}}}", cells.join("|"))
}
