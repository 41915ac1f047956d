//! End-to-end topology verification tests.
//!
//! Programs are either loaded from the YAML documents in `tests/data/` (so
//! they go through the same raw-document path as user input) or assembled
//! with the routine builder.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use proptest::prelude::*;
use qref_check::{verify_topology, verify_topology_with, TopologyProblem, VerifyOptions};
use qref_core::{CoreError, Format, Program, Routine};

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

fn fixture(name: &str) -> serde_json::Value {
    let path: PathBuf = [env!("CARGO_MANIFEST_DIR"), "tests", "data", name]
        .iter()
        .collect();
    Format::Yaml.load(&path).unwrap()
}

fn block(name: &str) -> Routine {
    Routine::builder(name)
        .input("i", None)
        .output("o", None)
        .build()
        .unwrap()
}

/// `n` children wired `c0 -> c1 -> ... -> c{n-1}`, optionally closed back
/// into `c0`.
fn ring(n: usize, closed: bool) -> Routine {
    let children = (0..n).map(|k| block(&format!("c{k}")));
    let mut builder = Routine::builder("root").children(children);
    for k in 1..n {
        builder = builder.connection(format!("c{}.o -> c{k}.i", k - 1));
    }
    if closed {
        builder = builder.connection(format!("c{}.o -> c0.i", n - 1));
    }
    builder.build().unwrap()
}

/// `n` children with a single through port each, chained between the
/// parent's input and output.
fn through_chain(n: usize) -> serde_json::Value {
    let children: Vec<serde_json::Value> = (0..n)
        .map(|i| {
            serde_json::json!({
                "name": format!("child_{i}"),
                "ports": [{"name": "thru_0", "direction": "through", "size": 1}]
            })
        })
        .collect();
    let mut connections = vec![
        "in_0 -> child_0.thru_0".to_string(),
        format!("child_{}.thru_0 -> out_0", n - 1),
    ];
    for i in 1..n {
        connections.push(format!("child_{}.thru_0 -> child_{i}.thru_0", i - 1));
    }
    serde_json::json!({
        "version": "v1",
        "program": {
            "name": "test",
            "ports": [
                {"name": "in_0", "direction": "input", "size": 1},
                {"name": "out_0", "direction": "output", "size": 1}
            ],
            "children": children,
            "connections": connections
        }
    })
}

fn cycle_count(problems: &[TopologyProblem]) -> usize {
    problems.iter().filter(|p| p.is_cycle()).count()
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn leaf_routine_with_unwired_ports_is_valid() {
    let root = Routine::builder("root")
        .input("in_0", None)
        .output("out_0", None)
        .build()
        .unwrap();
    let result = verify_topology(&root).unwrap();
    assert!(result.is_valid());
    assert!(result.problems.is_empty());
}

#[test]
fn nested_program_from_yaml_is_valid() {
    let raw = fixture("valid_nested.yaml");
    let result = verify_topology(raw.clone()).unwrap();
    assert!(result.is_valid(), "unexpected problems: {:?}", result.messages());

    let options = VerifyOptions { parallel: true };
    let parallel = verify_topology_with(raw, &options).unwrap();
    assert!(parallel.is_valid());
}

#[test]
fn dangling_endpoint_never_reaches_verification() {
    match verify_topology(fixture("dangling.yaml")) {
        Err(CoreError::DanglingConnection { path, endpoints }) => {
            assert_eq!(path, "program.connections");
            assert_eq!(endpoints, vec!["out_0".to_string()]);
        }
        other => panic!("expected DanglingConnection, got {other:?}"),
    }
}

#[test]
fn two_children_wired_in_a_loop() {
    let result = verify_topology(fixture("two_node_cycle.yaml")).unwrap();
    insta::assert_snapshot!(
        result.messages().join("\n"),
        @"Cycle detected: root.a.o -> root.b.i -> root.a.o"
    );
}

#[test]
fn cycle_through_both_children() {
    let root = Routine::builder("root")
        .child(block("a"))
        .child(block("b"))
        .connection("a.o -> b.i")
        .connection("b.o -> a.i")
        .build()
        .unwrap();
    let result = verify_topology(&root).unwrap();
    insta::assert_snapshot!(
        result.messages().join("\n"),
        @"Cycle detected: root.a.o -> root.b.i -> root.b -> root.b.o -> root.a.i -> root.a -> root.a.o"
    );
}

#[test]
fn cycle_inside_a_nested_routine_is_fully_qualified() {
    let inner = Routine::builder("inner")
        .input("i", None)
        .output("o", None)
        .child(block("x"))
        .child(block("y"))
        .connection("i -> x.i")
        .connection("x.o -> y.i")
        .connection("y.o -> x.i")
        .build()
        .unwrap();
    let root = Routine::builder("root")
        .input("in_0", None)
        .output("out_0", None)
        .child(inner)
        .connection("in_0 -> inner.i")
        .connection("inner.o -> out_0")
        .build()
        .unwrap();
    let result = verify_topology(&root).unwrap();
    insta::assert_snapshot!(result.messages().join("\n"), @r"
    Cycle detected: root.inner.x.i -> root.inner.x -> root.inner.x.o -> root.inner.y.i -> root.inner.y -> root.inner.y.o -> root.inner.x.i
    Too many incoming connections to root.inner.x.i.
    No incoming connection to root.inner.o.
    ");
}

#[test]
fn fan_out_and_fan_in_alongside_a_cycle() {
    let result = verify_topology(fixture("fan_out_cycle.yaml")).unwrap();
    assert!(result.problems[0].is_cycle());
    let rest: Vec<String> = result.problems[1..].iter().map(ToString::to_string).collect();
    insta::assert_snapshot!(rest.join("\n"), @r"
    Too many outgoing connections from root.a.o.
    Too many outgoing connections from root.b.o.
    Too many incoming connections to root.c.i.
    ");
}

#[test]
fn bare_routine_document_with_connected_through_port() {
    let result = verify_topology(fixture("through_connected.yaml")).unwrap();
    assert_eq!(
        result.problems,
        vec![TopologyProblem::ThroughPortConnected {
            port: "root.t".into()
        }]
    );
}

#[test]
fn program_wrapper_and_root_routine_agree() {
    let program = Program::from_value(fixture("fan_out_cycle.yaml")).unwrap();
    assert_eq!(
        verify_topology(&program).unwrap(),
        verify_topology(&program.program).unwrap()
    );
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn shared_target_is_reported_exactly_once() {
    let root = Routine::builder("root")
        .child(block("a"))
        .child(block("b"))
        .child(block("c"))
        .connection("a.o -> c.i")
        .connection("b.o -> c.i")
        .build()
        .unwrap();
    let problems = verify_topology(&root).unwrap().problems;
    let incoming: Vec<&TopologyProblem> = problems
        .iter()
        .filter(|p| matches!(p, TopologyProblem::TooManyIncoming { .. }))
        .collect();
    assert_eq!(
        incoming,
        vec![&TopologyProblem::TooManyIncoming {
            port: "root.c.i".into()
        }]
    );
}

#[test]
fn through_port_problem_iff_referenced() {
    let unreferenced = Routine::builder("root")
        .through("t", None)
        .build()
        .unwrap();
    assert!(verify_topology(&unreferenced).unwrap().is_valid());

    let as_target = Routine::builder("root")
        .input("in_0", None)
        .through("t", None)
        .connection("in_0 -> t")
        .build()
        .unwrap();
    let problems = verify_topology(&as_target).unwrap().problems;
    assert!(problems.contains(&TopologyProblem::ThroughPortConnected {
        port: "root.t".into()
    }));
}

#[test]
fn one_problem_per_missing_connection() {
    let root = Routine::builder("root")
        .input("in_0", None)
        .output("out_0", None)
        .child(block("a"))
        .connection("in_0 -> a.i")
        .build()
        .unwrap();
    let result = verify_topology(&root).unwrap();
    assert_eq!(
        result.messages(),
        vec![
            "No outgoing connection from root.a.o.",
            "No incoming connection to root.out_0.",
        ]
    );
}

proptest! {
    #[test]
    fn ring_has_a_cycle_iff_closed(n in 1usize..24, closed in any::<bool>()) {
        let result = verify_topology(&ring(n, closed)).unwrap();
        prop_assert_eq!(cycle_count(&result.problems), usize::from(closed));
    }

    #[test]
    fn verification_is_repeatable(n in 1usize..24, closed in any::<bool>()) {
        let root = ring(n, closed);
        let first = verify_topology(&root).unwrap();
        let second = verify_topology(&root).unwrap();
        let options = VerifyOptions { parallel: true };
        let parallel = verify_topology_with(&root, &options).unwrap();
        prop_assert_eq!(first.is_valid(), second.is_valid());
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(&first, &parallel);
    }
}

// ---------------------------------------------------------------------------
// Scale
// ---------------------------------------------------------------------------

#[test]
fn ten_thousand_through_connected_children_verify_quickly() {
    let raw = through_chain(10_000);
    let start = Instant::now();
    let result = verify_topology(raw).unwrap();
    assert!(result.is_valid(), "unexpected problems: {:?}", &result.messages()[..1]);
    assert!(start.elapsed() < Duration::from_secs(10));
}

#[test]
fn ten_thousand_children_in_parallel_mode() {
    let raw = through_chain(10_000);
    let options = VerifyOptions { parallel: true };
    let result = verify_topology_with(raw, &options).unwrap();
    assert!(result.is_valid());
}
