//! Routine: the recursive block of a program tree.
//!
//! A [`Routine`] exclusively owns its children, so the object graph is always
//! a tree. Cycles can only appear logically, through named connections, which
//! is what topology verification looks for.
//!
//! # Invariants
//!
//! Checked on every construction path and on every replacement:
//! - port names are unique within a routine, child names among siblings,
//!   resource names within a routine;
//! - every connection endpoint is either one of the routine's own ports or
//!   `child.port` for a declared child and one of its ports.
//!
//! A routine is never mutated in place. The `with_*`, `replace_*` and
//! `remove_*` methods consume it and hand back a re-validated value.
//!
//! Ports and resources are kept sorted by name and connections by source, so
//! serialization is canonical. Children keep their declaration order.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::connection::{Connection, PortRef};
use crate::error::CoreError;
use crate::name::{Name, Namespacing, QualifiedName};
use crate::port::Port;
use crate::resource::{ParamLink, Resource};
use crate::spec::{ConnectionSpec, ParamLinkSpec, PortSpec, ResourceSpec, RoutineSpec};
use crate::types::{Direction, ResourceType, Value};

/// A hierarchical block with typed ports, children, connections and
/// resources.
#[derive(Debug, Clone)]
pub struct Routine {
    name: Name,
    kind: Option<String>,
    children: IndexMap<Name, Routine>,
    ports: IndexMap<Name, Port>,
    resources: IndexMap<Name, Resource>,
    connections: Vec<Connection>,
    input_params: Vec<QualifiedName>,
    local_variables: BTreeMap<String, String>,
    linked_params: Vec<ParamLink>,
    meta: serde_json::Map<String, serde_json::Value>,
}

impl Routine {
    /// Starts building a routine named `name`.
    pub fn builder(name: impl Into<String>) -> RoutineBuilder {
        RoutineBuilder {
            spec: RoutineSpec::named(name),
            children: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Read-only accessors
    // -----------------------------------------------------------------------

    pub fn name(&self) -> &Name {
        &self.name
    }

    /// The free-form `type` tag of the routine.
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    /// Children in declaration order.
    pub fn children(&self) -> impl DoubleEndedIterator<Item = &Routine> + ExactSizeIterator + '_ {
        self.children.values()
    }

    pub fn child(&self, name: &str) -> Option<&Routine> {
        self.children.get(name)
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// `true` if the routine has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Ports sorted by name.
    pub fn ports(&self) -> impl DoubleEndedIterator<Item = &Port> + ExactSizeIterator + '_ {
        self.ports.values()
    }

    pub fn port(&self, name: &str) -> Option<&Port> {
        self.ports.get(name)
    }

    /// Resources sorted by name.
    pub fn resources(
        &self,
    ) -> impl DoubleEndedIterator<Item = &Resource> + ExactSizeIterator + '_ {
        self.resources.values()
    }

    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.resources.get(name)
    }

    /// Connections sorted by source.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn input_params(&self) -> &[QualifiedName] {
        &self.input_params
    }

    pub fn local_variables(&self) -> &BTreeMap<String, String> {
        &self.local_variables
    }

    pub fn linked_params(&self) -> &[ParamLink] {
        &self.linked_params
    }

    pub fn meta(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.meta
    }

    /// Resolves a connection endpoint to the port it names, if any.
    pub fn resolve(&self, endpoint: &PortRef) -> Option<&Port> {
        match &endpoint.child {
            None => self.ports.get(endpoint.port.as_str()),
            Some(child) => self
                .children
                .get(child.as_str())
                .and_then(|c| c.ports.get(endpoint.port.as_str())),
        }
    }

    // -----------------------------------------------------------------------
    // Whole-field replacement
    // -----------------------------------------------------------------------

    /// Replaces all children.
    pub fn with_children(mut self, children: Vec<Routine>) -> Result<Self, CoreError> {
        let path = self.name.to_string();
        self.children = index_children(children, &path)?;
        self.check_connections(&path)?;
        Ok(self)
    }

    /// Replaces all ports.
    pub fn with_ports(mut self, ports: Vec<Port>) -> Result<Self, CoreError> {
        let path = self.name.to_string();
        self.ports = index_ports(ports, &path)?;
        self.check_connections(&path)?;
        Ok(self)
    }

    /// Replaces all connections.
    pub fn with_connections(mut self, connections: Vec<Connection>) -> Result<Self, CoreError> {
        let path = self.name.to_string();
        self.connections = sort_connections(connections);
        self.check_connections(&path)?;
        Ok(self)
    }

    /// Replaces all resources.
    pub fn with_resources(mut self, resources: Vec<Resource>) -> Result<Self, CoreError> {
        let path = self.name.to_string();
        self.resources = index_resources(resources, &path)?;
        Ok(self)
    }

    // -----------------------------------------------------------------------
    // By-name replacement and removal
    // -----------------------------------------------------------------------

    /// Replaces the child called `name` with `child`, keeping its position.
    pub fn replace_child(mut self, name: &str, child: Routine) -> Result<Self, CoreError> {
        let index = self
            .children
            .get_index_of(name)
            .ok_or_else(|| not_found("child", name))?;
        let mut children: Vec<Routine> = std::mem::take(&mut self.children).into_values().collect();
        children[index] = child;
        self.with_children(children)
    }

    /// Removes the child called `name`.
    pub fn remove_child(mut self, name: &str) -> Result<Self, CoreError> {
        self.children
            .shift_remove(name)
            .ok_or_else(|| not_found("child", name))?;
        let path = self.name.to_string();
        self.check_connections(&path)?;
        Ok(self)
    }

    /// Replaces the port called `name` with `port`.
    pub fn replace_port(mut self, name: &str, port: Port) -> Result<Self, CoreError> {
        if !self.ports.contains_key(name) {
            return Err(not_found("port", name));
        }
        let ports = std::mem::take(&mut self.ports)
            .into_iter()
            .map(|(key, existing)| {
                if key.as_str() == name {
                    port.clone()
                } else {
                    existing
                }
            })
            .collect();
        self.with_ports(ports)
    }

    /// Removes the port called `name`.
    pub fn remove_port(mut self, name: &str) -> Result<Self, CoreError> {
        self.ports
            .shift_remove(name)
            .ok_or_else(|| not_found("port", name))?;
        let path = self.name.to_string();
        self.check_connections(&path)?;
        Ok(self)
    }

    /// Replaces the resource called `name` with `resource`.
    pub fn replace_resource(mut self, name: &str, resource: Resource) -> Result<Self, CoreError> {
        if !self.resources.contains_key(name) {
            return Err(not_found("resource", name));
        }
        let resources = std::mem::take(&mut self.resources)
            .into_iter()
            .map(|(key, existing)| {
                if key.as_str() == name {
                    resource.clone()
                } else {
                    existing
                }
            })
            .collect();
        self.with_resources(resources)
    }

    /// Removes the resource called `name`.
    pub fn remove_resource(mut self, name: &str) -> Result<Self, CoreError> {
        self.resources
            .shift_remove(name)
            .ok_or_else(|| not_found("resource", name))?;
        Ok(self)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    /// Checks that every connection endpoint resolves to a known port.
    fn check_connections(&self, path: &str) -> Result<(), CoreError> {
        let mut missing: Vec<String> = Vec::new();
        for connection in &self.connections {
            for endpoint in [&connection.source, &connection.target] {
                if self.resolve(endpoint).is_none() {
                    let endpoint = endpoint.to_string();
                    if !missing.contains(&endpoint) {
                        missing.push(endpoint);
                    }
                }
            }
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(CoreError::DanglingConnection {
                path: format!("{path}.connections"),
                endpoints: missing,
            })
        }
    }

    /// Builds a routine from its own (childless) spec plus already-validated
    /// children.
    fn assemble(spec: RoutineSpec, children: Vec<Routine>, path: &str) -> Result<Self, CoreError> {
        let name = Name::parse_at(spec.name, &format!("{path}.name"))?;

        let ports = spec
            .ports
            .into_iter()
            .enumerate()
            .map(|(i, p)| port_from_spec(p, &format!("{path}.ports[{i}]")))
            .collect::<Result<Vec<_>, _>>()?;

        let resources = spec
            .resources
            .into_iter()
            .enumerate()
            .map(|(i, r)| resource_from_spec(r, &format!("{path}.resources[{i}]")))
            .collect::<Result<Vec<_>, _>>()?;

        let connections = spec
            .connections
            .into_iter()
            .enumerate()
            .map(|(i, c)| connection_from_spec(c, &format!("{path}.connections[{i}]")))
            .collect::<Result<Vec<_>, _>>()?;

        let input_params = spec
            .input_params
            .iter()
            .enumerate()
            .map(|(i, p)| {
                QualifiedName::parse_at(
                    p,
                    Namespacing::OptionalMulti,
                    &format!("{path}.input_params[{i}]"),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut linked_params = spec
            .linked_params
            .iter()
            .enumerate()
            .map(|(i, l)| {
                ParamLink::parse_at(
                    &l.source,
                    l.targets.iter().map(String::as_str),
                    &format!("{path}.linked_params[{i}]"),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        linked_params.sort_by_cached_key(|l| l.source.to_string());

        let routine = Routine {
            name,
            kind: spec.kind,
            children: index_children(children, path)?,
            ports: index_ports(ports, path)?,
            resources: index_resources(resources, path)?,
            connections: sort_connections(connections),
            input_params,
            local_variables: spec.local_variables,
            linked_params,
            meta: spec.meta,
        };
        routine.check_connections(path)?;
        Ok(routine)
    }

    /// Converts a full spec tree, reporting errors relative to `path`.
    pub(crate) fn from_spec_at(mut spec: RoutineSpec, path: &str) -> Result<Self, CoreError> {
        let children = std::mem::take(&mut spec.children)
            .into_iter()
            .enumerate()
            .map(|(i, c)| Routine::from_spec_at(c, &format!("{path}.children[{i}]")))
            .collect::<Result<Vec<_>, _>>()?;
        Routine::assemble(spec, children, path)
    }
}

impl PartialEq for Routine {
    fn eq(&self, other: &Self) -> bool {
        // Children are compared in order; ports and resources are sorted.
        self.name == other.name
            && self.kind == other.kind
            && self.children.len() == other.children.len()
            && self.children.values().eq(other.children.values())
            && self.ports.values().eq(other.ports.values())
            && self.resources.values().eq(other.resources.values())
            && self.connections == other.connections
            && self.input_params == other.input_params
            && self.local_variables == other.local_variables
            && self.linked_params == other.linked_params
            && self.meta == other.meta
    }
}

fn not_found(kind: &'static str, name: &str) -> CoreError {
    CoreError::NotFound {
        kind,
        name: name.to_string(),
    }
}

fn index_children(
    children: Vec<Routine>,
    path: &str,
) -> Result<IndexMap<Name, Routine>, CoreError> {
    let mut index = IndexMap::with_capacity(children.len());
    for (i, child) in children.into_iter().enumerate() {
        if index.contains_key(child.name.as_str()) {
            return Err(CoreError::DuplicateName {
                path: format!("{path}.children[{i}]"),
                kind: "child",
                name: child.name.to_string(),
            });
        }
        index.insert(child.name.clone(), child);
    }
    Ok(index)
}

fn index_ports(ports: Vec<Port>, path: &str) -> Result<IndexMap<Name, Port>, CoreError> {
    let mut index = IndexMap::with_capacity(ports.len());
    for (i, port) in ports.into_iter().enumerate() {
        if index.contains_key(port.name.as_str()) {
            return Err(CoreError::DuplicateName {
                path: format!("{path}.ports[{i}]"),
                kind: "port",
                name: port.name.to_string(),
            });
        }
        index.insert(port.name.clone(), port);
    }
    index.sort_keys();
    Ok(index)
}

fn index_resources(
    resources: Vec<Resource>,
    path: &str,
) -> Result<IndexMap<Name, Resource>, CoreError> {
    let mut index = IndexMap::with_capacity(resources.len());
    for (i, resource) in resources.into_iter().enumerate() {
        if index.contains_key(resource.name.as_str()) {
            return Err(CoreError::DuplicateName {
                path: format!("{path}.resources[{i}]"),
                kind: "resource",
                name: resource.name.to_string(),
            });
        }
        index.insert(resource.name.clone(), resource);
    }
    index.sort_keys();
    Ok(index)
}

fn sort_connections(mut connections: Vec<Connection>) -> Vec<Connection> {
    connections.sort_by_cached_key(|c| c.source.to_string());
    connections
}

fn port_from_spec(spec: PortSpec, path: &str) -> Result<Port, CoreError> {
    Ok(Port {
        name: Name::parse_at(spec.name, &format!("{path}.name"))?,
        direction: spec.direction,
        size: spec.size,
    })
}

fn resource_from_spec(spec: ResourceSpec, path: &str) -> Result<Resource, CoreError> {
    Ok(Resource {
        name: Name::parse_at(spec.name, &format!("{path}.name"))?,
        kind: spec.kind,
        value: spec.value,
    })
}

fn connection_from_spec(spec: ConnectionSpec, path: &str) -> Result<Connection, CoreError> {
    match spec {
        ConnectionSpec::Text(text) => Connection::parse_at(&text, path),
        ConnectionSpec::Object { source, target } => {
            Connection::from_endpoints_at(&source, &target, path)
        }
    }
}

// ---------------------------------------------------------------------------
// Wire-format conversion
// ---------------------------------------------------------------------------

impl TryFrom<RoutineSpec> for Routine {
    type Error = CoreError;

    fn try_from(spec: RoutineSpec) -> Result<Self, Self::Error> {
        Routine::from_spec_at(spec, "routine")
    }
}

impl From<&Routine> for RoutineSpec {
    fn from(routine: &Routine) -> Self {
        RoutineSpec {
            name: routine.name.to_string(),
            children: routine.children().map(RoutineSpec::from).collect(),
            kind: routine.kind.clone(),
            ports: routine
                .ports()
                .map(|p| PortSpec {
                    name: p.name.to_string(),
                    direction: p.direction,
                    size: p.size.clone(),
                })
                .collect(),
            resources: routine
                .resources()
                .map(|r| ResourceSpec {
                    name: r.name.to_string(),
                    kind: r.kind,
                    value: r.value.clone(),
                })
                .collect(),
            connections: routine
                .connections
                .iter()
                .map(|c| ConnectionSpec::Object {
                    source: c.source.to_string(),
                    target: c.target.to_string(),
                })
                .collect(),
            input_params: routine.input_params.iter().map(|p| p.to_string()).collect(),
            local_variables: routine.local_variables.clone(),
            linked_params: routine
                .linked_params
                .iter()
                .map(|l| ParamLinkSpec {
                    source: l.source.to_string(),
                    targets: l.targets.iter().map(|t| t.to_string()).collect(),
                })
                .collect(),
            meta: routine.meta.clone(),
        }
    }
}

impl Serialize for Routine {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RoutineSpec::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Routine {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let spec = RoutineSpec::deserialize(deserializer)?;
        Routine::try_from(spec).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Bottom-up constructor for [`Routine`].
///
/// Collects raw fields and validates everything in [`build`](Self::build);
/// errors are reported relative to the routine's name.
#[derive(Debug, Clone)]
pub struct RoutineBuilder {
    spec: RoutineSpec,
    children: Vec<Routine>,
}

impl RoutineBuilder {
    /// Sets the free-form `type` tag.
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.spec.kind = Some(kind.into());
        self
    }

    pub fn port(
        mut self,
        name: impl Into<String>,
        direction: Direction,
        size: impl Into<Option<Value>>,
    ) -> Self {
        self.spec.ports.push(PortSpec {
            name: name.into(),
            direction,
            size: size.into(),
        });
        self
    }

    pub fn input(self, name: impl Into<String>, size: impl Into<Option<Value>>) -> Self {
        self.port(name, Direction::Input, size)
    }

    pub fn output(self, name: impl Into<String>, size: impl Into<Option<Value>>) -> Self {
        self.port(name, Direction::Output, size)
    }

    pub fn through(self, name: impl Into<String>, size: impl Into<Option<Value>>) -> Self {
        self.port(name, Direction::Through, size)
    }

    pub fn child(mut self, child: Routine) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Routine>) -> Self {
        self.children.extend(children);
        self
    }

    /// Adds a connection in `"source -> target"` form.
    pub fn connection(mut self, text: impl Into<String>) -> Self {
        let connection = ConnectionSpec::Text(text.into());
        self.spec.connections.push(connection);
        self
    }

    pub fn connect(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.spec.connections.push(ConnectionSpec::Object {
            source: source.into(),
            target: target.into(),
        });
        self
    }

    pub fn resource(
        mut self,
        name: impl Into<String>,
        kind: ResourceType,
        value: impl Into<Option<Value>>,
    ) -> Self {
        self.spec.resources.push(ResourceSpec {
            name: name.into(),
            kind,
            value: value.into(),
        });
        self
    }

    pub fn input_param(mut self, param: impl Into<String>) -> Self {
        self.spec.input_params.push(param.into());
        self
    }

    pub fn local_variable(mut self, name: impl Into<String>, expr: impl Into<String>) -> Self {
        self.spec.local_variables.insert(name.into(), expr.into());
        self
    }

    pub fn link_params(mut self, source: impl Into<String>, targets: &[&str]) -> Self {
        self.spec.linked_params.push(ParamLinkSpec {
            source: source.into(),
            targets: targets.iter().map(|t| t.to_string()).collect(),
        });
        self
    }

    pub fn meta(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.spec.meta.insert(key.into(), value);
        self
    }

    /// Validates and builds the routine.
    pub fn build(self) -> Result<Routine, CoreError> {
        let path = self.spec.name.clone();
        Routine::assemble(self.spec, self.children, &path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf_a() -> Routine {
        Routine::builder("a")
            .input("ctrl", Value::from("N"))
            .input("target", Value::from("N"))
            .output("out", Value::from("2N"))
            .build()
            .unwrap()
    }

    fn example_routine() -> Routine {
        Routine::builder("root")
            .child(leaf_a())
            .child(Routine::builder("b").build().unwrap())
            .input("in_0", Value::from(2i64))
            .output("out_0", Value::from(3i64))
            .resource("n_rotations", ResourceType::Additive, Value::from(4i64))
            .resource("n_toffs", ResourceType::Additive, Value::from(100i64))
            .connection("in_0 -> a.ctrl")
            .build()
            .unwrap()
    }

    #[test]
    fn builder_constructs_valid_routine() {
        let root = example_routine();
        assert_eq!(root.name().as_str(), "root");
        assert_eq!(root.child_count(), 2);
        assert_eq!(root.connections().len(), 1);
        assert!(!root.is_leaf());
        assert!(root.child("b").unwrap().is_leaf());
    }

    #[test]
    fn dangling_endpoint_is_rejected_at_construction() {
        let err = Routine::builder("root")
            .input("in_0", None)
            .connection("in_0 -> out_0")
            .build()
            .unwrap_err();
        match err {
            CoreError::DanglingConnection { path, endpoints } => {
                assert_eq!(path, "root.connections");
                assert_eq!(endpoints, vec!["out_0".to_string()]);
            }
            other => panic!("expected DanglingConnection, got {other:?}"),
        }
    }

    #[test]
    fn endpoint_on_unknown_child_port_is_rejected() {
        let result = Routine::builder("root")
            .child(leaf_a())
            .input("in_0", None)
            .connection("in_0 -> a.missing")
            .build();
        assert!(matches!(result, Err(CoreError::DanglingConnection { .. })));
    }

    #[test]
    fn duplicate_port_names_are_rejected() {
        let err = Routine::builder("root")
            .input("p", None)
            .output("p", None)
            .build()
            .unwrap_err();
        match err {
            CoreError::DuplicateName { path, kind, name } => {
                assert_eq!(path, "root.ports[1]");
                assert_eq!(kind, "port");
                assert_eq!(name, "p");
            }
            other => panic!("expected DuplicateName, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_child_names_are_rejected() {
        let result = Routine::builder("root")
            .child(leaf_a())
            .child(leaf_a())
            .build();
        assert!(matches!(result, Err(CoreError::DuplicateName { kind: "child", .. })));
    }

    #[test]
    fn duplicate_resource_names_are_rejected() {
        let result = Routine::builder("root")
            .resource("n", ResourceType::Other, None)
            .resource("n", ResourceType::Qubits, None)
            .build();
        assert!(matches!(
            result,
            Err(CoreError::DuplicateName { kind: "resource", .. })
        ));
    }

    #[test]
    fn invalid_routine_name_is_rejected() {
        let result = Routine::builder("not a name").build();
        assert!(matches!(result, Err(CoreError::InvalidName { .. })));
    }

    #[test]
    fn ports_are_sorted_but_children_keep_order() {
        let root = Routine::builder("root")
            .child(Routine::builder("z").build().unwrap())
            .child(Routine::builder("m").build().unwrap())
            .child(Routine::builder("a").build().unwrap())
            .output("zz", None)
            .input("aa", None)
            .build()
            .unwrap();
        let children: Vec<&str> = root.children().map(|c| c.name().as_str()).collect();
        assert_eq!(children, vec!["z", "m", "a"]);
        let ports: Vec<&str> = root.ports().map(|p| p.name.as_str()).collect();
        assert_eq!(ports, vec!["aa", "zz"]);
    }

    #[test]
    fn connections_are_sorted_by_source() {
        let root = Routine::builder("root")
            .child(leaf_a())
            .input("in_0", None)
            .input("in_1", None)
            .output("out_0", None)
            .connection("in_1 -> a.target")
            .connection("a.out -> out_0")
            .connection("in_0 -> a.ctrl")
            .build()
            .unwrap();
        let sources: Vec<String> = root
            .connections()
            .iter()
            .map(|c| c.source.to_string())
            .collect();
        assert_eq!(sources, vec!["a.out", "in_0", "in_1"]);
    }

    #[test]
    fn setting_children_revalidates_connections() {
        let root = example_routine();
        // `a.ctrl` disappears, leaving `in_0 -> a.ctrl` dangling.
        let replacement = Routine::builder("a").input("in_0", None).build().unwrap();
        let result = root.with_children(vec![replacement]);
        assert!(matches!(result, Err(CoreError::DanglingConnection { .. })));
    }

    #[test]
    fn setting_children_to_compatible_list_succeeds() {
        let root = example_routine();
        let a = Routine::builder("a").input("ctrl", None).build().unwrap();
        let c = Routine::builder("c").build().unwrap();
        let root = root.with_children(vec![a, c]).unwrap();
        let names: Vec<&str> = root.children().map(|c| c.name().as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn setting_ports_revalidates_connections() {
        let root = example_routine();
        let only_out = vec![Port::output("out_0", Value::from(3i64)).unwrap()];
        assert!(matches!(
            root.clone().with_ports(only_out),
            Err(CoreError::DanglingConnection { .. })
        ));
        let only_in = vec![Port::input("in_0", Value::from(2i64)).unwrap()];
        let root = root.with_ports(only_in).unwrap();
        assert_eq!(root.ports().len(), 1);
    }

    #[test]
    fn setting_connections_validates_endpoints() {
        let root = example_routine();
        let ok = vec![Connection::parse("in_0 -> a.target").unwrap()];
        let root = root.with_connections(ok).unwrap();
        assert_eq!(root.connections()[0].to_string(), "in_0 -> a.target");

        let bad = vec![Connection::parse("in_0 -> b.in_0").unwrap()];
        assert!(root.with_connections(bad).is_err());
    }

    #[test]
    fn setting_resources_replaces_values() {
        let root = example_routine();
        let root = root
            .with_resources(vec![
                Resource::new("n_rotations", ResourceType::Additive, Value::from(40i64))
                    .unwrap(),
                Resource::new("n_toffs", ResourceType::Additive, Value::from(10i64))
                    .unwrap(),
            ])
            .unwrap();
        assert_eq!(root.resource("n_rotations").unwrap().value, Some(Value::Int(40)));
        assert_eq!(root.resource("n_toffs").unwrap().value, Some(Value::Int(10)));
    }

    #[test]
    fn child_can_be_replaced_by_name() {
        let root = example_routine();
        let new_b = Routine::builder("b").kind("custom").build().unwrap();
        let root = root.replace_child("b", new_b.clone()).unwrap();
        assert_eq!(root.child("b"), Some(&new_b));
        let names: Vec<&str> = root.children().map(|c| c.name().as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn child_can_be_removed_by_name() {
        let root = example_routine().remove_child("b").unwrap();
        let names: Vec<&str> = root.children().map(|c| c.name().as_str()).collect();
        assert_eq!(names, vec!["a"]);
    }

    #[test]
    fn removing_a_wired_child_is_rejected() {
        let result = example_routine().remove_child("a");
        assert!(matches!(result, Err(CoreError::DanglingConnection { .. })));
    }

    #[test]
    fn unknown_names_are_not_found() {
        let root = example_routine();
        let x = Routine::builder("x").build().unwrap();
        match root.clone().replace_child("x", x) {
            Err(CoreError::NotFound { kind, name }) => {
                assert_eq!(kind, "child");
                assert_eq!(name, "x");
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
        assert!(matches!(
            root.clone().remove_port("in_10"),
            Err(CoreError::NotFound { kind: "port", .. })
        ));
        assert!(matches!(
            root.remove_resource("n_qubits"),
            Err(CoreError::NotFound { kind: "resource", .. })
        ));
    }

    #[test]
    fn port_and_resource_replacement_by_name() {
        let root = example_routine();
        let root = root
            .replace_port("out_0", Port::output("out_0", Value::from(10i64)).unwrap())
            .unwrap();
        assert_eq!(root.port("out_0").unwrap().size, Some(Value::Int(10)));

        let root = root
            .replace_resource(
                "n_toffs",
                Resource::new("n_toffs", ResourceType::Multiplicative, Value::from(10i64))
                    .unwrap(),
            )
            .unwrap();
        assert_eq!(
            root.resource("n_toffs").unwrap().kind,
            ResourceType::Multiplicative
        );

        let root = root.remove_port("out_0").unwrap();
        let ports: Vec<&str> = root.ports().map(|p| p.name.as_str()).collect();
        assert_eq!(ports, vec!["in_0"]);
    }

    #[test]
    fn removing_a_wired_port_is_rejected() {
        assert!(example_routine().remove_port("in_0").is_err());
    }

    #[test]
    fn resolve_finds_own_and_child_ports() {
        let root = example_routine();
        let own = "in_0".parse::<PortRef>().unwrap();
        let child = "a.out".parse::<PortRef>().unwrap();
        let missing = "b.out".parse::<PortRef>().unwrap();
        assert_eq!(root.resolve(&own).unwrap().direction, Direction::Input);
        assert_eq!(root.resolve(&child).unwrap().direction, Direction::Output);
        assert!(root.resolve(&missing).is_none());
    }

    #[test]
    fn deserialization_reports_nested_field_path() {
        let json = r#"{
            "name": "root",
            "children": [
                {"name": "ok"},
                {"name": "bad", "ports": [{"name": "9p", "direction": "input"}]}
            ]
        }"#;
        let spec: RoutineSpec = serde_json::from_str(json).unwrap();
        match Routine::try_from(spec).unwrap_err() {
            CoreError::InvalidName { path, value, .. } => {
                assert_eq!(path, "routine.children[1].ports[0].name");
                assert_eq!(value, "9p");
            }
            other => panic!("expected InvalidName, got {other:?}"),
        }
    }

    #[test]
    fn malformed_connection_reports_index() {
        let json = r#"{"name": "root", "ports": [{"name": "p", "direction": "input"}],
                       "connections": ["p -> p", "p p"]}"#;
        let spec: RoutineSpec = serde_json::from_str(json).unwrap();
        match Routine::try_from(spec).unwrap_err() {
            CoreError::MalformedConnection { path, text } => {
                assert_eq!(path, "routine.connections[1]");
                assert_eq!(text, "p p");
            }
            other => panic!("expected MalformedConnection, got {other:?}"),
        }
    }

    #[test]
    fn serde_roundtrip_preserves_routine() {
        let root = Routine::builder("root")
            .kind("block")
            .child(leaf_a())
            .input("in_0", Value::from(2i64))
            .connection("in_0 -> a.ctrl")
            .input_param("N")
            .local_variable("M", "2*N")
            .link_params("N", &["a.N"])
            .meta("author", serde_json::json!("me"))
            .build()
            .unwrap();
        let json = serde_json::to_string(&root).unwrap();
        let back: Routine = serde_json::from_str(&json).unwrap();
        assert_eq!(back, root);
    }

    #[test]
    fn serialization_uses_object_connections_and_omits_empty_fields() {
        let root = Routine::builder("root")
            .input("in_0", None)
            .output("out_0", None)
            .connection("in_0->out_0")
            .build()
            .unwrap();
        let json = serde_json::to_value(&root).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "root",
                "ports": [
                    {"name": "in_0", "direction": "input", "size": null},
                    {"name": "out_0", "direction": "output", "size": null}
                ],
                "connections": [{"source": "in_0", "target": "out_0"}]
            })
        );
    }

    #[test]
    fn deserialize_rejects_dangling_connection() {
        let json = r#"{"name": "root", "ports": [{"name": "in_0", "direction": "input"}],
                       "connections": ["in_0 -> out_0"]}"#;
        let err = serde_json::from_str::<Routine>(json).unwrap_err();
        assert!(err.to_string().contains("out_0"));
    }
}
