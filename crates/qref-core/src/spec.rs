//! Raw wire-format types.
//!
//! These mirror the JSON/YAML document shape one-to-one and carry no
//! invariants beyond what serde checks. [`Routine`](crate::Routine) and
//! [`Program`](crate::Program) deserialize through them and serialize back
//! into them; validation happens in the conversion, where field paths are
//! known.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::types::{Direction, ResourceType, Value};

/// Version tag of the document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum SchemaVersion {
    #[serde(rename = "v1")]
    V1,
}

impl SchemaVersion {
    pub const LATEST: SchemaVersion = SchemaVersion::V1;

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaVersion::V1 => "v1",
        }
    }

    /// Looks up a version by its tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "v1" => Some(SchemaVersion::V1),
            _ => None,
        }
    }
}

/// Top-level document: a version tag plus the root routine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[schemars(rename = "Program")]
pub struct ProgramSpec {
    pub version: SchemaVersion,
    pub program: RoutineSpec,
}

/// One routine, with its children inlined recursively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[schemars(rename = "Routine")]
pub struct RoutineSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RoutineSpec>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<PortSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<ResourceSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<ConnectionSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input_params: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub local_variables: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub linked_params: Vec<ParamLinkSpec>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub meta: serde_json::Map<String, serde_json::Value>,
}

impl RoutineSpec {
    /// A routine with only a name.
    pub fn named(name: impl Into<String>) -> Self {
        RoutineSpec {
            name: name.into(),
            children: Vec::new(),
            kind: None,
            ports: Vec::new(),
            resources: Vec::new(),
            connections: Vec::new(),
            input_params: Vec::new(),
            local_variables: BTreeMap::new(),
            linked_params: Vec::new(),
            meta: serde_json::Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[schemars(rename = "Port")]
pub struct PortSpec {
    pub name: String,
    pub direction: Direction,
    #[serde(default)]
    pub size: Option<Value>,
}

/// A connection, either as an object or as the `"source -> target"` shorthand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
#[schemars(rename = "Connection")]
pub enum ConnectionSpec {
    Text(String),
    Object { source: String, target: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[schemars(rename = "Resource")]
pub struct ResourceSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ResourceType,
    #[serde(default)]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[schemars(rename = "ParamLink")]
pub struct ParamLinkSpec {
    pub source: String,
    pub targets: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connections_accept_both_shapes() {
        let spec: RoutineSpec = serde_json::from_str(
            r#"{
                "name": "root",
                "connections": ["a.o -> b.i", {"source": "b.o", "target": "out"}]
            }"#,
        )
        .unwrap();
        assert_eq!(
            spec.connections,
            vec![
                ConnectionSpec::Text("a.o -> b.i".into()),
                ConnectionSpec::Object {
                    source: "b.o".into(),
                    target: "out".into()
                },
            ]
        );
    }

    #[test]
    fn empty_collections_are_omitted() {
        let json = serde_json::to_value(RoutineSpec::named("leaf")).unwrap();
        assert_eq!(json, serde_json::json!({"name": "leaf"}));
    }

    #[test]
    fn type_field_is_renamed() {
        let json = r#"{"name": "r", "type": "qft"}"#;
        let spec: RoutineSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.kind.as_deref(), Some("qft"));
    }

    #[test]
    fn version_must_be_known() {
        let bad = r#"{"version": "v2", "program": {"name": "r"}}"#;
        assert!(serde_json::from_str::<ProgramSpec>(bad).is_err());
        assert_eq!(SchemaVersion::from_tag("v1"), Some(SchemaVersion::V1));
        assert_eq!(SchemaVersion::from_tag("v0"), None);
    }

    #[test]
    fn port_size_defaults_to_none() {
        let json = r#"{"name": "p", "direction": "output"}"#;
        let port: PortSpec = serde_json::from_str(json).unwrap();
        assert_eq!(port.size, None);
    }
}
