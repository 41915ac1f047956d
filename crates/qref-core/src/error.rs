//! Core error types for qref-core.
//!
//! Uses `thiserror` for structured, matchable error variants covering every
//! way a routine tree can fail to be constructed. Structural variants carry
//! the field path of the offending value, e.g.
//! `program.children[1].connections[0]`.

use thiserror::Error;

/// Core errors produced by the qref-core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A name does not match the pattern required at its position.
    #[error("invalid name '{value}' at {path}: expected {expected}")]
    InvalidName {
        path: String,
        value: String,
        expected: &'static str,
    },

    /// Two ports, children or resources of one routine share a name.
    #[error("duplicate {kind} name '{name}' at {path}")]
    DuplicateName {
        path: String,
        kind: &'static str,
        name: String,
    },

    /// A connection string is not of the form `source -> target`.
    #[error("malformed connection '{text}' at {path}: expected 'source -> target'")]
    MalformedConnection { path: String, text: String },

    /// Connection endpoints that are neither ports of the routine nor ports
    /// of one of its children.
    #[error(
        "connections at {path} refer to ports that are not among the routine's ports or its children's ports: {}",
        endpoints.join(", ")
    )]
    DanglingConnection {
        path: String,
        endpoints: Vec<String>,
    },

    /// A by-name replacement or removal targeted a name that does not exist.
    #[error("{kind} not found: '{name}'")]
    NotFound { kind: &'static str, name: String },

    /// A document value has the wrong shape, e.g. an unknown port direction
    /// or a missing required field.
    #[error("invalid value at {path}: {source}")]
    Shape {
        path: String,
        source: serde_json::Error,
    },

    /// A schema version tag that this crate does not know about.
    #[error("unknown schema version '{version}'")]
    UnknownSchemaVersion { version: String },

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization or deserialization failed.
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Reading or writing a program file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
