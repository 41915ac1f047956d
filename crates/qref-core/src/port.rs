//! Ports: named, directional interface points of a routine.

use crate::error::CoreError;
use crate::name::Name;
use crate::types::{Direction, Value};

/// A port of a routine.
#[derive(Debug, Clone, PartialEq)]
pub struct Port {
    pub name: Name,
    pub direction: Direction,
    /// Scalar or symbolic size. `None` when unspecified.
    pub size: Option<Value>,
}

impl Port {
    /// Creates a port, validating its name.
    pub fn new(
        name: &str,
        direction: Direction,
        size: impl Into<Option<Value>>,
    ) -> Result<Self, CoreError> {
        Ok(Port {
            name: Name::new(name)?,
            direction,
            size: size.into(),
        })
    }

    pub fn input(name: &str, size: impl Into<Option<Value>>) -> Result<Self, CoreError> {
        Self::new(name, Direction::Input, size)
    }

    pub fn output(name: &str, size: impl Into<Option<Value>>) -> Result<Self, CoreError> {
        Self::new(name, Direction::Output, size)
    }

    pub fn through(name: &str, size: impl Into<Option<Value>>) -> Result<Self, CoreError> {
        Self::new(name, Direction::Through, size)
    }
}
