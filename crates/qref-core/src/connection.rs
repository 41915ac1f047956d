//! Directed connections between port references within one nesting level.

use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::name::Name;

/// One end of a connection: `port` on the current routine, or `child.port`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortRef {
    /// The child owning the port. `None` for the routine's own ports.
    pub child: Option<Name>,
    pub port: Name,
}

impl PortRef {
    /// A reference to one of the current routine's own ports.
    pub fn own(port: Name) -> Self {
        PortRef { child: None, port }
    }

    /// A reference to `child.port`.
    pub fn child(child: Name, port: Name) -> Self {
        PortRef {
            child: Some(child),
            port,
        }
    }

    pub(crate) fn parse_at(value: &str, path: &str) -> Result<Self, CoreError> {
        let invalid = || CoreError::InvalidName {
            path: path.to_string(),
            value: value.to_string(),
            expected: "a port name or a child.port pair",
        };
        let mut parts = value.split('.');
        let first = parts.next().ok_or_else(invalid)?;
        let second = parts.next();
        if parts.next().is_some() {
            return Err(invalid());
        }
        let first = Name::parse_at(first, path).map_err(|_| invalid())?;
        match second {
            None => Ok(PortRef::own(first)),
            Some(port) => {
                let port = Name::parse_at(port, path).map_err(|_| invalid())?;
                Ok(PortRef::child(first, port))
            }
        }
    }
}

impl FromStr for PortRef {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PortRef::parse_at(s, "port reference")
    }
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.child {
            Some(child) => write!(f, "{child}.{}", self.port),
            None => f.write_str(&self.port),
        }
    }
}

/// A directed wire from `source` to `target`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Connection {
    pub source: PortRef,
    pub target: PortRef,
}

impl Connection {
    /// Creates a connection from two endpoint strings.
    pub fn new(source: &str, target: &str) -> Result<Self, CoreError> {
        Self::from_endpoints_at(source, target, "connection")
    }

    /// Parses the `"source -> target"` shorthand. Whitespace around the arrow
    /// is ignored.
    pub fn parse(text: &str) -> Result<Self, CoreError> {
        Self::parse_at(text, "connection")
    }

    pub(crate) fn parse_at(text: &str, path: &str) -> Result<Self, CoreError> {
        let malformed = || CoreError::MalformedConnection {
            path: path.to_string(),
            text: text.to_string(),
        };
        let (source, target) = text.split_once("->").ok_or_else(malformed)?;
        if target.contains("->") {
            return Err(malformed());
        }
        Self::from_endpoints_at(source.trim(), target.trim(), path)
    }

    pub(crate) fn from_endpoints_at(
        source: &str,
        target: &str,
        path: &str,
    ) -> Result<Self, CoreError> {
        Ok(Connection {
            source: PortRef::parse_at(source, &format!("{path}.source"))?,
            target: PortRef::parse_at(target, &format!("{path}.target"))?,
        })
    }
}

impl FromStr for Connection {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Connection::parse(s)
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}
