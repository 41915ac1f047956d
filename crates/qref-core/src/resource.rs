//! Cost-accounting resources and parameter links.
//!
//! Neither takes part in topology verification; they are carried through
//! construction and serialization untouched apart from name validation.

use crate::error::CoreError;
use crate::name::{Name, Namespacing, QualifiedName};
use crate::types::{ResourceType, Value};

/// A named cost metric attached to a routine.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub name: Name,
    pub kind: ResourceType,
    pub value: Option<Value>,
}

impl Resource {
    pub fn new(
        name: &str,
        kind: ResourceType,
        value: impl Into<Option<Value>>,
    ) -> Result<Self, CoreError> {
        Ok(Resource {
            name: Name::new(name)?,
            kind,
            value: value.into(),
        })
    }
}

/// Propagation of a parameter from `source` to parameters of descendants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamLink {
    /// `param` or `child.param`.
    pub source: QualifiedName,
    /// Each target has at least two segments, e.g. `child.param`.
    pub targets: Vec<QualifiedName>,
}

impl ParamLink {
    pub fn new(source: &str, targets: &[&str]) -> Result<Self, CoreError> {
        Self::parse_at(source, targets.iter().copied(), "linked_params")
    }

    pub(crate) fn parse_at<'a>(
        source: &str,
        targets: impl IntoIterator<Item = &'a str>,
        path: &str,
    ) -> Result<Self, CoreError> {
        let source =
            QualifiedName::parse_at(source, Namespacing::Optional, &format!("{path}.source"))?;
        let targets = targets
            .into_iter()
            .enumerate()
            .map(|(i, t)| {
                QualifiedName::parse_at(t, Namespacing::Multi, &format!("{path}.targets[{i}]"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ParamLink { source, targets })
    }
}
