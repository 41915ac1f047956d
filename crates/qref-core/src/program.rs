//! Versioned top-level documents and the inputs accepted by verification.

use std::borrow::Cow;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;
use crate::routine::Routine;
use crate::spec::{ProgramSpec, RoutineSpec, SchemaVersion};

/// A routine tree tagged with the schema version it conforms to.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub version: SchemaVersion,
    pub program: Routine,
}

impl Program {
    /// Wraps `program` with the latest schema version.
    pub fn new(program: Routine) -> Self {
        Program {
            version: SchemaVersion::LATEST,
            program,
        }
    }

    /// Parses a raw document, checking the version tag before the tree.
    pub fn from_value(value: serde_json::Value) -> Result<Self, CoreError> {
        check_version(&value)?;
        let spec: ProgramSpec = from_value_at(value, None, "program")?;
        Program::try_from(spec)
    }
}

/// Deserializes `value`, keeping the field path of a shape error.
///
/// Nested failures are reported at `prefix.field[i]...`, a failure of the
/// value as a whole at `root`.
fn from_value_at<T: DeserializeOwned>(
    value: serde_json::Value,
    prefix: Option<&str>,
    root: &str,
) -> Result<T, CoreError> {
    serde_path_to_error::deserialize(value).map_err(|err| {
        let field = err.path().to_string();
        let path = match prefix {
            _ if field == "." => root.to_string(),
            Some(prefix) => format!("{prefix}.{field}"),
            None => field,
        };
        CoreError::Shape {
            path,
            source: err.into_inner(),
        }
    })
}

fn check_version(value: &serde_json::Value) -> Result<(), CoreError> {
    match value.get("version") {
        Some(serde_json::Value::String(tag)) if SchemaVersion::from_tag(tag).is_none() => {
            Err(CoreError::UnknownSchemaVersion {
                version: tag.clone(),
            })
        }
        _ => Ok(()),
    }
}

impl TryFrom<ProgramSpec> for Program {
    type Error = CoreError;

    fn try_from(spec: ProgramSpec) -> Result<Self, Self::Error> {
        Ok(Program {
            version: spec.version,
            program: Routine::from_spec_at(spec.program, "program")?,
        })
    }
}

impl From<&Program> for ProgramSpec {
    fn from(program: &Program) -> Self {
        ProgramSpec {
            version: program.version,
            program: RoutineSpec::from(&program.program),
        }
    }
}

impl Serialize for Program {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ProgramSpec::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Program {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let spec = ProgramSpec::deserialize(deserializer)?;
        Program::try_from(spec).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// ProgramLike
// ---------------------------------------------------------------------------

/// Anything that can be verified: a program, a bare routine, or an
/// unvalidated document.
///
/// A raw document with a `version` key is read as a [`Program`], anything
/// else as a bare [`Routine`].
#[derive(Debug, Clone)]
pub enum ProgramLike<'a> {
    Program(&'a Program),
    Routine(&'a Routine),
    Raw(serde_json::Value),
}

impl<'a> ProgramLike<'a> {
    /// Resolves the input to its root routine, validating raw documents.
    pub fn into_routine(self) -> Result<Cow<'a, Routine>, CoreError> {
        match self {
            ProgramLike::Program(program) => Ok(Cow::Borrowed(&program.program)),
            ProgramLike::Routine(routine) => Ok(Cow::Borrowed(routine)),
            ProgramLike::Raw(value) => {
                if value.get("version").is_some() {
                    Ok(Cow::Owned(Program::from_value(value)?.program))
                } else {
                    let spec: RoutineSpec = from_value_at(value, Some("routine"), "routine")?;
                    Ok(Cow::Owned(Routine::try_from(spec)?))
                }
            }
        }
    }
}

impl<'a> From<&'a Program> for ProgramLike<'a> {
    fn from(program: &'a Program) -> Self {
        ProgramLike::Program(program)
    }
}

impl<'a> From<&'a Routine> for ProgramLike<'a> {
    fn from(routine: &'a Routine) -> Self {
        ProgramLike::Routine(routine)
    }
}

impl From<serde_json::Value> for ProgramLike<'static> {
    fn from(value: serde_json::Value) -> Self {
        ProgramLike::Raw(value)
    }
}
