//! Reading and writing program documents as JSON or YAML.

use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::CoreError;
use crate::program::ProgramLike;

/// Supported document encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    /// Picks a format from the file extension, if it is a known one.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Format::Json),
            "yaml" | "yml" => Some(Format::Yaml),
            _ => None,
        }
    }

    /// Like [`from_path`](Self::from_path), falling back to YAML, which also
    /// reads JSON.
    pub fn detect(path: impl AsRef<Path>) -> Self {
        Self::from_path(path).unwrap_or(Format::Yaml)
    }

    /// Parses `s` into an unvalidated document.
    pub fn parse_str(&self, s: &str) -> Result<serde_json::Value, CoreError> {
        match self {
            Format::Json => Ok(serde_json::from_str(s)?),
            Format::Yaml => Ok(serde_yaml::from_str(s)?),
        }
    }

    /// Reads the file at `path` into an unvalidated document.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<serde_json::Value, CoreError> {
        let text = std::fs::read_to_string(path)?;
        self.parse_str(&text)
    }

    /// Serializes `data`. JSON output is pretty-printed.
    pub fn to_string(&self, data: &impl Serialize) -> Result<String, CoreError> {
        match self {
            Format::Json => Ok(serde_json::to_string_pretty(data)?),
            Format::Yaml => Ok(serde_yaml::to_string(data)?),
        }
    }

    /// Writes `data` to the file at `path`.
    pub fn save(&self, data: &impl Serialize, path: impl AsRef<Path>) -> Result<(), CoreError> {
        let mut file = BufWriter::new(std::fs::File::create(path)?);
        file.write_all(self.to_string(data)?.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}

/// Loads a document for verification, choosing the format by extension.
///
/// Nothing is validated yet; that happens when the result is resolved.
pub fn load_program_like(path: impl AsRef<Path>) -> Result<ProgramLike<'static>, CoreError> {
    let path = path.as_ref();
    Ok(ProgramLike::Raw(Format::detect(path).load(path)?))
}
