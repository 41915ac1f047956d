//! JSON-schema generation for program documents.
//!
//! The schema is derived from the raw wire types with `schemars`, then
//! tightened with the name and connection patterns enforced at construction.

use schemars::schema_for;
use serde_json::Value as Json;

use crate::error::CoreError;
use crate::spec::{ProgramSpec, SchemaVersion};

const NAME: &str = "[A-Za-z_][A-Za-z0-9_]*";

/// Generates the JSON schema describing a program of the given `version`.
pub fn generate_program_schema(version: &str) -> Result<Json, CoreError> {
    match SchemaVersion::from_tag(version) {
        Some(SchemaVersion::V1) => generate_v1(),
        None => Err(CoreError::UnknownSchemaVersion {
            version: version.to_string(),
        }),
    }
}

fn generate_v1() -> Result<Json, CoreError> {
    let mut schema = serde_json::to_value(schema_for!(ProgramSpec))?;

    let name = format!("^{NAME}$");
    let endpoint = format!("^({NAME}\\.)?{NAME}$");
    let namespaced = format!("^({NAME}\\.)+{NAME}$");
    let multi = format!("^({NAME}\\.)*{NAME}$");
    let connection = format!("^\\s*({NAME}\\.)?{NAME}\\s*->\\s*({NAME}\\.)?{NAME}\\s*$");

    for (pointer, pattern) in [
        ("/definitions/Routine/properties/name", &name),
        ("/definitions/Routine/properties/input_params/items", &multi),
        ("/definitions/Port/properties/name", &name),
        ("/definitions/Resource/properties/name", &name),
        ("/definitions/Connection/anyOf/0", &connection),
        ("/definitions/Connection/anyOf/1/properties/source", &endpoint),
        ("/definitions/Connection/anyOf/1/properties/target", &endpoint),
        ("/definitions/ParamLink/properties/source", &endpoint),
        ("/definitions/ParamLink/properties/targets/items", &namespaced),
    ] {
        if let Some(Json::Object(node)) = schema.pointer_mut(pointer) {
            node.insert("pattern".into(), Json::from(pattern.as_str()));
        }
    }
    Ok(schema)
}
