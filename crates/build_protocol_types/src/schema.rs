//! A machine-readable description of the protocol.

use schemars::{JsonSchema, Schema, schema_for};
use serde::Serialize;

use crate::procedures::{
    conda_metadata::{CondaMetadataParams, CondaMetadataResult},
    initialize::{InitializeParams, InitializeResult},
};

/// Any of the messages that can be exchanged. Only used to describe the
/// protocol as a single schema document.
#[derive(Serialize, JsonSchema)]
#[serde(untagged)]
#[allow(dead_code)]
enum ProtocolMessage {
    InitializeParams(InitializeParams),
    InitializeResult(InitializeResult),
    CondaMetadataParams(CondaMetadataParams),
    CondaMetadataResult(CondaMetadataResult),
}

/// Returns the JSON schema of all the messages of the protocol.
///
/// The root of the schema accepts any of the four top-level messages. Every
/// named type, including the capabilities and the package metadata, is
/// available under `$defs`.
pub fn protocol_schema() -> Schema {
    schema_for!(ProtocolMessage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_contains_all_messages() {
        let schema = serde_json::to_value(protocol_schema()).unwrap();
        let defs = schema["$defs"].as_object().unwrap();
        for name in [
            "InitializeParams",
            "InitializeResult",
            "CondaMetadataParams",
            "CondaMetadataResult",
            "CondaPackageMetadata",
            "BackendCapabilities",
            "FrontendCapabilities",
        ] {
            assert!(defs.contains_key(name), "missing definition for {name}");
        }
        assert_eq!(schema["anyOf"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_schema_describes_constraints() {
        let schema = serde_json::to_value(protocol_schema()).unwrap();
        let defs = &schema["$defs"];
        assert_eq!(defs["NonEmptyStr"]["minLength"], 1);
        assert_eq!(defs["CondaUrl"]["pattern"], "^(http|https|file):");
        assert_eq!(defs["DirectoryPath"]["format"], "directory-path");

        let required = defs["CondaPackageMetadata"]["required"]
            .as_array()
            .unwrap();
        for field in ["name", "version", "build", "subdir"] {
            assert!(required.contains(&serde_json::json!(field)));
        }
        assert!(!required.contains(&serde_json::json!("buildNumber")));
        assert!(!required.contains(&serde_json::json!("depends")));
    }
}
