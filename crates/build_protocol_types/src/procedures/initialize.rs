use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value;

use crate::{
    BackendCapabilities, FrontendCapabilities, SourceDir,
    validation::{
        FieldErrors, FieldPath, FromWire, ObjectReader, Validate, deserialize_via_validate,
    },
};

pub const METHOD_NAME: &str = "initialize";

/// The params send as part of the `initialize` rpc method. The expected
/// result is of type [`InitializeResult`].
///
/// This request is the first request that the frontend sends to the backend
/// and serves as a hand-shake between the two. The frontend provides its
/// capabilities, the backend answers with its own.
///
/// This request must stay backwards and forwards compatible forever, which is
/// why it carries as few fields as possible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// An absolute path to the directory that contains the source files
    pub source_dir: SourceDir,

    /// Capabilities provided by the frontend
    pub capabilities: FrontendCapabilities,
}

impl FromWire for InitializeParams {
    fn from_wire(value: &Value, path: &FieldPath, errors: &mut FieldErrors) -> Option<Self> {
        let mut object = ObjectReader::new(value, path, errors)?;
        let source_dir = object.required("sourceDir");
        let capabilities = object.required("capabilities");
        Some(Self {
            source_dir: source_dir?,
            capabilities: capabilities?,
        })
    }
}

impl Validate for InitializeParams {
    const TYPE_NAME: &'static str = "InitializeParams";
}

/// The result of the `initialize` rpc method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    /// Capabilities provided by the backend
    pub capabilities: BackendCapabilities,
}

impl FromWire for InitializeResult {
    fn from_wire(value: &Value, path: &FieldPath, errors: &mut FieldErrors) -> Option<Self> {
        let mut object = ObjectReader::new(value, path, errors)?;
        let capabilities = object.required("capabilities");
        Some(Self {
            capabilities: capabilities?,
        })
    }
}

impl Validate for InitializeResult {
    const TYPE_NAME: &'static str = "InitializeResult";
}

deserialize_via_validate!(InitializeParams, InitializeResult);
