//! Capabilities that the frontend and backend provide.

use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value;

use crate::validation::{
    FieldErrors, FieldPath, FromWire, ObjectReader, Validate, deserialize_via_validate,
};

#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
/// Capabilities that the backend provides.
pub struct BackendCapabilities {
    /// Whether the backend is capable of providing metadata about source
    /// packages.
    ///
    /// `None` means the backend did not say. That is not the same as `false`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provides_conda_metadata: Option<bool>,
}

impl BackendCapabilities {
    /// Whether the backend provides the `condaMetadata` API.
    ///
    /// An unspecified capability is reported as `false`.
    pub fn provides_conda_metadata(&self) -> bool {
        self.provides_conda_metadata.unwrap_or(false)
    }
}

impl FromWire for BackendCapabilities {
    fn from_wire(value: &Value, path: &FieldPath, errors: &mut FieldErrors) -> Option<Self> {
        let mut object = ObjectReader::new(value, path, errors)?;
        let provides_conda_metadata = object.optional("providesCondaMetadata");
        Some(Self {
            provides_conda_metadata: provides_conda_metadata?,
        })
    }
}

impl Validate for BackendCapabilities {
    const TYPE_NAME: &'static str = "BackendCapabilities";
}

#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, JsonSchema)]
/// Capabilities that the frontend provides.
///
/// There are none yet. Fields added in the future must be optional so that
/// older frontends keep working.
pub struct FrontendCapabilities {}

impl FromWire for FrontendCapabilities {
    fn from_wire(value: &Value, path: &FieldPath, errors: &mut FieldErrors) -> Option<Self> {
        ObjectReader::new(value, path, errors)?;
        Some(Self {})
    }
}

impl Validate for FrontendCapabilities {
    const TYPE_NAME: &'static str = "FrontendCapabilities";
}

deserialize_via_validate!(BackendCapabilities, FrontendCapabilities);
