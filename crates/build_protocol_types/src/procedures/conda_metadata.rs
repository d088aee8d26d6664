//! This is used to determine the metadata of the conda packages in the source
//! directory.

use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value;

use crate::{
    CondaPackageMetadata, CondaUrl, Platform,
    validation::{
        FieldErrors, FieldPath, FromWire, ObjectReader, Validate, deserialize_via_validate,
    },
};

pub const METHOD_NAME: &str = "condaMetadata";

/// Parameters for the `condaMetadata` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CondaMetadataParams {
    /// The target platform, or the current platform if not specified
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_platform: Option<Platform>,

    /// Urls of channels to use for any resolution.
    ///
    /// The order is significant, earlier channels take priority. `None`
    /// leaves the choice of channels to the backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_base_urls: Option<Vec<CondaUrl>>,
}

impl FromWire for CondaMetadataParams {
    fn from_wire(value: &Value, path: &FieldPath, errors: &mut FieldErrors) -> Option<Self> {
        let mut object = ObjectReader::new(value, path, errors)?;
        let target_platform = object.optional("targetPlatform");
        let channel_base_urls = object.optional("channelBaseUrls");
        Some(Self {
            target_platform: target_platform?,
            channel_base_urls: channel_base_urls?,
        })
    }
}

impl Validate for CondaMetadataParams {
    const TYPE_NAME: &'static str = "CondaMetadataParams";
}

/// Contains the result of the `condaMetadata` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CondaMetadataResult {
    /// Metadata of all the packages that can be built from the source
    /// directory, in the order reported by the backend.
    pub packages: Vec<CondaPackageMetadata>,
}

impl FromWire for CondaMetadataResult {
    fn from_wire(value: &Value, path: &FieldPath, errors: &mut FieldErrors) -> Option<Self> {
        let mut object = ObjectReader::new(value, path, errors)?;
        let packages = object.required("packages");
        Some(Self {
            packages: packages?,
        })
    }
}

impl Validate for CondaMetadataResult {
    const TYPE_NAME: &'static str = "CondaMetadataResult";
}

deserialize_via_validate!(CondaMetadataParams, CondaMetadataResult);
