use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value;

use crate::{
    NonEmptyString, PackageName, Platform, Version,
    validation::{
        FieldErrors, FieldPath, FromWire, ObjectReader, Validate, deserialize_via_validate,
    },
};

/// Metadata of a single conda package that a source recipe would produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CondaPackageMetadata {
    /// The name of the package
    pub name: PackageName,

    /// The version of the package
    pub version: Version,

    /// The build string of the package
    pub build: NonEmptyString,

    /// The build number of the package
    #[serde(default)]
    pub build_number: u64,

    /// The subdirectory of the package
    pub subdir: Platform,

    /// The dependencies of the package.
    ///
    /// `None` means no dependency information is available, an empty list
    /// means the package has no dependencies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depends: Option<Vec<NonEmptyString>>,

    /// Additional run constraints that apply to the package.
    ///
    /// `None` means no constraint information is available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constrains: Option<Vec<NonEmptyString>>,

    /// The license of the package
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<NonEmptyString>,

    /// The license family of the package
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_family: Option<NonEmptyString>,
}

impl FromWire for CondaPackageMetadata {
    fn from_wire(value: &Value, path: &FieldPath, errors: &mut FieldErrors) -> Option<Self> {
        let mut object = ObjectReader::new(value, path, errors)?;
        let name = object.required("name");
        let version = object.required("version");
        let build = object.required("build");
        let build_number = object.or_default("buildNumber");
        let subdir = object.required("subdir");
        let depends = object.optional("depends");
        let constrains = object.optional("constrains");
        let license = object.optional("license");
        let license_family = object.optional("licenseFamily");

        Some(Self {
            name: name?,
            version: version?,
            build: build?,
            build_number: build_number?,
            subdir: subdir?,
            depends: depends?,
            constrains: constrains?,
            license: license?,
            license_family: license_family?,
        })
    }
}

impl Validate for CondaPackageMetadata {
    const TYPE_NAME: &'static str = "CondaPackageMetadata";
}

deserialize_via_validate!(CondaPackageMetadata);
