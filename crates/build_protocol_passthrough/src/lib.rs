//! A build backend that simply passes along package metadata that is stored
//! next to the sources.
//!
//! The source directory must contain a `conda-metadata.yaml` file in the
//! shape of a `condaMetadata` result. The file is validated like any other
//! message of the protocol when the backend is initialized, and every
//! `condaMetadata` request returns the packages that are built for the
//! requested platform. This backend is useful for testing frontends, as it
//! does not perform any actual processing of a recipe.

use std::path::Path;

use build_protocol_backend::protocol::{Protocol, ProtocolInstantiator};
use build_protocol_types::{
    BackendCapabilities, Platform, Validate,
    procedures::{
        conda_metadata::{CondaMetadataParams, CondaMetadataResult},
        initialize::{InitializeParams, InitializeResult},
    },
};
use miette::{Context, IntoDiagnostic};

/// The name of the file that holds the metadata of the packages.
pub const METADATA_FILE_NAME: &str = "conda-metadata.yaml";

/// The subdir of packages that can be installed on any platform.
const NOARCH_SUBDIR: &str = "noarch";

/// An implementation of the [`ProtocolInstantiator`] that creates a
/// [`PassthroughBackend`].
pub struct PassthroughInstantiator;

#[async_trait::async_trait]
impl ProtocolInstantiator for PassthroughInstantiator {
    async fn initialize(
        &self,
        params: InitializeParams,
    ) -> miette::Result<(Box<dyn Protocol + Send + Sync + 'static>, InitializeResult)> {
        let metadata = read_metadata_file(&params.source_dir.as_path().join(METADATA_FILE_NAME))?;
        tracing::debug!(
            packages = metadata.packages.len(),
            "loaded {METADATA_FILE_NAME}"
        );

        Ok((
            Box::new(PassthroughBackend { metadata }),
            InitializeResult {
                capabilities: BackendCapabilities {
                    provides_conda_metadata: Some(true),
                },
            },
        ))
    }
}

/// A backend that returns the packages of a fixed [`CondaMetadataResult`].
pub struct PassthroughBackend {
    metadata: CondaMetadataResult,
}

#[async_trait::async_trait]
impl Protocol for PassthroughBackend {
    async fn conda_metadata(
        &self,
        params: CondaMetadataParams,
    ) -> miette::Result<CondaMetadataResult> {
        let target_platform = match params.target_platform {
            Some(platform) => platform,
            None => host_platform()?,
        };
        if let Some(channels) = &params.channel_base_urls {
            tracing::debug!(
                channels = ?channels.iter().map(ToString::to_string).collect::<Vec<_>>(),
                "ignoring channels, nothing is resolved"
            );
        }

        let packages = self
            .metadata
            .packages
            .iter()
            .filter(|package| {
                package.subdir == target_platform.as_str() || package.subdir == NOARCH_SUBDIR
            })
            .cloned()
            .collect();
        Ok(CondaMetadataResult { packages })
    }
}

/// Reads and validates the metadata file at `path`.
fn read_metadata_file(path: &Path) -> miette::Result<CondaMetadataResult> {
    let contents = fs_err::read_to_string(path).into_diagnostic()?;
    let value: serde_json::Value = serde_yaml::from_str(&contents)
        .into_diagnostic()
        .with_context(|| format!("failed to parse {}", path.display()))?;
    CondaMetadataResult::validate(&value)
        .with_context(|| format!("{} does not describe valid packages", path.display()))
}

/// Returns the subdir of the platform this backend is running on.
pub fn host_platform() -> miette::Result<Platform> {
    rattler_conda_types::Platform::current()
        .as_str()
        .parse()
        .into_diagnostic()
}
