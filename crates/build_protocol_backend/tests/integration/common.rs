use build_protocol_backend::protocol::{Protocol, ProtocolInstantiator};
use build_protocol_types::{
    BackendCapabilities, CondaPackageMetadata,
    procedures::{
        conda_metadata::{CondaMetadataParams, CondaMetadataResult},
        initialize::{InitializeParams, InitializeResult},
    },
};

/// A backend that reports a single `foo` package for whatever platform is
/// requested.
#[derive(Default)]
pub struct FooBackend {
    pub provides_conda_metadata: Option<bool>,
}

impl FooBackend {
    pub fn providing_metadata() -> Self {
        Self {
            provides_conda_metadata: Some(true),
        }
    }
}

#[async_trait::async_trait]
impl ProtocolInstantiator for FooBackend {
    async fn initialize(
        &self,
        _params: InitializeParams,
    ) -> miette::Result<(Box<dyn Protocol + Send + Sync + 'static>, InitializeResult)> {
        Ok((
            Box::new(FooEndpoint),
            InitializeResult {
                capabilities: BackendCapabilities {
                    provides_conda_metadata: self.provides_conda_metadata,
                },
            },
        ))
    }
}

struct FooEndpoint;

#[async_trait::async_trait]
impl Protocol for FooEndpoint {
    async fn conda_metadata(
        &self,
        params: CondaMetadataParams,
    ) -> miette::Result<CondaMetadataResult> {
        let Some(subdir) = params.target_platform else {
            miette::bail!("this backend needs an explicit target platform");
        };
        Ok(CondaMetadataResult {
            packages: vec![CondaPackageMetadata {
                name: "foo".parse().unwrap(),
                version: "1.0".parse().unwrap(),
                build: "py_0".parse().unwrap(),
                build_number: 0,
                subdir,
                depends: None,
                constrains: None,
                license: None,
                license_family: None,
            }],
        })
    }
}
