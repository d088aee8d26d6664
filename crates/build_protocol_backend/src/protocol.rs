use build_protocol_types::procedures::{
    conda_metadata::{CondaMetadataParams, CondaMetadataResult},
    initialize::{InitializeParams, InitializeResult},
};

/// A trait that is used to instantiate a new protocol connection
/// and endpoint that can handle the RPC calls.
#[async_trait::async_trait]
pub trait ProtocolInstantiator: Send + Sync + 'static {
    /// Called when the client requests initialization.
    /// Returns the protocol endpoint and the result of the initialization.
    ///
    /// The parameters have already been validated, so `params.source_dir`
    /// is known to be an existing directory.
    async fn initialize(
        &self,
        params: InitializeParams,
    ) -> miette::Result<(Box<dyn Protocol + Send + Sync + 'static>, InitializeResult)>;
}

/// A trait that defines the protocol for a build backend.
/// These are implemented by the different backends, which
/// serve as an endpoint for the RPC calls.
#[async_trait::async_trait]
pub trait Protocol {
    /// Called when the client requests metadata for the conda packages in
    /// the source directory.
    ///
    /// A backend that cannot determine any packages should return an empty
    /// list or an error, this is not a protocol violation.
    async fn conda_metadata(&self, params: CondaMetadataParams)
    -> miette::Result<CondaMetadataResult>;
}
