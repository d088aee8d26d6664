//! The state of a single conversation between a frontend and a backend.
//!
//! A session starts uninitialized. The only request it accepts in that state
//! is `initialize`. Once that succeeded the session is initialized for good
//! and answers `condaMetadata` requests. Violations of this order are
//! reported as [`SequencingError`]s, which are kept apart from payload
//! validation errors because the payload itself may be perfectly fine.

use build_protocol_types::{
    BackendCapabilities, Method, Request, Response, UnknownMethod, ValidationError,
    procedures::{
        conda_metadata::{CondaMetadataParams, CondaMetadataResult},
        initialize::{InitializeParams, InitializeResult},
    },
};
use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;

use crate::protocol::{Protocol, ProtocolInstantiator};

/// A method was called at a point where the session does not accept it.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum SequencingError {
    #[error("the session has already been initialized")]
    #[diagnostic(
        code(build_protocol::already_initialized),
        help("'initialize' can only be called once per session")
    )]
    AlreadyInitialized,

    #[error("'{method}' was called before the session was initialized")]
    #[diagnostic(
        code(build_protocol::not_initialized),
        help("call 'initialize' first")
    )]
    NotInitialized { method: Method },

    #[error("'{method}' was called but the backend declared that it does not provide it")]
    #[diagnostic(
        code(build_protocol::capability_not_provided),
        help("check the capabilities returned by 'initialize' before calling '{method}'")
    )]
    CapabilityNotProvided { method: Method },
}

/// An error that can occur while dispatching a request.
#[derive(Debug, Error, Diagnostic)]
pub enum DispatchError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    UnknownMethod(#[from] UnknownMethod),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Sequencing(#[from] SequencingError),

    /// The backend failed to handle a valid request.
    #[error("{0}")]
    Backend(miette::Report),

    #[error("failed to serialize the result of '{0}'")]
    Serialize(Method, #[source] serde_json::Error),
}

struct InitializedSession {
    endpoint: Box<dyn Protocol + Send + Sync + 'static>,
    capabilities: BackendCapabilities,
}

enum SessionState<T: ProtocolInstantiator> {
    /// Session has not been initialized yet.
    Uninitialized(T),
    /// Session has been initialized, with a protocol endpoint.
    Initialized(InitializedSession),
}

/// A single frontend/backend conversation.
///
/// Every session owns its own state, independent sessions can be used
/// concurrently without any coordination.
pub struct Session<T: ProtocolInstantiator> {
    state: SessionState<T>,
}

impl<T: ProtocolInstantiator> Session<T> {
    pub fn new(instantiator: T) -> Self {
        Self {
            state: SessionState::Uninitialized(instantiator),
        }
    }

    /// Returns true once `initialize` succeeded.
    pub fn is_initialized(&self) -> bool {
        matches!(self.state, SessionState::Initialized(_))
    }

    /// The capabilities the backend declared during initialization.
    pub fn backend_capabilities(&self) -> Option<&BackendCapabilities> {
        match &self.state {
            SessionState::Initialized(session) => Some(&session.capabilities),
            SessionState::Uninitialized(_) => None,
        }
    }

    /// Verifies that `method` may be called in the current state.
    ///
    /// `condaMetadata` is refused if the backend explicitly declared
    /// `providesCondaMetadata: false`. An unspecified capability does not
    /// block the call.
    pub fn check_sequence(&self, method: Method) -> Result<(), SequencingError> {
        match (&self.state, method) {
            (SessionState::Uninitialized(_), Method::Initialize) => Ok(()),
            (SessionState::Uninitialized(_), method) => {
                Err(SequencingError::NotInitialized { method })
            }
            (SessionState::Initialized(_), Method::Initialize) => {
                Err(SequencingError::AlreadyInitialized)
            }
            (SessionState::Initialized(session), Method::CondaMetadata) => {
                if session.capabilities.provides_conda_metadata == Some(false) {
                    Err(SequencingError::CapabilityNotProvided {
                        method: Method::CondaMetadata,
                    })
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Handles the `initialize` request.
    ///
    /// If the backend fails the session stays uninitialized, so the frontend
    /// can try again.
    pub async fn initialize(
        &mut self,
        params: InitializeParams,
    ) -> Result<InitializeResult, DispatchError> {
        self.check_sequence(Method::Initialize)?;
        let SessionState::Uninitialized(instantiator) = &self.state else {
            return Err(SequencingError::AlreadyInitialized.into());
        };

        let source_dir = params.source_dir.as_path().to_path_buf();
        let (endpoint, result) = instantiator
            .initialize(params)
            .await
            .map_err(DispatchError::Backend)?;

        tracing::info!(
            source_dir = %source_dir.display(),
            provides_conda_metadata = ?result.capabilities.provides_conda_metadata,
            "session initialized"
        );
        self.state = SessionState::Initialized(InitializedSession {
            endpoint,
            capabilities: result.capabilities.clone(),
        });
        Ok(result)
    }

    /// Handles the `condaMetadata` request.
    pub async fn conda_metadata(
        &self,
        params: CondaMetadataParams,
    ) -> Result<CondaMetadataResult, DispatchError> {
        self.check_sequence(Method::CondaMetadata)?;
        let SessionState::Initialized(session) = &self.state else {
            return Err(SequencingError::NotInitialized {
                method: Method::CondaMetadata,
            }
            .into());
        };

        let result = session
            .endpoint
            .conda_metadata(params)
            .await
            .map_err(DispatchError::Backend)?;
        tracing::debug!(packages = result.packages.len(), "resolved conda metadata");
        Ok(result)
    }

    /// Dispatches an already validated request.
    pub async fn dispatch(&mut self, request: Request) -> Result<Response, DispatchError> {
        match request {
            Request::Initialize(params) => self.initialize(params).await.map(Response::Initialize),
            Request::CondaMetadata(params) => self
                .conda_metadata(params)
                .await
                .map(Response::CondaMetadata),
        }
    }

    /// Handles a raw request as received from a transport.
    ///
    /// The method is resolved first, then the call is checked against the
    /// session state, and only then is the payload validated. No backend
    /// code runs unless all three steps succeed.
    pub async fn handle(&mut self, method: &str, params: &Value) -> Result<Value, DispatchError> {
        tracing::debug!(method, "received request");
        let result = self.handle_inner(method, params).await;
        if let Err(err) = &result {
            tracing::warn!(method, "rejected request: {err}");
        }
        result
    }

    async fn handle_inner(&mut self, method: &str, params: &Value) -> Result<Value, DispatchError> {
        let method = method.parse::<Method>()?;
        self.check_sequence(method)?;
        let request = Request::validate(method, params)?;
        let response = self.dispatch(request).await?;
        response
            .result()
            .map_err(|err| DispatchError::Serialize(method, err))
    }
}
