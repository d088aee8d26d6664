//! The binding between method names and their parameter and result types.

use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{
    procedures::{
        conda_metadata::{self, CondaMetadataParams, CondaMetadataResult},
        initialize::{self, InitializeParams, InitializeResult},
    },
    validation::{Validate, ValidationError},
};

/// The methods of the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    /// Hand-shake that must precede every other request.
    #[serde(rename = "initialize")]
    Initialize,
    /// Query the metadata of the packages in the source directory.
    #[serde(rename = "condaMetadata")]
    CondaMetadata,
}

impl Method {
    /// All methods in the order they are expected in a session.
    pub const ALL: [Method; 2] = [Method::Initialize, Method::CondaMetadata];

    /// The name of the method on the wire.
    pub fn name(self) -> &'static str {
        match self {
            Method::Initialize => initialize::METHOD_NAME,
            Method::CondaMetadata => conda_metadata::METHOD_NAME,
        }
    }

    /// The name of the type of the parameters of this method.
    pub fn params_type(self) -> &'static str {
        match self {
            Method::Initialize => InitializeParams::TYPE_NAME,
            Method::CondaMetadata => CondaMetadataParams::TYPE_NAME,
        }
    }

    /// The name of the type of the result of this method.
    pub fn result_type(self) -> &'static str {
        match self {
            Method::Initialize => InitializeResult::TYPE_NAME,
            Method::CondaMetadata => CondaMetadataResult::TYPE_NAME,
        }
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("unknown method '{0}'")]
#[diagnostic(
    code(build_protocol::unknown_method),
    help("The supported methods are 'initialize' and 'condaMetadata'.")
)]
pub struct UnknownMethod(pub String);

impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .into_iter()
            .find(|method| method.name() == s)
            .ok_or_else(|| UnknownMethod(s.to_owned()))
    }
}

/// An error that occurs when turning a raw request into a [`Request`].
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum RequestError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    UnknownMethod(#[from] UnknownMethod),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Invalid(#[from] ValidationError),
}

/// A validated request: the method together with its typed parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Initialize(InitializeParams),
    CondaMetadata(CondaMetadataParams),
}

impl Request {
    /// Looks up `method` and validates `params` against its parameter type.
    pub fn parse(method: &str, params: &Value) -> Result<Self, RequestError> {
        let method = method.parse::<Method>()?;
        Ok(Self::validate(method, params)?)
    }

    /// Validates `params` against the parameter type of `method`.
    pub fn validate(method: Method, params: &Value) -> Result<Self, ValidationError> {
        Ok(match method {
            Method::Initialize => Request::Initialize(InitializeParams::validate(params)?),
            Method::CondaMetadata => {
                Request::CondaMetadata(CondaMetadataParams::validate(params)?)
            }
        })
    }

    pub fn method(&self) -> Method {
        match self {
            Request::Initialize(_) => Method::Initialize,
            Request::CondaMetadata(_) => Method::CondaMetadata,
        }
    }

    /// Serializes the parameters of the request.
    pub fn params(&self) -> serde_json::Result<Value> {
        match self {
            Request::Initialize(params) => serde_json::to_value(params),
            Request::CondaMetadata(params) => serde_json::to_value(params),
        }
    }
}

/// A validated response: the method together with its typed result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Initialize(InitializeResult),
    CondaMetadata(CondaMetadataResult),
}

impl Response {
    /// Validates `result` against the result type of `method`.
    pub fn validate(method: Method, result: &Value) -> Result<Self, ValidationError> {
        Ok(match method {
            Method::Initialize => Response::Initialize(InitializeResult::validate(result)?),
            Method::CondaMetadata => {
                Response::CondaMetadata(CondaMetadataResult::validate(result)?)
            }
        })
    }

    pub fn method(&self) -> Method {
        match self {
            Response::Initialize(_) => Method::Initialize,
            Response::CondaMetadata(_) => Method::CondaMetadata,
        }
    }

    /// Serializes the result.
    pub fn result(&self) -> serde_json::Result<Value> {
        match self {
            Response::Initialize(result) => serde_json::to_value(result),
            Response::CondaMetadata(result) => serde_json::to_value(result),
        }
    }
}
