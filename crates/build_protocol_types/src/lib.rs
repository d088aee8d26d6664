//! The types for communicating between a build frontend and a build backend
//! that reports metadata about source packages.
//!
//! Every message can be validated from a raw [`serde_json::Value`] with
//! [`Validate::validate`], which reports all violated constraints at once.
//! The [`serde::Deserialize`] implementations of the messages go through the
//! same validation.

#[deny(missing_docs)]
mod capabilities;
mod conda_package_metadata;
mod conda_url;
mod message;
mod non_empty;
pub mod procedures;
mod schema;
mod source_dir;
pub mod validation;

pub use capabilities::{BackendCapabilities, FrontendCapabilities};
pub use conda_package_metadata::CondaPackageMetadata;
pub use conda_url::{CondaUrl, InvalidCondaUrl};
pub use message::{Method, Request, RequestError, Response, UnknownMethod};
pub use non_empty::{EmptyStringError, NonEmptyString, PackageName, Platform, Version};
pub use schema::protocol_schema;
pub use source_dir::{SourceDir, SourceDirError};
pub use validation::{Validate, ValidationError};
