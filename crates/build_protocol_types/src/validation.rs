//! Field-level validation of raw wire payloads.
//!
//! Every message in the protocol is constructed from a [`serde_json::Value`]
//! through [`FromWire`]. Instead of stopping at the first problem, the
//! implementations walk the whole payload and record every violated
//! constraint in a [`FieldErrors`] collection. A message is only produced
//! when no violations were recorded, see [`Validate::validate`].
//!
//! The building blocks are small and reusable: [`ObjectReader`] reads
//! required and optional fields of an object, and the leaf types
//! ([`crate::NonEmptyString`], [`crate::CondaUrl`], [`crate::SourceDir`], `u64`,
//! `bool`) each check their own constraint.

use std::{
    borrow::Cow,
    fmt::{self, Display, Formatter},
};

use miette::Diagnostic;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

/// A single step in the path from the root of a message to one of its
/// fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A named field of an object.
    Field(Cow<'static, str>),
    /// An element of a sequence.
    Index(usize),
}

/// The location of a field inside a message, e.g. `packages[0].name`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    /// The path that refers to the message itself.
    pub fn root() -> Self {
        Self::default()
    }

    /// Returns a new path that points to the field `name` below this path.
    pub fn field(&self, name: impl Into<Cow<'static, str>>) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Field(name.into()));
        Self(segments)
    }

    /// Returns a new path that points to the element at `index` below this
    /// path.
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    /// The individual segments of the path.
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Returns true if this path refers to the message itself.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str("<root>");
        }
        for (idx, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if idx == 0 => write!(f, "{name}")?,
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The JSON type a field is expected to have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    Object,
    Array,
    String,
    Boolean,
    Integer,
}

impl Display for JsonType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JsonType::Object => "an object",
            JsonType::Array => "an array",
            JsonType::String => "a string",
            JsonType::Boolean => "a boolean",
            JsonType::Integer => "an integer",
        })
    }
}

/// A constraint that a field violated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Constraint {
    /// The field is required but was absent or `null`.
    Required,

    /// The field has the wrong JSON type.
    #[serde(rename_all = "camelCase")]
    Type { expected: JsonType },

    /// The string must contain at least one character.
    NonEmpty,

    /// The integer must not be negative.
    NonNegative,

    /// The string could not be parsed as a URL.
    #[serde(rename_all = "camelCase")]
    Url { reason: String },

    /// The URL uses a scheme that is not allowed.
    #[serde(rename_all = "camelCase")]
    UrlScheme {
        scheme: String,
        allowed: &'static [&'static str],
    },

    /// The path does not exist.
    PathNotFound,

    /// The path exists but is not a directory.
    NotADirectory,

    /// The path could not be inspected.
    #[serde(rename_all = "camelCase")]
    PathInaccessible { reason: String },
}

impl Display for Constraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Required => f.write_str("field is required"),
            Constraint::Type { expected } => write!(f, "expected {expected}"),
            Constraint::NonEmpty => f.write_str("must not be empty"),
            Constraint::NonNegative => f.write_str("must be a non-negative integer"),
            Constraint::Url { reason } => write!(f, "invalid URL ({reason})"),
            Constraint::UrlScheme { scheme, allowed } => write!(
                f,
                "URL scheme '{scheme}' is not allowed, expected one of {}",
                allowed.join(", ")
            ),
            Constraint::PathNotFound => f.write_str("directory does not exist"),
            Constraint::NotADirectory => f.write_str("path is not a directory"),
            Constraint::PathInaccessible { reason } => {
                write!(f, "path is not accessible ({reason})")
            }
        }
    }
}

/// A single violated constraint at a specific location in a message.
#[derive(Debug, Clone, PartialEq, Error, Diagnostic, Serialize)]
#[error("{path}: {constraint}{}", render_actual(.actual))]
pub struct FieldError {
    /// The location of the offending field.
    pub path: FieldPath,

    /// The constraint that was violated.
    pub constraint: Constraint,

    /// The offending value. `None` if the field was absent. Objects and
    /// arrays are replaced by a short placeholder to keep diagnostics small.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<Value>,
}

fn render_actual(actual: &Option<Value>) -> String {
    match actual {
        Some(value) => format!(" (got {value})"),
        None => String::new(),
    }
}

/// Replaces composite values by a placeholder.
fn summarize(value: &Value) -> Value {
    match value {
        Value::Object(_) => Value::String(String::from("<object>")),
        Value::Array(items) => Value::String(format!("<array of {}>", items.len())),
        scalar => scalar.clone(),
    }
}

/// Accumulates the [`FieldError`]s found while walking a payload.
#[derive(Debug, Default)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    /// Records that the field at `path` violates `constraint`.
    pub fn push(&mut self, path: &FieldPath, constraint: Constraint, actual: Option<&Value>) {
        self.0.push(FieldError {
            path: path.clone(),
            constraint,
            actual: actual.map(summarize),
        });
    }

    /// Returns true if no violation was recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The number of recorded violations.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the violations in the order they were recorded.
    pub fn into_vec(self) -> Vec<FieldError> {
        self.0
    }
}

/// The error returned when a payload is not a valid instance of a message
/// type.
#[derive(Debug, Clone, PartialEq, Error, Diagnostic, Serialize)]
#[error("invalid {message}: {}", render_errors(.errors))]
#[diagnostic(
    code(build_protocol::invalid_message),
    help("The payload does not match the schema of the message.")
)]
pub struct ValidationError {
    /// The name of the message type that failed to validate.
    pub message: &'static str,

    /// All violations found in the payload, in the order they were found.
    #[related]
    pub errors: Vec<FieldError>,
}

fn render_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    /// Returns the first error recorded for the given path, if any.
    pub fn error_at(&self, path: &str) -> Option<&FieldError> {
        self.errors
            .iter()
            .find(|error| error.path.to_string() == path)
    }
}

/// A type that can be constructed from a raw wire value.
pub trait FromWire: Sized {
    /// Constructs `Self` from `value`, recording every violation in `errors`.
    ///
    /// Returns `None` if `value` could not be turned into `Self`, in which
    /// case at least one error has been recorded.
    fn from_wire(value: &Value, path: &FieldPath, errors: &mut FieldErrors) -> Option<Self>;
}

/// A named type that can be validated as a whole.
pub trait Validate: FromWire {
    /// The name used in diagnostics.
    const TYPE_NAME: &'static str;

    /// Validates `value` and either returns a complete value or all
    /// violations. A partially valid payload never produces a value.
    fn validate(value: &Value) -> Result<Self, ValidationError> {
        let mut errors = FieldErrors::default();
        let parsed = Self::from_wire(value, &FieldPath::root(), &mut errors);
        match parsed {
            Some(parsed) if errors.is_empty() => Ok(parsed),
            _ => Err(ValidationError {
                message: Self::TYPE_NAME,
                errors: errors.into_vec(),
            }),
        }
    }
}

/// Reads the fields of a JSON object. Unknown fields are ignored.
pub struct ObjectReader<'a> {
    object: &'a Map<String, Value>,
    path: &'a FieldPath,
    errors: &'a mut FieldErrors,
}

impl<'a> ObjectReader<'a> {
    /// Returns a reader for `value`, or records a type error if `value` is not
    /// an object.
    pub fn new(value: &'a Value, path: &'a FieldPath, errors: &'a mut FieldErrors) -> Option<Self> {
        let Some(object) = value.as_object() else {
            errors.push(
                path,
                Constraint::Type {
                    expected: JsonType::Object,
                },
                Some(value),
            );
            return None;
        };
        Some(Self {
            object,
            path,
            errors,
        })
    }

    /// Reads a field that must be present and not `null`.
    pub fn required<T: FromWire>(&mut self, name: &'static str) -> Option<T> {
        let path = self.path.field(name);
        match self.object.get(name) {
            None => {
                self.errors.push(&path, Constraint::Required, None);
                None
            }
            Some(Value::Null) => {
                self.errors
                    .push(&path, Constraint::Required, Some(&Value::Null));
                None
            }
            Some(value) => T::from_wire(value, &path, self.errors),
        }
    }

    /// Reads a field that may be absent. An explicit `null` is treated as
    /// absent.
    ///
    /// The outer `Option` is `None` if the field is present but invalid.
    pub fn optional<T: FromWire>(&mut self, name: &'static str) -> Option<Option<T>> {
        let path = self.path.field(name);
        match self.object.get(name) {
            None | Some(Value::Null) => Some(None),
            Some(value) => T::from_wire(value, &path, self.errors).map(Some),
        }
    }

    /// Reads a field that falls back to `T::default()` when absent.
    pub fn or_default<T: FromWire + Default>(&mut self, name: &'static str) -> Option<T> {
        self.optional(name).map(Option::unwrap_or_default)
    }
}

impl FromWire for bool {
    fn from_wire(value: &Value, path: &FieldPath, errors: &mut FieldErrors) -> Option<Self> {
        match value {
            Value::Bool(value) => Some(*value),
            other => {
                errors.push(
                    path,
                    Constraint::Type {
                        expected: JsonType::Boolean,
                    },
                    Some(other),
                );
                None
            }
        }
    }
}

impl FromWire for u64 {
    fn from_wire(value: &Value, path: &FieldPath, errors: &mut FieldErrors) -> Option<Self> {
        let constraint = match value {
            Value::Number(number) => {
                if let Some(value) = number.as_u64() {
                    return Some(value);
                } else if number.as_i64().is_some()
                    || number.as_f64().is_some_and(|value| value < 0.0)
                {
                    Constraint::NonNegative
                } else {
                    Constraint::Type {
                        expected: JsonType::Integer,
                    }
                }
            }
            _ => Constraint::Type {
                expected: JsonType::Integer,
            },
        };
        errors.push(path, constraint, Some(value));
        None
    }
}

impl<T: FromWire> FromWire for Vec<T> {
    fn from_wire(value: &Value, path: &FieldPath, errors: &mut FieldErrors) -> Option<Self> {
        let Some(items) = value.as_array() else {
            errors.push(
                path,
                Constraint::Type {
                    expected: JsonType::Array,
                },
                Some(value),
            );
            return None;
        };

        // Visit every element so that all violations are reported.
        let parsed: Vec<Option<T>> = items
            .iter()
            .enumerate()
            .map(|(index, item)| T::from_wire(item, &path.index(index), errors))
            .collect();
        parsed.into_iter().collect()
    }
}

/// Reads a JSON string, recording a type error otherwise.
pub(crate) fn expect_str<'v>(
    value: &'v Value,
    path: &FieldPath,
    errors: &mut FieldErrors,
) -> Option<&'v str> {
    match value.as_str() {
        Some(value) => Some(value),
        None => {
            errors.push(
                path,
                Constraint::Type {
                    expected: JsonType::String,
                },
                Some(value),
            );
            None
        }
    }
}

/// Implements [`serde::Deserialize`] for types that implement [`Validate`] so
/// that deserializing always applies the same rules as the message catalog.
macro_rules! deserialize_via_validate {
    ($($ty:ty),* $(,)?) => {
        $(
            impl<'de> ::serde::Deserialize<'de> for $ty {
                fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
                where
                    D: ::serde::Deserializer<'de>,
                {
                    let value =
                        <::serde_json::Value as ::serde::Deserialize>::deserialize(deserializer)?;
                    <$ty as $crate::validation::Validate>::validate(&value)
                        .map_err(::serde::de::Error::custom)
                }
            }
        )*
    };
}

pub(crate) use deserialize_via_validate;
