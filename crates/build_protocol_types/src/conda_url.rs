use std::{
    borrow::Cow,
    fmt::{Display, Formatter},
    str::FromStr,
};

use schemars::{JsonSchema, Schema, SchemaGenerator, json_schema};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::validation::{Constraint, FieldErrors, FieldPath, FromWire, expect_str};

/// Different types of URLs that can be used to fetch conda packages.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CondaUrl {
    /// A URL that uses the HTTP protocol.
    Http(Url),
    /// A URL that uses the HTTPS protocol.
    Https(Url),
    /// A URL that uses the file protocol.
    File(Url),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidCondaUrl {
    #[error(transparent)]
    Parse(#[from] url::ParseError),

    #[error(
        "unsupported URL scheme '{0}', expected one of {allowed}",
        allowed = CondaUrl::ALLOWED_SCHEMES.join(", ")
    )]
    UnsupportedScheme(String),
}

impl CondaUrl {
    /// The schemes a channel URL may use.
    pub const ALLOWED_SCHEMES: &'static [&'static str] = &["http", "https", "file"];

    /// Returns the underlying URL.
    pub fn as_url(&self) -> &Url {
        match self {
            CondaUrl::Http(url) | CondaUrl::Https(url) | CondaUrl::File(url) => url,
        }
    }

    /// Consumes the value and returns the underlying URL.
    pub fn into_url(self) -> Url {
        match self {
            CondaUrl::Http(url) | CondaUrl::Https(url) | CondaUrl::File(url) => url,
        }
    }

    /// The scheme of the URL, one of [`Self::ALLOWED_SCHEMES`].
    pub fn scheme(&self) -> &str {
        self.as_url().scheme()
    }
}

impl TryFrom<Url> for CondaUrl {
    type Error = InvalidCondaUrl;

    fn try_from(url: Url) -> Result<Self, Self::Error> {
        match url.scheme() {
            "http" => Ok(CondaUrl::Http(url)),
            "https" => Ok(CondaUrl::Https(url)),
            "file" => Ok(CondaUrl::File(url)),
            scheme => Err(InvalidCondaUrl::UnsupportedScheme(scheme.to_owned())),
        }
    }
}

impl FromStr for CondaUrl {
    type Err = InvalidCondaUrl;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(Url::parse(s)?)
    }
}

impl From<CondaUrl> for Url {
    fn from(value: CondaUrl) -> Self {
        value.into_url()
    }
}

impl Display for CondaUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_url().as_str())
    }
}

impl Serialize for CondaUrl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_url().as_str())
    }
}

impl<'de> Deserialize<'de> for CondaUrl {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

impl FromWire for CondaUrl {
    fn from_wire(value: &Value, path: &FieldPath, errors: &mut FieldErrors) -> Option<Self> {
        let text = expect_str(value, path, errors)?;
        let constraint = match text.parse::<CondaUrl>() {
            Ok(url) => return Some(url),
            Err(InvalidCondaUrl::Parse(err)) => Constraint::Url {
                reason: err.to_string(),
            },
            Err(InvalidCondaUrl::UnsupportedScheme(scheme)) => Constraint::UrlScheme {
                scheme,
                allowed: Self::ALLOWED_SCHEMES,
            },
        };
        errors.push(path, constraint, Some(value));
        None
    }
}

impl JsonSchema for CondaUrl {
    fn schema_name() -> Cow<'static, str> {
        "CondaUrl".into()
    }

    fn json_schema(_generator: &mut SchemaGenerator) -> Schema {
        json_schema!({
            "type": "string",
            "format": "uri",
            "minLength": 1,
            "pattern": "^(http|https|file):",
            "description": "A URL with one of the schemes http, https or file",
        })
    }
}
