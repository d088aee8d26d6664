use std::{
    borrow::{Borrow, Cow},
    fmt::{Display, Formatter},
    ops::Deref,
    str::FromStr,
};

use schemars::{JsonSchema, Schema, SchemaGenerator, json_schema};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::validation::{Constraint, FieldErrors, FieldPath, FromWire, expect_str};

/// A string that contains at least one character.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct NonEmptyString(String);

/// The target platform of a package, e.g. `linux-64` or `noarch`.
pub type Platform = NonEmptyString;

/// The name of a package. No naming convention is enforced.
pub type PackageName = NonEmptyString;

/// The version of a package. No versioning scheme is enforced.
pub type Version = NonEmptyString;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("the string must not be empty")]
pub struct EmptyStringError;

impl NonEmptyString {
    /// Constructs a new instance, failing if `value` is empty.
    pub fn new(value: impl Into<String>) -> Result<Self, EmptyStringError> {
        let value = value.into();
        if value.is_empty() {
            return Err(EmptyStringError);
        }
        Ok(Self(value))
    }

    /// Returns the string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the value and returns the owned string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for NonEmptyString {
    type Error = EmptyStringError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl FromStr for NonEmptyString {
    type Err = EmptyStringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Deref for NonEmptyString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for NonEmptyString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NonEmptyString {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for NonEmptyString {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for NonEmptyString {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Display for NonEmptyString {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

impl FromWire for NonEmptyString {
    fn from_wire(value: &Value, path: &FieldPath, errors: &mut FieldErrors) -> Option<Self> {
        let text = expect_str(value, path, errors)?;
        match Self::new(text) {
            Ok(value) => Some(value),
            Err(EmptyStringError) => {
                errors.push(path, Constraint::NonEmpty, Some(value));
                None
            }
        }
    }
}

impl JsonSchema for NonEmptyString {
    fn schema_name() -> Cow<'static, str> {
        "NonEmptyStr".into()
    }

    fn json_schema(_generator: &mut SchemaGenerator) -> Schema {
        json_schema!({
            "type": "string",
            "minLength": 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case("a")]
    #[case("linux-64")]
    #[case(" ")]
    fn test_accepts_non_empty(#[case] input: &str) {
        let mut errors = FieldErrors::default();
        let parsed = NonEmptyString::from_wire(&json!(input), &FieldPath::root(), &mut errors);
        assert_eq!(parsed.as_deref(), Some(input));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_rejects_empty_distinctly_from_wrong_type() {
        let mut errors = FieldErrors::default();
        assert!(NonEmptyString::from_wire(&json!(""), &FieldPath::root(), &mut errors).is_none());
        assert!(NonEmptyString::from_wire(&json!(1), &FieldPath::root(), &mut errors).is_none());

        let constraints: Vec<_> = errors
            .into_vec()
            .into_iter()
            .map(|error| error.constraint)
            .collect();
        assert_eq!(constraints[0], Constraint::NonEmpty);
        assert!(matches!(constraints[1], Constraint::Type { .. }));
    }

    #[test]
    fn test_serde() {
        let value: NonEmptyString = serde_json::from_value(json!("foo")).unwrap();
        assert_eq!(value, "foo");
        assert_eq!(serde_json::to_value(&value).unwrap(), json!("foo"));
        assert!(serde_json::from_value::<NonEmptyString>(json!("")).is_err());
    }
}
