use std::{
    borrow::Cow,
    io,
    path::{Path, PathBuf},
};

use miette::Diagnostic;
use schemars::{JsonSchema, Schema, SchemaGenerator, json_schema};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

use crate::validation::{Constraint, FieldErrors, FieldPath, FromWire, expect_str};

/// A path to a directory that existed when the value was constructed.
///
/// The check happens synchronously on construction, the directory is not
/// guaranteed to still exist afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceDir(PathBuf);

#[derive(Debug, Error, Diagnostic)]
pub enum SourceDirError {
    #[error("the source directory '{}' does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("the source path '{}' is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("failed to access the source directory '{}'", .0.display())]
    Inaccessible(PathBuf, #[source] io::Error),
}

impl SourceDirError {
    fn constraint(&self) -> Constraint {
        match self {
            SourceDirError::NotFound(_) => Constraint::PathNotFound,
            SourceDirError::NotADirectory(_) => Constraint::NotADirectory,
            SourceDirError::Inaccessible(_, err) => Constraint::PathInaccessible {
                reason: err.to_string(),
            },
        }
    }
}

impl SourceDir {
    /// Constructs a new instance after verifying that `path` refers to an
    /// existing directory.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, SourceDirError> {
        let path = path.into();
        match fs_err::metadata(&path) {
            Ok(metadata) if metadata.is_dir() => Ok(Self(path)),
            Ok(_) => Err(SourceDirError::NotADirectory(path)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(SourceDirError::NotFound(path))
            }
            Err(err) => Err(SourceDirError::Inaccessible(path, err)),
        }
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

impl AsRef<Path> for SourceDir {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Serialize for SourceDir {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SourceDir {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let path = PathBuf::deserialize(deserializer)?;
        Self::new(path).map_err(serde::de::Error::custom)
    }
}

impl FromWire for SourceDir {
    fn from_wire(value: &Value, path: &FieldPath, errors: &mut FieldErrors) -> Option<Self> {
        let text = expect_str(value, path, errors)?;
        if text.is_empty() {
            errors.push(path, Constraint::NonEmpty, Some(value));
            return None;
        }
        match Self::new(text) {
            Ok(dir) => Some(dir),
            Err(err) => {
                errors.push(path, err.constraint(), Some(value));
                None
            }
        }
    }
}

impl JsonSchema for SourceDir {
    fn schema_name() -> Cow<'static, str> {
        "DirectoryPath".into()
    }

    fn json_schema(_generator: &mut SchemaGenerator) -> Schema {
        json_schema!({
            "type": "string",
            "format": "directory-path",
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let source_dir = SourceDir::new(dir.path()).unwrap();
        assert_eq!(source_dir.as_path(), dir.path());
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");

        let mut errors = FieldErrors::default();
        let path = FieldPath::root().field("sourceDir");
        let value = json!(missing.to_string_lossy());
        assert!(SourceDir::from_wire(&value, &path, &mut errors).is_none());

        let errors = errors.into_vec();
        assert_eq!(errors[0].constraint, Constraint::PathNotFound);
        assert_eq!(errors[0].actual, Some(value));
    }

    #[test]
    fn test_file_is_not_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("recipe.yaml");
        fs_err::write(&file, "").unwrap();

        let err = SourceDir::new(&file).unwrap_err();
        assert!(matches!(err, SourceDirError::NotADirectory(_)));
    }
}
