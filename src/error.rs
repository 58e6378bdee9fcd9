//! Error types for schema translation and loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors during schema translation.
#[derive(Debug, Error)]
pub enum TranslateError {
    // Input errors
    #[error("no schema was passed")]
    InvalidInput,

    #[error("value at {path} does not appear to be a schema: got {actual}")]
    NotASchema { path: String, actual: String },

    #[error("invalid schema description at {path}: {message}")]
    InvalidDescription { path: String, message: String },

    // Schema errors
    #[error("{kind} is not a recognized schema type (at {path})")]
    UnknownKind { kind: String, path: String },

    #[error("{container} schema at {path} does not define a schema at index {index}")]
    MissingIndexedSchema {
        container: &'static str,
        index: usize,
        path: String,
    },

    #[error("override schema at {path} requests another override; only one level is allowed")]
    NestedOverrideNotAllowed { path: String },

    #[error("definition {collection}/{name} is claimed by two different schemas")]
    DuplicateDefinitionConflict { collection: String, name: String },

    #[error("schema nesting exceeds the limit of {limit} levels at {path}")]
    RecursionLimit { limit: usize, path: String },
}

impl TranslateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

/// Errors while loading schema descriptions or component files.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Translate(#[from] TranslateError),
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            LoadError::InvalidJson { .. } => 2,
            LoadError::Translate(e) => e.exit_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_exit_codes() {
        let err = LoadError::FileNotFound {
            path: PathBuf::from("schema.json"),
        };
        assert_eq!(err.exit_code(), 3);

        let err = LoadError::Translate(TranslateError::InvalidInput);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn translate_error_exit_codes() {
        let err = TranslateError::UnknownKind {
            kind: "money".into(),
            path: "#".into(),
        };
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn missing_index_display() {
        let err = TranslateError::MissingIndexedSchema {
            container: "array",
            index: 3,
            path: "#/properties/tags".into(),
        };
        assert_eq!(
            err.to_string(),
            "array schema at #/properties/tags does not define a schema at index 3"
        );
    }
}
