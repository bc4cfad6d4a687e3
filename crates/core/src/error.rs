//! Error types for Tabula.
//!
//! This module defines a unified error enum covering the editor's recoverable
//! conditions (unknown files, bad column or tab indices, duplicate names) and
//! the ambient categories (configuration, I/O, LLM, templates).

use thiserror::Error;

/// Unified error type for Tabula.
///
/// Every variant is recoverable; callers surface it to the user and let them
/// correct the input. Parsing and parameter resolution never produce errors.
#[derive(Error, Debug)]
pub enum AppError {
    /// A file name that is not tracked by the workspace
    #[error("File not found: {0}")]
    NotFound(String),

    /// A column or tab index outside the current layout
    #[error("{kind} index {index} out of range (len {len})")]
    IndexOutOfRange {
        kind: &'static str,
        index: usize,
        len: usize,
    },

    /// A file name that already exists in the workspace
    #[error("File already exists: {0}")]
    DuplicateName(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LLM provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Template rendering errors
    #[error("Template error: {0}")]
    Template(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Shorthand for a column index error.
    pub fn column_out_of_range(index: usize, len: usize) -> Self {
        AppError::IndexOutOfRange {
            kind: "Column",
            index,
            len,
        }
    }

    /// Shorthand for a tab index error.
    pub fn tab_out_of_range(index: usize, len: usize) -> Self {
        AppError::IndexOutOfRange {
            kind: "Tab",
            index,
            len,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_error_message() {
        let err = AppError::column_out_of_range(3, 2);
        assert_eq!(err.to_string(), "Column index 3 out of range (len 2)");

        let err = AppError::tab_out_of_range(0, 0);
        assert_eq!(err.to_string(), "Tab index 0 out of range (len 0)");
    }

    #[test]
    fn test_yaml_error_conversion() {
        let err: AppError = serde_yaml::from_str::<Vec<u32>>("{ not: [a list")
            .unwrap_err()
            .into();
        assert!(matches!(err, AppError::Serialization(_)));
    }
}
