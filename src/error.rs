//! Errors reported by this library

use thiserror::Error as ThisError;

/// An error raised while building, addressing or accessing a register tree.
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A named component does not exist where it was looked up.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The operation is structurally invalid for the given path(s).
    ///
    /// E.g. an incompatible concatenation, a non-overlapping intersection or a tail range
    /// query on an empty path.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// The transport failed to complete a read or write. Never retried by this library.
    #[error("I/O error: {0}")]
    Io(String),

    /// A description or configuration value is out of range or malformed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The description document could not be read, preprocessed or parsed.
    #[error("Document error: {0}")]
    Document(String),
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Error {
        Error::Document(e.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::Document(e.to_string())
    }
}

impl Error {
    /// Returns true if this is an [`Error::Io`] condition.
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io(_))
    }
}

/// The result of an operation of this library.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_kind() {
        assert_eq!(
            Error::NotFound("foo".into()).to_string(),
            "Not found: foo"
        );
        assert_eq!(
            Error::InvalidPath("/a[3-1]".into()).to_string(),
            "Invalid path: /a[3-1]"
        );
    }

    #[test]
    fn yaml_errors_become_document_errors() {
        let err: Error = serde_yaml::from_str::<serde_yaml::Value>("a: [1, 2")
            .unwrap_err()
            .into();
        assert!(matches!(err, Error::Document(_)));
        assert!(!err.is_io());
    }
}
