//! Error types for documentation tree building and navigation.

use crate::navigator::PathNotFound;
use crate::section::SectionIndex;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our custom error.
pub type Result<T> = std::result::Result<T, DocTreeError>;

/// Errors that can occur while building, loading or navigating a doc tree.
#[derive(Error, Debug)]
pub enum DocTreeError {
    /// Error reading or writing files.
    #[error("I/O error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error during serialization/deserialization.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The section directory does not exist or is not a directory.
    #[error("Input path '{0}' does not exist or is not a directory")]
    InvalidInputDir(PathBuf),

    /// A persisted artifact is missing.
    #[error("Documentation artifact not found at '{0}'")]
    ArtifactNotFound(PathBuf),

    /// A persisted artifact exists but could not be decoded.
    #[error("Invalid documentation artifact at '{path}': {reason}")]
    InvalidArtifact { path: PathBuf, reason: String },

    /// Two section files resolved to the same dotted index.
    #[error("Index collision at {index}: '{incoming}' conflicts with '{existing}'")]
    IndexCollision {
        index: SectionIndex,
        existing: PathBuf,
        incoming: PathBuf,
    },

    /// A dotted section index could not be parsed.
    #[error("Invalid section index '{0}'")]
    InvalidSectionIndex(String),

    /// The outline file is malformed.
    #[error("Outline error: {0}")]
    Outline(String),

    /// An address did not resolve against the tree.
    #[error(transparent)]
    PathNotFound(#[from] PathNotFound),

    /// Configuration file error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// No parsed documentation was found for a repository.
    #[error("No parsed documentation (docs_tree.json) found under '{0}'")]
    NoDocsSource(PathBuf),
}

impl DocTreeError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid-artifact error with path context.
    pub fn invalid_artifact(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::InvalidArtifact {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<serde_json::Error> for DocTreeError {
    fn from(err: serde_json::Error) -> Self {
        DocTreeError::Serialization(err.to_string())
    }
}
