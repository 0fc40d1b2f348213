//! Error types for archive build runs.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for build operations.
pub type BuildResult<T> = Result<T, BuildError>;

/// Error classification, used for exit codes and log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Manifest, config or template selection is wrong. Nothing was written.
    Configuration,
    /// Filesystem failure while reading sources or writing outputs.
    Io,
    /// The tar/gzip writer failed for a template.
    Archive,
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Errors that can occur during a build run.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The source root does not exist or is not a directory.
    #[error("source root not found: {}", path.display())]
    MissingSourceRoot { path: PathBuf },

    /// A selected template id has no directory under the source root.
    #[error("template '{id}' not found: {} does not exist", path.display())]
    MissingTemplate { id: String, path: PathBuf },

    /// A selected template id exists but is not a directory.
    #[error("template '{id}' is not a directory: {}", path.display())]
    NotADirectory { id: String, path: PathBuf },

    /// Template id is empty or is not a single plain path component.
    #[error("invalid template id '{id}': {reason}")]
    InvalidId { id: String, reason: String },

    /// The same id was listed twice.
    #[error("duplicate template id '{id}'")]
    DuplicateId { id: String },

    /// Manifest could not be read or parsed.
    #[error("invalid manifest {}: {reason}", path.display())]
    Manifest { path: PathBuf, reason: String },

    /// Build configuration is invalid.
    #[error("invalid config: {reason}")]
    Config { reason: String },

    /// A source path is not valid UTF-8 and cannot be stored portably.
    #[error("template '{id}': path is not valid UTF-8: {}", path.display())]
    InvalidPath { id: String, path: PathBuf },

    /// Filesystem failure.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The archive writer failed.
    #[error("failed to write archive for template '{id}': {source}")]
    Archive {
        id: String,
        #[source]
        source: std::io::Error,
    },
}

impl BuildError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::MissingSourceRoot { .. }
            | Self::MissingTemplate { .. }
            | Self::NotADirectory { .. }
            | Self::InvalidId { .. }
            | Self::DuplicateId { .. }
            | Self::Manifest { .. }
            | Self::Config { .. }
            | Self::InvalidPath { .. } => ErrorClass::Configuration,
            Self::Io { .. } => ErrorClass::Io,
            Self::Archive { .. } => ErrorClass::Archive,
        }
    }

    /// Template id this error is about, if any.
    pub fn template_id(&self) -> Option<&str> {
        match self {
            Self::MissingTemplate { id, .. }
            | Self::NotADirectory { id, .. }
            | Self::InvalidId { id, .. }
            | Self::DuplicateId { id }
            | Self::InvalidPath { id, .. }
            | Self::Archive { id, .. } => Some(id),
            _ => None,
        }
    }

    pub fn is_configuration(&self) -> bool {
        self.class() == ErrorClass::Configuration
    }

    /// Suggested exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self.class() {
            ErrorClass::Configuration => 2,
            ErrorClass::Io | ErrorClass::Archive => 1,
        }
    }
}
