//! Error taxonomy for the packaging pipeline
//!
//! Every failure is fatal. The variants only differ in what they tell the
//! user: a bad `distpack.toml`, an unreadable input, a package that would not
//! work once published, or a filesystem write that failed.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, PackError>;

/// Errors raised by the build and packaging steps
#[derive(Debug, Error)]
pub enum PackError {
    /// Missing or invalid configuration, detected before any work starts
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An input file is missing, unreadable or cannot be compiled
    #[error("input error in {}: {reason}", path.display())]
    Input { path: PathBuf, reason: String },

    /// The produced package would be broken (missing field, dangling file reference)
    #[error("integrity error: {0}")]
    Integrity(String),

    /// Writing to the output directory failed
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PackError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn input(path: impl AsRef<Path>, reason: impl ToString) -> Self {
        Self::Input {
            path: path.as_ref().to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity(message.into())
    }

    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Short category name, printed in front of the CLI error line
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "ConfigurationError",
            Self::Input { .. } => "InputError",
            Self::Integrity(_) => "IntegrityError",
            Self::Io { .. } => "IOError",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_path() {
        let err = PackError::input("src/index.ts", "file not found");
        assert_eq!(err.to_string(), "input error in src/index.ts: file not found");
        assert_eq!(err.kind(), "InputError");

        let err = PackError::io(
            "dist/lib/lib.es.js",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("dist/lib/lib.es.js"));
        assert_eq!(err.kind(), "IOError");
    }
}
