//! Custom error types for gitprofiles
//!
//! This module defines the error hierarchy for backup, restore and profile
//! directory management using thiserror for ergonomic error definitions.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// The main error type for gitprofiles operations
#[derive(Error, Debug)]
pub enum ProfilesError {
    /// Invalid configuration, such as unusable KDF cost parameters
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem failure, tagged with the phase and the offending path
    #[error("I/O error while {context} ({}): {source}", .path.display())]
    Io {
        context: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The container or the archive inside it is malformed
    #[error("Invalid backup: {0}")]
    Format(String),

    /// Wrong password and tampered payload are reported identically
    #[error("wrong password or corrupted backup")]
    Authentication,

    /// An archive entry would land outside the destination directory
    #[error("Archive entry escapes the destination directory: {path}")]
    PathTraversal { path: String },

    /// A cryptographic primitive failed for a reason other than authentication
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),
}

impl ProfilesError {
    /// Create an I/O error for the given phase and path
    pub fn io(context: impl Into<String>, path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Check if this is the generic authentication failure
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication)
    }

    /// Check if this is a path traversal rejection
    pub fn is_path_traversal(&self) -> bool {
        matches!(self, Self::PathTraversal { .. })
    }

    /// Check if this is a configuration error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Check if this is a format error
    pub fn is_format(&self) -> bool {
        matches!(self, Self::Format(_))
    }
}

impl From<serde_json::Error> for ProfilesError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for gitprofiles operations
pub type ProfilesResult<T> = Result<T, ProfilesError>;
