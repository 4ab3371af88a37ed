//! Audit entry data structures
//!
//! One entry per backup or restore attempt run from the command line.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Types of operations that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// A container was written
    Backup,
    /// A container was restored
    Restore,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Backup => write!(f, "BACKUP"),
            Operation::Restore => write!(f, "RESTORE"),
        }
    }
}

/// How an audited operation ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    /// Completed, with the number of files archived or restored
    Success { files: usize },
    /// Failed with the given error message
    Failure { error: String },
}

/// A single audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the operation occurred (UTC)
    pub timestamp: DateTime<Utc>,

    /// Type of operation performed
    pub operation: Operation,

    /// Container written or read
    pub container: PathBuf,

    /// Source directory for a backup, destination for a restore
    pub directory: PathBuf,

    /// Result of the operation
    pub outcome: Outcome,
}

impl AuditEntry {
    /// Create a new audit entry stamped with the current time
    pub fn new(
        operation: Operation,
        container: impl AsRef<Path>,
        directory: impl AsRef<Path>,
        outcome: Outcome,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            operation,
            container: container.as_ref().to_path_buf(),
            directory: directory.as_ref().to_path_buf(),
            outcome,
        }
    }

    /// Check if the operation succeeded
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success { .. })
    }

    /// Format the entry for human-readable output
    pub fn format_human_readable(&self) -> String {
        let (arrow_from, arrow_to) = match self.operation {
            Operation::Backup => (&self.directory, &self.container),
            Operation::Restore => (&self.container, &self.directory),
        };

        let mut output = format!(
            "[{}] {} {} -> {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.operation,
            arrow_from.display(),
            arrow_to.display()
        );

        match &self.outcome {
            Outcome::Success { files } => output.push_str(&format!(" ({} files)", files)),
            Outcome::Failure { error } => output.push_str(&format!("\n  Failed: {}", error)),
        }

        output
    }
}
