//! Audit logging for gitprofiles
//!
//! Records every backup and restore run from the command line in an
//! append-only audit log.
//!
//! # Architecture
//!
//! - `AuditEntry`: timestamp, operation, container, directory and outcome
//! - `AuditLogger`: writes entries to the audit log file using a
//!   line-delimited JSON format (JSONL)
//!
//! # Example
//!
//! ```rust,ignore
//! use gitprofiles::audit::{AuditEntry, AuditLogger, Operation, Outcome};
//!
//! let logger = AuditLogger::new(paths.audit_log());
//! let entry = AuditEntry::new(
//!     Operation::Backup,
//!     &report.path,
//!     paths.base_dir(),
//!     Outcome::Success { files: report.entries },
//! );
//! logger.log(&entry)?;
//! ```

mod entry;
mod logger;

pub use entry::{AuditEntry, Operation, Outcome};
pub use logger::AuditLogger;
