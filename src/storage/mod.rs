//! Storage layer for gitprofiles
//!
//! Provides atomic file writes and first-run setup of the base directory.

pub mod file_io;
pub mod init;

pub use file_io::{read_json, temp_path_for, write_bytes_atomic, write_json_atomic};
pub use init::{initialize_storage, needs_initialization};
