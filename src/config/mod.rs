//! Configuration module for gitprofiles
//!
//! This module provides configuration management including:
//! - Base directory resolution
//! - User settings persistence

pub mod paths;
pub mod settings;

pub use paths::ProfilePaths;
pub use settings::{BackupSettings, Settings};
