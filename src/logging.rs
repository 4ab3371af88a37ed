//! Diagnostic logging setup
//!
//! Library code emits `tracing` events; the binary installs a subscriber
//! writing to stderr so stdout stays free for command output.

use tracing_subscriber::EnvFilter;

use crate::error::{ProfilesError, ProfilesResult};

/// Install the global subscriber
///
/// `RUST_LOG` takes precedence over the `verbose` flag when set.
pub fn init_logging(verbose: bool) -> ProfilesResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("gitprofiles=debug")
        } else {
            EnvFilter::new("gitprofiles=info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| ProfilesError::Config(format!("Failed to initialize logging: {}", e)))
}
