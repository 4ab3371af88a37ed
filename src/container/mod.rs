//! Backup container format
//!
//! A container is a self-describing envelope: a clear-text header carrying
//! everything needed to re-derive the key, followed by the AES-GCM sealed
//! payload. Restore needs only the file and the password.

mod codec;
mod header;

pub use codec::{decode, encode, inspect};
pub use header::{ContainerHeader, FORMAT_VERSION, MAGIC, MAX_SALT_SIZE, MIN_SALT_SIZE};
