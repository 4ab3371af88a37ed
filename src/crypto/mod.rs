//! Cryptographic functions for gitprofiles
//!
//! Provides scrypt key derivation, AES-256-GCM sealing, and zeroize-on-drop
//! containers for passwords and decrypted data.

pub mod encryption;
pub mod key_derivation;
pub mod secure_memory;

pub use encryption::{open, seal, SealedPayload, NONCE_SIZE, TAG_SIZE};
pub use key_derivation::{
    derive_key, generate_salt, DerivedKey, KdfParams, KEY_SIZE, MAX_P, SALT_SIZE,
};
pub use secure_memory::{Password, SecureBytes};
