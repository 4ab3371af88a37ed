//! AES-256-GCM sealing and opening
//!
//! Provides authenticated encryption for the backup payload. Every seal draws
//! a fresh random nonce, and the caller's associated data (the container
//! header) is bound into the authentication tag.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng, Payload},
    Aes256Gcm, Nonce,
};

use crate::error::{ProfilesError, ProfilesResult};

use super::secure_memory::SecureBytes;
use super::DerivedKey;

/// Size of the AES-GCM nonce in bytes (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Size of the AES-GCM authentication tag in bytes
pub const TAG_SIZE: usize = 16;

/// Output of a seal operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedPayload {
    /// The nonce used for this encryption
    pub nonce: [u8; NONCE_SIZE],
    /// Ciphertext with the authentication tag appended
    pub ciphertext: Vec<u8>,
}

/// Encrypt plaintext, binding `associated_data` into the tag
pub fn seal(
    key: &DerivedKey,
    plaintext: &[u8],
    associated_data: &[u8],
) -> ProfilesResult<SealedPayload> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| ProfilesError::Crypto(format!("sealing: failed to create cipher: {}", e)))?;

    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);

    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(&nonce),
            Payload {
                msg: plaintext,
                aad: associated_data,
            },
        )
        .map_err(|e| ProfilesError::Crypto(format!("sealing: {}", e)))?;

    Ok(SealedPayload { nonce, ciphertext })
}

/// Verify and decrypt a sealed payload
///
/// The tag is checked before any plaintext is produced. Every failure maps
/// to `ProfilesError::Authentication`.
pub fn open(
    key: &DerivedKey,
    sealed: &SealedPayload,
    associated_data: &[u8],
) -> ProfilesResult<SecureBytes> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| ProfilesError::Crypto(format!("opening: failed to create cipher: {}", e)))?;

    if sealed.ciphertext.len() < TAG_SIZE {
        return Err(ProfilesError::Authentication);
    }

    let plaintext = cipher
        .decrypt(
            Nonce::from_slice(&sealed.nonce),
            Payload {
                msg: &sealed.ciphertext,
                aad: associated_data,
            },
        )
        .map_err(|_| ProfilesError::Authentication)?;

    Ok(SecureBytes::new(plaintext))
}
