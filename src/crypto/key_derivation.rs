//! Key derivation using scrypt
//!
//! Derives encryption keys from user passwords using scrypt, a memory-hard
//! key derivation function. The cost parameters travel with every backup so
//! restore can reproduce the key from the password alone.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::OsRng;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{ProfilesError, ProfilesResult};

use super::secure_memory::Password;

/// Length of the derived key in bytes (AES-256)
pub const KEY_SIZE: usize = 32;

/// Length of freshly generated salts in bytes
pub const SALT_SIZE: usize = 16;

/// Largest accepted scrypt parallelization factor
///
/// Derivation time grows linearly with p, and the memory ceiling alone does
/// not bound it.
pub const MAX_P: u32 = 16;

/// Parameters for key derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// CPU/memory cost, must be a power of two greater than one (default: 32768)
    pub n: u32,
    /// Block size (default: 8)
    pub r: u32,
    /// Parallelization factor (default: 1)
    pub p: u32,
    /// Output length, fixed by the cipher
    #[serde(skip, default = "default_key_len")]
    pub key_len: usize,
}

fn default_key_len() -> usize {
    KEY_SIZE
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            n: 1 << 15,
            r: 8,
            p: 1,
            key_len: KEY_SIZE,
        }
    }
}

impl KdfParams {
    /// Create params with specific cost values
    pub fn new(n: u32, r: u32, p: u32) -> Self {
        Self {
            n,
            r,
            p,
            key_len: KEY_SIZE,
        }
    }

    /// Check the parameters without touching any secret or file
    pub fn validate(&self) -> ProfilesResult<()> {
        self.to_scrypt_params().map(|_| ())
    }

    /// log2(N)
    pub fn log_n(&self) -> u8 {
        self.n.trailing_zeros() as u8
    }

    /// Approximate memory needed to derive a key with these parameters, in bytes
    ///
    /// Covers the `128·r·N` scratch table plus the `128·r·p` block buffer.
    pub fn memory_cost(&self) -> u64 {
        let n = u64::from(self.n);
        let p = u64::from(self.p);
        128u64
            .saturating_mul(u64::from(self.r))
            .saturating_mul(n.saturating_add(p))
    }

    fn to_scrypt_params(&self) -> ProfilesResult<scrypt::Params> {
        if self.n < 2 || !self.n.is_power_of_two() {
            return Err(ProfilesError::Config(format!(
                "scrypt N must be a power of two greater than 1, got {}",
                self.n
            )));
        }
        if self.r == 0 || self.p == 0 {
            return Err(ProfilesError::Config(format!(
                "scrypt r and p must be positive, got r={} p={}",
                self.r, self.p
            )));
        }
        if self.p > MAX_P {
            return Err(ProfilesError::Config(format!(
                "scrypt p must be at most {}, got {}",
                MAX_P, self.p
            )));
        }
        if self.key_len != KEY_SIZE {
            return Err(ProfilesError::Config(format!(
                "derived key length must be {} bytes, got {}",
                KEY_SIZE, self.key_len
            )));
        }

        scrypt::Params::new(self.log_n(), self.r, self.p, self.key_len)
            .map_err(|e| ProfilesError::Config(format!("Invalid scrypt parameters: {}", e)))
    }
}

/// A derived encryption key, zeroed on drop
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: [u8; KEY_SIZE],
}

impl DerivedKey {
    /// Get the key bytes
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Generate a fresh random salt from the OS CSPRNG
pub fn generate_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Derive an encryption key from a password
pub fn derive_key(
    password: &Password,
    salt: &[u8],
    params: &KdfParams,
) -> ProfilesResult<DerivedKey> {
    let scrypt_params = params.to_scrypt_params()?;

    let mut key = DerivedKey {
        key: [0u8; KEY_SIZE],
    };
    scrypt::scrypt(password.as_bytes(), salt, &scrypt_params, &mut key.key)
        .map_err(|e| ProfilesError::Crypto(format!("deriving key: {}", e)))?;

    Ok(key)
}
