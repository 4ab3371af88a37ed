//! Container header
//!
//! The header is stored in clear at the front of every backup file. All of
//! its fields except the nonce are fed to the cipher as associated data.

use crate::crypto::KdfParams;
use crate::error::{ProfilesError, ProfilesResult};

/// File signature of every backup container
pub const MAGIC: [u8; 4] = *b"GPBK";

/// Current container format version
pub const FORMAT_VERSION: u8 = 1;

/// Salts shorter than this are refused on decode
pub const MIN_SALT_SIZE: usize = 16;

/// The salt length is stored in a single byte
pub const MAX_SALT_SIZE: usize = u8::MAX as usize;

/// Everything restore needs, besides the password, to reproduce the key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHeader {
    /// Format version
    pub version: u8,
    /// Per-backup random salt
    pub salt: Vec<u8>,
    /// scrypt cost parameters used for this backup
    pub kdf: KdfParams,
}

impl ContainerHeader {
    /// Create a header for the current format version
    ///
    /// The salt must be between `MIN_SALT_SIZE` and `MAX_SALT_SIZE` bytes.
    pub fn new(salt: impl Into<Vec<u8>>, kdf: KdfParams) -> ProfilesResult<Self> {
        let header = Self {
            version: FORMAT_VERSION,
            salt: salt.into(),
            kdf,
        };
        if header.salt.len() < MIN_SALT_SIZE {
            return Err(ProfilesError::Config(format!(
                "salt too short: {} bytes (minimum {})",
                header.salt.len(),
                MIN_SALT_SIZE
            )));
        }
        header.salt_len()?;
        Ok(header)
    }

    /// Serialize the authenticated header fields
    ///
    /// Identical to the on-disk bytes from the magic through `p`.
    pub fn associated_data(&self) -> ProfilesResult<Vec<u8>> {
        let salt_len = self.salt_len()?;

        let mut out = Vec::with_capacity(MAGIC.len() + 2 + self.salt.len() + 12);
        out.extend_from_slice(&MAGIC);
        out.push(self.version);
        out.push(salt_len);
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(&self.kdf.n.to_be_bytes());
        out.extend_from_slice(&self.kdf.r.to_be_bytes());
        out.extend_from_slice(&self.kdf.p.to_be_bytes());
        Ok(out)
    }

    fn salt_len(&self) -> ProfilesResult<u8> {
        u8::try_from(self.salt.len()).map_err(|_| {
            ProfilesError::Config(format!(
                "salt too long: {} bytes (maximum {})",
                self.salt.len(),
                MAX_SALT_SIZE
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_associated_data_layout() {
        let header = ContainerHeader::new(vec![0xAA; 16], KdfParams::new(1024, 8, 1)).unwrap();
        let aad = header.associated_data().unwrap();

        assert_eq!(&aad[..4], b"GPBK");
        assert_eq!(aad[4], FORMAT_VERSION);
        assert_eq!(aad[5], 16);
        assert_eq!(&aad[6..22], &[0xAA; 16]);
        assert_eq!(&aad[22..26], &1024u32.to_be_bytes());
        assert_eq!(&aad[26..30], &8u32.to_be_bytes());
        assert_eq!(&aad[30..34], &1u32.to_be_bytes());
        assert_eq!(aad.len(), 34);
    }

    #[test]
    fn test_associated_data_covers_params() {
        let a = ContainerHeader::new(vec![1; 16], KdfParams::new(1024, 8, 1)).unwrap();
        let b = ContainerHeader::new(vec![1; 16], KdfParams::new(2048, 8, 1)).unwrap();
        assert_ne!(a.associated_data().unwrap(), b.associated_data().unwrap());
    }

    #[test]
    fn test_salt_length_limits() {
        let kdf = KdfParams::new(1024, 8, 1);

        let longest = ContainerHeader::new(vec![7; MAX_SALT_SIZE], kdf).unwrap();
        assert_eq!(longest.associated_data().unwrap()[5], 255);

        assert!(ContainerHeader::new(vec![7; 256], kdf).unwrap_err().is_config());
        assert!(ContainerHeader::new(vec![7; 15], kdf).unwrap_err().is_config());
    }

    #[test]
    fn test_oversized_salt_never_serialized() {
        // 272 bytes would wrap to a stored length of 16
        let mut header = ContainerHeader::new(vec![7; 16], KdfParams::new(1024, 8, 1)).unwrap();
        header.salt = vec![7; 272];
        assert!(header.associated_data().unwrap_err().is_config());
    }
}
