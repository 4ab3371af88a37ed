//! Binary encoding of backup containers
//!
//! Layout, no padding, integers big-endian:
//!
//! ```text
//! magic "GPBK" (4) | version (1) | salt_len (1) | salt | N (4) | r (4) | p (4)
//! | nonce (12) | ciphertext || tag
//! ```

use std::fs;
use std::path::Path;

use crate::crypto::{KdfParams, SealedPayload, NONCE_SIZE, TAG_SIZE};
use crate::error::{ProfilesError, ProfilesResult};

use super::header::{ContainerHeader, FORMAT_VERSION, MAGIC, MIN_SALT_SIZE};

/// Encode a header and sealed payload into container bytes
pub fn encode(header: &ContainerHeader, sealed: &SealedPayload) -> ProfilesResult<Vec<u8>> {
    let mut out = header.associated_data()?;
    out.reserve(NONCE_SIZE + sealed.ciphertext.len());
    out.extend_from_slice(&sealed.nonce);
    out.extend_from_slice(&sealed.ciphertext);
    Ok(out)
}

/// Decode container bytes into a header and sealed payload
///
/// Fails with `ProfilesError::Format` on a wrong magic, an unsupported
/// version, a truncated header or stored parameters that could never have
/// been written by `encode`.
pub fn decode(bytes: &[u8]) -> ProfilesResult<(ContainerHeader, SealedPayload)> {
    let mut reader = Reader::new(bytes);

    if reader.take(MAGIC.len(), "magic")? != MAGIC {
        return Err(ProfilesError::Format(
            "not a gitprofiles backup (magic mismatch)".to_string(),
        ));
    }

    let version = reader.u8("version")?;
    if version != FORMAT_VERSION {
        return Err(ProfilesError::Format(format!(
            "unsupported container version {} (expected {})",
            version, FORMAT_VERSION
        )));
    }

    let salt_len = reader.u8("salt length")? as usize;
    if salt_len < MIN_SALT_SIZE {
        return Err(ProfilesError::Format(format!(
            "salt too short: {} bytes (minimum {})",
            salt_len, MIN_SALT_SIZE
        )));
    }
    let salt = reader.take(salt_len, "salt")?.to_vec();

    let kdf = KdfParams::new(
        reader.u32("scrypt N")?,
        reader.u32("scrypt r")?,
        reader.u32("scrypt p")?,
    );
    kdf.validate()
        .map_err(|e| ProfilesError::Format(format!("stored key derivation parameters: {}", e)))?;

    let mut nonce = [0u8; NONCE_SIZE];
    nonce.copy_from_slice(reader.take(NONCE_SIZE, "nonce")?);

    let ciphertext = reader.rest();
    if ciphertext.len() < TAG_SIZE {
        return Err(ProfilesError::Format(format!(
            "truncated payload: {} bytes, shorter than the {}-byte tag",
            ciphertext.len(),
            TAG_SIZE
        )));
    }

    Ok((
        ContainerHeader { version, salt, kdf },
        SealedPayload {
            nonce,
            ciphertext: ciphertext.to_vec(),
        },
    ))
}

/// Read a container file and return its header without decrypting anything
pub fn inspect(path: &Path) -> ProfilesResult<(ContainerHeader, u64)> {
    let bytes = fs::read(path).map_err(|e| ProfilesError::io("reading container", path, e))?;
    let (header, _) = decode(&bytes)?;
    Ok((header, bytes.len() as u64))
}

/// Bounds-checked cursor over the container bytes
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, len: usize, field: &str) -> ProfilesResult<&'a [u8]> {
        let end = self.pos.checked_add(len).filter(|end| *end <= self.buf.len());
        match end {
            Some(end) => {
                let slice = &self.buf[self.pos..end];
                self.pos = end;
                Ok(slice)
            }
            None => Err(ProfilesError::Format(format!(
                "truncated header: missing {} at offset {}",
                field, self.pos
            ))),
        }
    }

    fn u8(&mut self, field: &str) -> ProfilesResult<u8> {
        Ok(self.take(1, field)?[0])
    }

    fn u32(&mut self, field: &str) -> ProfilesResult<u32> {
        let bytes = self.take(4, field)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn rest(&mut self) -> &'a [u8] {
        let rest = &self.buf[self.pos..];
        self.pos = self.buf.len();
        rest
    }
}
