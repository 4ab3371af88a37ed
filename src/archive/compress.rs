//! Gzip compression of archive streams

use std::io::Write;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::crypto::SecureBytes;
use crate::error::{ProfilesError, ProfilesResult};

/// Highest gzip level accepted by `compress`
pub const MAX_COMPRESSION_LEVEL: u32 = 9;

/// Best ratio deflate can reach, used to bound the size hint of a gzip trailer
const MAX_DEFLATE_RATIO: usize = 1032;

/// Upper bound on gzip output for `len` input bytes
///
/// Stored blocks add five bytes per 16 KiB at worst, plus the gzip framing.
fn compressed_bound(len: usize) -> usize {
    len + (len / 16_384 + 1) * 5 + 64
}

/// Uncompressed size recorded in the gzip trailer (ISIZE), clamped to what
/// `data` could plausibly expand to
fn decompressed_hint(data: &[u8]) -> usize {
    if data.len() < 4 {
        return 0;
    }
    let trailer = &data[data.len() - 4..];
    let recorded = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    usize::try_from(recorded)
        .unwrap_or(0)
        .min(data.len().saturating_mul(MAX_DEFLATE_RATIO))
}

/// Gzip `data` at the given level (0-9)
pub fn compress(data: &[u8], level: u32) -> ProfilesResult<SecureBytes> {
    if level > MAX_COMPRESSION_LEVEL {
        return Err(ProfilesError::Config(format!(
            "compression level must be between 0 and {}, got {}",
            MAX_COMPRESSION_LEVEL, level
        )));
    }

    let out = SecureBytes::with_capacity(compressed_bound(data.len()));
    let mut encoder = GzEncoder::new(out, Compression::new(level));
    encoder
        .write_all(data)
        .map_err(|e| ProfilesError::Format(format!("compressing archive: {}", e)))?;
    let compressed = encoder
        .finish()
        .map_err(|e| ProfilesError::Format(format!("finishing compression: {}", e)))?;

    Ok(compressed)
}

/// Gunzip `data`
pub fn decompress(data: &[u8]) -> ProfilesResult<SecureBytes> {
    let mut out = SecureBytes::with_capacity(decompressed_hint(data));
    out.read_from(GzDecoder::new(data))
        .map_err(|e| ProfilesError::Format(format!("decompressing archive: {}", e)))?;
    Ok(out)
}
