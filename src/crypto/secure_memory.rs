//! Secure memory handling for sensitive data
//!
//! Provides types that securely zero memory on drop to prevent
//! passwords and decrypted archives from lingering in memory.

use std::fmt;
use std::io::{self, Read, Write};
use std::ops::Deref;

use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Chunk size used when reading into a `SecureBytes`
const READ_CHUNK: usize = 8 * 1024;

/// A password held as raw bytes, zeroed on drop
///
/// Passwords are only ever handed to the key derivation function. They are
/// never persisted and never shown in `Debug` or `Display` output.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Password {
    inner: Vec<u8>,
}

impl Password {
    /// Create a new Password, taking ownership of the bytes
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            inner: bytes.into(),
        }
    }

    /// Get the password bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.inner
    }

    /// Get the length in bytes
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl PartialEq for Password {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl From<Vec<u8>> for Password {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<String> for Password {
    fn from(s: String) -> Self {
        Self::new(s.into_bytes())
    }
}

impl From<&str> for Password {
    fn from(s: &str) -> Self {
        Self::new(s.as_bytes())
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Password")
            .field("len", &self.inner.len())
            .finish()
    }
}

impl fmt::Display for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED {} bytes]", self.inner.len())
    }
}

/// A byte vector that zeros its contents on drop
///
/// Used for the plaintext archive stream and anything else that exists only
/// between decryption and the filesystem. Appending through `Write` or
/// `read_from` never leaves a stale copy behind: when the buffer is full the
/// contents move to a larger allocation and the old one is wiped first.
#[derive(Default, Zeroize, ZeroizeOnDrop)]
pub struct SecureBytes {
    inner: Vec<u8>,
}

impl SecureBytes {
    /// Create new SecureBytes
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            inner: bytes.into(),
        }
    }

    /// Get the bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.inner
    }

    /// Create an empty buffer with room for `capacity` bytes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Vec::with_capacity(capacity),
        }
    }

    /// Allocated size of the buffer
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    /// Append `data`, wiping the previous allocation if it has to grow
    pub fn extend_from_slice(&mut self, data: &[u8]) {
        let needed = self.inner.len().saturating_add(data.len());
        if needed > self.inner.capacity() {
            let mut grown = Vec::with_capacity(needed.max(self.inner.capacity() * 2));
            grown.extend_from_slice(&self.inner);
            // Zeroes the whole old allocation, spare capacity included
            self.inner.zeroize();
            self.inner = grown;
        }
        self.inner.extend_from_slice(data);
    }

    /// Read `reader` to the end, appending to this buffer
    pub fn read_from<R: Read>(&mut self, mut reader: R) -> io::Result<u64> {
        let mut chunk = Zeroizing::new([0u8; READ_CHUNK]);
        let mut total = 0u64;
        loop {
            let n = match reader.read(&mut chunk[..]) {
                Ok(0) => return Ok(total),
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            self.extend_from_slice(&chunk[..n]);
            total += n as u64;
        }
    }

    /// Get the length
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Deref for SecureBytes {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl AsRef<[u8]> for SecureBytes {
    fn as_ref(&self) -> &[u8] {
        &self.inner
    }
}

impl From<Vec<u8>> for SecureBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<&[u8]> for SecureBytes {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes.to_vec())
    }
}

impl Write for SecureBytes {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// Don't print the contents in Debug output
impl fmt::Debug for SecureBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureBytes")
            .field("len", &self.inner.len())
            .finish()
    }
}
