//! Hashing utilities backed by the SHA-2 family

use keybox_types::HashAlgorithm;
use sha2::{Digest, Sha256, Sha384, Sha512};

/// Hash data using SHA-256
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut result = [0u8; 32];
    result.copy_from_slice(&Sha256::digest(data));
    result
}

/// Hash data using SHA-384
pub fn sha384(data: &[u8]) -> [u8; 48] {
    let mut result = [0u8; 48];
    result.copy_from_slice(&Sha384::digest(data));
    result
}

/// Hash data using SHA-512
pub fn sha512(data: &[u8]) -> [u8; 64] {
    let mut result = [0u8; 64];
    result.copy_from_slice(&Sha512::digest(data));
    result
}

/// Hash data with the selected algorithm
///
/// `HashAlgorithm::None` has no digest function and yields an empty vector;
/// callers that allow pass-through input must handle that case before
/// reaching for this function.
pub fn digest(data: &[u8], algorithm: HashAlgorithm) -> Vec<u8> {
    match algorithm {
        HashAlgorithm::None => Vec::new(),
        HashAlgorithm::Sha256 => sha256(data).to_vec(),
        HashAlgorithm::Sha384 => sha384(data).to_vec(),
        HashAlgorithm::Sha512 => sha512(data).to_vec(),
    }
}

/// Incremental SHA-256 hasher
pub struct Sha256Hasher {
    inner: Sha256,
}

impl Sha256Hasher {
    /// Create a new SHA-256 hasher
    pub fn new() -> Self {
        Self {
            inner: Sha256::new(),
        }
    }

    /// Update the hasher with data
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Finalize and get the digest
    pub fn finalize(self) -> [u8; 32] {
        let mut result = [0u8; 32];
        result.copy_from_slice(&self.inner.finalize());
        result
    }
}

impl Default for Sha256Hasher {
    fn default() -> Self {
        Self::new()
    }
}
