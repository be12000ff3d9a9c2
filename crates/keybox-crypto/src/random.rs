//! Entropy sourcing for randomized public-key operations

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// A cryptographically secure generator owned by a key handle
///
/// Seeded from the operating system on creation. Every randomized operation
/// on the owning handle (RSA blinding, encryption padding, key generation)
/// draws from this instance; sharing one source across handles requires
/// external synchronization and is not supported here.
pub struct EntropySource {
    rng: StdRng,
}

impl EntropySource {
    /// Create a new entropy source seeded from the operating system
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Fill `buf` with random bytes
    pub fn fill(&mut self, buf: &mut [u8]) {
        self.rng.fill_bytes(buf);
    }

    pub(crate) fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

impl Default for EntropySource {
    fn default() -> Self {
        Self::new()
    }
}
