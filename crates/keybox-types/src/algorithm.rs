//! Algorithm identifiers

/// Key family tags
///
/// `None` is the sentinel for a handle with no algorithm bound. `EcKey` is a
/// general-purpose elliptic-curve key; `EcKeyDh` and `Ecdsa` name restricted
/// roles of the same family and exist for capability queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAlgorithm {
    /// No algorithm bound
    None,
    /// RSA
    Rsa,
    /// Elliptic-curve key usable for both ECDSA and key agreement
    EcKey,
    /// Elliptic-curve key restricted to key agreement
    EcKeyDh,
    /// Elliptic-curve key restricted to ECDSA
    Ecdsa,
}

impl KeyAlgorithm {
    /// Get the human-readable label for this tag
    pub fn name(&self) -> &'static str {
        match self {
            KeyAlgorithm::None => "NONE",
            KeyAlgorithm::Rsa => "RSA",
            KeyAlgorithm::EcKey => "EC",
            KeyAlgorithm::EcKeyDh => "EC_DH",
            KeyAlgorithm::Ecdsa => "ECDSA",
        }
    }
}

impl std::fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Hash algorithm selectors for digest normalization
///
/// `None` asserts that the caller's message is already a digest (or short
/// enough to be used raw) and must not be hashed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    /// Use the message as-is, without hashing
    None,
    /// SHA2-256
    Sha256,
    /// SHA2-384
    Sha384,
    /// SHA2-512
    Sha512,
}

impl HashAlgorithm {
    /// Get the digest size in bytes for this algorithm (0 for `None`)
    pub fn digest_size(&self) -> usize {
        match self {
            HashAlgorithm::None => 0,
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HashAlgorithm::None => write!(f, "NONE"),
            HashAlgorithm::Sha256 => write!(f, "SHA2_256"),
            HashAlgorithm::Sha384 => write!(f, "SHA2_384"),
            HashAlgorithm::Sha512 => write!(f, "SHA2_512"),
        }
    }
}
