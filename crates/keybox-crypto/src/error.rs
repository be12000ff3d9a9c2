//! Error types for keybox-crypto

use thiserror::Error;

/// Errors that can occur in public-key operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid key format
    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(String),

    /// Unsupported algorithm
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Operation attempted on a handle with no key material
    #[error("No key material loaded")]
    NoKey,

    /// Signing error
    #[error("Signing error: {0}")]
    Signing(String),

    /// Verification error
    #[error("Verification error: {0}")]
    Verification(String),

    /// Encryption error
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Decryption error
    #[error("Decryption error: {0}")]
    Decryption(String),

    /// Input exceeds the key's maximum operable length
    #[error("Input of {len} bytes exceeds the key's operable length of {max} bytes")]
    OversizedInput {
        /// Length of the rejected input
        len: usize,
        /// Maximum operable length of the bound key
        max: usize,
    },

    /// Key generation error
    #[error("Key generation error: {0}")]
    KeyGeneration(String),

    /// PEM encoding/decoding error
    #[error("PEM error: {0}")]
    Pem(String),
}

/// Result type for public-key operations
pub type Result<T> = std::result::Result<T, Error>;
