//! Public-key engine over RSA and elliptic-curve keys
//!
//! This crate provides key parsing, signing, verification, encryption, and
//! decryption behind a single runtime-polymorphic [`KeyHandle`], using the
//! RustCrypto primitive crates as the backend.

pub mod error;
pub mod hash;
pub mod key;
pub mod random;

pub use error::{Error, Result};
pub use hash::{digest, sha256, sha384, sha512, Sha256Hasher};
pub use key::{KeyHandle, MAX_KEY_BYTES};
pub use random::EntropySource;

// Re-export the shared vocabulary so callers need only one crate.
pub use keybox_types::{DerBytes, HashAlgorithm, KeyAlgorithm, PublicKeyPem, Signature};
