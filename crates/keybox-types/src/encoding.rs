//! Type-safe wrappers for encoded cryptographic data
//!
//! This module provides newtype wrappers that make it clear what encoding
//! format data is in, preventing confusion between DER, PEM, and raw bytes.

use base64::Engine;

/// DER-encoded bytes (Distinguished Encoding Rules)
///
/// This is the binary ASN.1 encoding used for keys and signatures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerBytes(Vec<u8>);

impl DerBytes {
    /// Create a new DER-encoded bytes wrapper
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Get the underlying bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Convert to owned bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Get the length of the encoded data
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the encoded data is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for DerBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<&[u8]> for DerBytes {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes.to_vec())
    }
}

impl AsRef<[u8]> for DerBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A PEM-encoded public key
///
/// This type wraps a public key in PEM format (with BEGIN/END headers).
///
/// Note: construction does not validate the PEM format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyPem(String);

impl PublicKeyPem {
    /// Create a new PublicKeyPem from a PEM string
    pub fn new(pem: String) -> Self {
        Self(pem)
    }

    /// Get the PEM string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner PEM string
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for PublicKeyPem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for PublicKeyPem {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A cryptographic signature
///
/// This type wraps raw signature bytes as produced by a signing operation.
/// For elliptic-curve keys the bytes are a DER-encoded (r, s) pair; for RSA
/// they are the raw PKCS#1 v1.5 signature block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature(Vec<u8>);

impl Signature {
    /// Create a new Signature from raw bytes
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Get the raw signature bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume and return the inner bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Get the length of the signature in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the signature is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Encode the signature as base64
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.0)
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Signature {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}
