//! The public-key engine: one handle over RSA and elliptic-curve keys
//!
//! [`KeyHandle`] owns an algorithm-specific key context together with an
//! entropy source and exposes parsing, introspection, signing, verification,
//! encryption, and decryption behind a single interface. Messages are
//! normalized to a digest before they reach the signing primitives, so
//! callers may either pre-hash themselves (`HashAlgorithm::None`) or let the
//! handle hash for them.
//!
//! A handle moves through three states: empty, loaded, and back to empty via
//! [`KeyHandle::reset`]. Every parse call resets the handle first, so the
//! same handle can be repopulated with different key material.

use std::fmt;
use std::fs;
use std::path::Path;

use const_oid::db::rfc5912::{ID_EC_PUBLIC_KEY, RSA_ENCRYPTION, SECP_256_R_1, SECP_384_R_1};
use const_oid::ObjectIdentifier;
use pkcs8::{
    DecodePrivateKey, DecodePublicKey, EncodePublicKey, EncryptedPrivateKeyInfo, PrivateKeyInfo,
    SecretDocument,
};
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Encrypt, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::{Sha256, Sha384, Sha512};
use signature::hazmat::{PrehashSigner, PrehashVerifier};

use crate::error::{Error, Result};
use crate::hash;
use crate::random::EntropySource;
use keybox_types::{DerBytes, HashAlgorithm, KeyAlgorithm, PublicKeyPem, Signature};

/// Largest supported modulus size in bytes (8192-bit RSA)
///
/// Keys above this cap are rejected at parse time, which bounds the size of
/// every signature and ciphertext the engine can produce.
pub const MAX_KEY_BYTES: usize = 1024;

/// Algorithm-specific key state
///
/// The public half is always present; the private half only when the key was
/// decoded from (or generated as) a private key.
enum KeyContext {
    None,
    Rsa {
        public: RsaPublicKey,
        private: Option<RsaPrivateKey>,
    },
    P256 {
        public: p256::ecdsa::VerifyingKey,
        private: Option<p256::ecdsa::SigningKey>,
    },
    P384 {
        public: p384::ecdsa::VerifyingKey,
        private: Option<p384::ecdsa::SigningKey>,
    },
}

impl KeyContext {
    fn from_rsa_private(private: RsaPrivateKey) -> Result<Self> {
        let public = private.to_public_key();
        check_modulus(&public)?;
        Ok(KeyContext::Rsa {
            public,
            private: Some(private),
        })
    }

    fn from_rsa_public(public: RsaPublicKey) -> Result<Self> {
        check_modulus(&public)?;
        Ok(KeyContext::Rsa {
            public,
            private: None,
        })
    }

    fn from_p256_private(private: p256::ecdsa::SigningKey) -> Self {
        let public = private.verifying_key().clone();
        KeyContext::P256 {
            public,
            private: Some(private),
        }
    }

    fn from_p384_private(private: p384::ecdsa::SigningKey) -> Self {
        let public = private.verifying_key().clone();
        KeyContext::P384 {
            public,
            private: Some(private),
        }
    }

    fn algorithm(&self) -> KeyAlgorithm {
        match self {
            KeyContext::None => KeyAlgorithm::None,
            KeyContext::Rsa { .. } => KeyAlgorithm::Rsa,
            KeyContext::P256 { .. } | KeyContext::P384 { .. } => KeyAlgorithm::EcKey,
        }
    }
}

/// A runtime-polymorphic asymmetric key
///
/// Owns the key context and the entropy source feeding randomized
/// operations. Not `Clone`: key material moves as a single unit and is
/// released exactly once when the handle is dropped or reset.
pub struct KeyHandle {
    algorithm: KeyAlgorithm,
    context: KeyContext,
    random: EntropySource,
}

impl KeyHandle {
    /// Create an empty handle with no algorithm bound
    pub fn new() -> Self {
        Self::with_algorithm(KeyAlgorithm::None)
    }

    /// Create a handle bound to the given algorithm tag
    ///
    /// Binding `KeyAlgorithm::None` yields a valid-but-empty handle, not an
    /// error. Key material is populated by a later parse call, which derives
    /// the definitive tag from the decoded key.
    pub fn with_algorithm(algorithm: KeyAlgorithm) -> Self {
        Self {
            algorithm,
            context: KeyContext::None,
            random: EntropySource::new(),
        }
    }

    /// True iff a concrete algorithm is bound
    pub fn is_valid(&self) -> bool {
        self.algorithm != KeyAlgorithm::None
    }

    /// Release the key context and return the handle to the empty state
    ///
    /// Safe to call repeatedly and before any key was loaded.
    pub fn reset(&mut self) {
        self.algorithm = KeyAlgorithm::None;
        self.context = KeyContext::None;
    }

    /// Get the bound algorithm tag
    pub fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    /// Get the human-readable label of the bound algorithm
    pub fn algorithm_name(&self) -> &'static str {
        self.algorithm.name()
    }

    /// Key size in bits (0 for an empty handle)
    pub fn size_bits(&self) -> usize {
        match &self.context {
            KeyContext::None => 0,
            KeyContext::Rsa { public, .. } => public.n().bits(),
            KeyContext::P256 { .. } => 256,
            KeyContext::P384 { .. } => 384,
        }
    }

    /// Key size in bytes, rounded up
    ///
    /// This doubles as the maximum operable length: the largest input the
    /// bound key can process in one encrypt/decrypt/raw-sign call.
    pub fn size_bytes(&self) -> usize {
        (self.size_bits() + 7) / 8
    }

    /// Check whether the bound key supports operations of the given family
    ///
    /// An elliptic-curve key answers for the `EcKey`, `EcKeyDh`, and `Ecdsa`
    /// roles; an RSA key only for `Rsa`. An empty handle supports nothing.
    pub fn supports(&self, algorithm: KeyAlgorithm) -> bool {
        match &self.context {
            KeyContext::None => false,
            KeyContext::Rsa { .. } => algorithm == KeyAlgorithm::Rsa,
            KeyContext::P256 { .. } | KeyContext::P384 { .. } => matches!(
                algorithm,
                KeyAlgorithm::EcKey | KeyAlgorithm::EcKeyDh | KeyAlgorithm::Ecdsa
            ),
        }
    }

    /// True iff the private half of the key is present
    pub fn has_private_key(&self) -> bool {
        match &self.context {
            KeyContext::None => false,
            KeyContext::Rsa { private, .. } => private.is_some(),
            KeyContext::P256 { private, .. } => private.is_some(),
            KeyContext::P384 { private, .. } => private.is_some(),
        }
    }
}

impl KeyHandle {
    /// Parse a private key from PEM or DER bytes
    ///
    /// Accepts PKCS#8 (`PRIVATE KEY`), encrypted PKCS#8
    /// (`ENCRYPTED PRIVATE KEY`), PKCS#1 (`RSA PRIVATE KEY`), and SEC1
    /// (`EC PRIVATE KEY`) encodings. A zero-length passphrase is treated as
    /// absent. The handle is reset first; on failure it stays empty and the
    /// diagnostic is logged.
    pub fn parse_private_key(&mut self, key_data: &[u8], passphrase: Option<&str>) -> Result<()> {
        self.reset();
        let passphrase = passphrase.filter(|p| !p.is_empty());
        match decode_private_key(key_data, passphrase) {
            Ok(context) => {
                self.algorithm = context.algorithm();
                self.context = context;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("failed to parse private key: {}", e);
                Err(e)
            }
        }
    }

    /// Parse a public key from PEM or DER bytes
    ///
    /// Accepts SPKI (`PUBLIC KEY`) and PKCS#1 (`RSA PUBLIC KEY`) encodings.
    pub fn parse_public_key(&mut self, key_data: &[u8]) -> Result<()> {
        self.reset();
        match decode_public_key(key_data) {
            Ok(context) => {
                self.algorithm = context.algorithm();
                self.context = context;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("failed to parse public key: {}", e);
                Err(e)
            }
        }
    }

    /// Parse a private key from a file
    ///
    /// An unreadable file degrades to empty input, which then fails to
    /// parse; there is no distinct I/O error path.
    pub fn parse_private_key_file(
        &mut self,
        path: impl AsRef<Path>,
        passphrase: Option<&str>,
    ) -> Result<()> {
        let key_data = fs::read(path).unwrap_or_default();
        self.parse_private_key(&key_data, passphrase)
    }

    /// Parse a public key from a file
    pub fn parse_public_key_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let key_data = fs::read(path).unwrap_or_default();
        self.parse_public_key(&key_data)
    }
}

impl KeyHandle {
    /// Sign a message
    ///
    /// The message is normalized first: hashed with `algorithm`, or used raw
    /// when the selector is `HashAlgorithm::None` and the message is shorter
    /// than the key's operable length. RSA
    /// produces a PKCS#1 v1.5 signature; elliptic-curve keys produce a
    /// DER-encoded ECDSA signature over the prehash.
    pub fn sign(&mut self, message: &[u8], algorithm: HashAlgorithm) -> Result<Signature> {
        let result = self.sign_inner(message, algorithm);
        if let Err(e) = &result {
            tracing::warn!("sign failed: {}", e);
        }
        result
    }

    fn sign_inner(&mut self, message: &[u8], algorithm: HashAlgorithm) -> Result<Signature> {
        if let KeyContext::None = self.context {
            return Err(Error::NoKey);
        }
        let digest = self.prepare(message, algorithm)?;
        match &self.context {
            KeyContext::None => Err(Error::NoKey),
            KeyContext::Rsa {
                private: Some(key), ..
            } => {
                let sig = key
                    .sign_with_rng(self.random.rng(), pkcs1v15_padding(algorithm), &digest)
                    .map_err(|e| Error::Signing(format!("RSA signing failed: {}", e)))?;
                Ok(Signature::new(sig))
            }
            KeyContext::P256 {
                private: Some(key), ..
            } => {
                let sig: p256::ecdsa::Signature = key
                    .sign_prehash(&digest)
                    .map_err(|e| Error::Signing(format!("ECDSA signing failed: {}", e)))?;
                Ok(Signature::new(sig.to_der().as_bytes().to_vec()))
            }
            KeyContext::P384 {
                private: Some(key), ..
            } => {
                let sig: p384::ecdsa::Signature = key
                    .sign_prehash(&digest)
                    .map_err(|e| Error::Signing(format!("ECDSA signing failed: {}", e)))?;
                Ok(Signature::new(sig.to_der().as_bytes().to_vec()))
            }
            KeyContext::Rsa { private: None, .. }
            | KeyContext::P256 { private: None, .. }
            | KeyContext::P384 { private: None, .. } => Err(Error::Signing(
                "private key required for signing".to_string(),
            )),
        }
    }

    /// Verify a signature over a message
    ///
    /// The message is normalized exactly as in [`sign`](Self::sign). A
    /// mismatch is an ordinary `Err` the caller branches on; nothing is
    /// logged for it.
    pub fn verify(&self, message: &[u8], signature: &[u8], algorithm: HashAlgorithm) -> Result<()> {
        if let KeyContext::None = self.context {
            return Err(Error::NoKey);
        }
        let digest = self.prepare(message, algorithm)?;
        match &self.context {
            KeyContext::None => Err(Error::NoKey),
            KeyContext::Rsa { public, .. } => public
                .verify(pkcs1v15_padding(algorithm), &digest, signature)
                .map_err(|_| Error::Verification("RSA signature invalid".to_string())),
            KeyContext::P256 { public, .. } => {
                let sig = p256::ecdsa::Signature::from_der(signature)
                    .map_err(|_| Error::Verification("malformed ECDSA signature".to_string()))?;
                public
                    .verify_prehash(&digest, &sig)
                    .map_err(|_| Error::Verification("ECDSA signature invalid".to_string()))
            }
            KeyContext::P384 { public, .. } => {
                let sig = p384::ecdsa::Signature::from_der(signature)
                    .map_err(|_| Error::Verification("malformed ECDSA signature".to_string()))?;
                public
                    .verify_prehash(&digest, &sig)
                    .map_err(|_| Error::Verification("ECDSA signature invalid".to_string()))
            }
        }
    }

    /// Encrypt a plaintext with the public half of the bound key
    ///
    /// RSA PKCS#1 v1.5 only; elliptic-curve keys cannot encrypt. Input
    /// longer than [`size_bytes`](Self::size_bytes) is rejected before the
    /// primitive is invoked.
    pub fn encrypt(&mut self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let result = self.encrypt_inner(plaintext);
        if let Err(e) = &result {
            tracing::warn!("encrypt failed: {}", e);
        }
        result
    }

    fn encrypt_inner(&mut self, plaintext: &[u8]) -> Result<Vec<u8>> {
        match &self.context {
            KeyContext::None => Err(Error::NoKey),
            KeyContext::Rsa { public, .. } => {
                check_size(plaintext, self.size_bytes())?;
                public
                    .encrypt(self.random.rng(), Pkcs1v15Encrypt, plaintext)
                    .map_err(|e| Error::Encryption(format!("RSA encryption failed: {}", e)))
            }
            KeyContext::P256 { .. } | KeyContext::P384 { .. } => Err(Error::UnsupportedAlgorithm(
                "encryption requires an RSA key".to_string(),
            )),
        }
    }

    /// Decrypt a ciphertext with the private half of the bound key
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        let result = self.decrypt_inner(ciphertext);
        if let Err(e) = &result {
            tracing::warn!("decrypt failed: {}", e);
        }
        result
    }

    fn decrypt_inner(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        match &self.context {
            KeyContext::None => Err(Error::NoKey),
            KeyContext::Rsa {
                private: Some(key), ..
            } => {
                check_size(ciphertext, self.size_bytes())?;
                key.decrypt(Pkcs1v15Encrypt, ciphertext)
                    .map_err(|e| Error::Decryption(format!("RSA decryption failed: {}", e)))
            }
            KeyContext::Rsa { private: None, .. } => Err(Error::Decryption(
                "private key required for decryption".to_string(),
            )),
            KeyContext::P256 { .. } | KeyContext::P384 { .. } => Err(Error::UnsupportedAlgorithm(
                "decryption requires an RSA key".to_string(),
            )),
        }
    }

    /// Normalize a message into the operand fed to the primitives
    ///
    /// With a real selector the message is hashed. With
    /// `HashAlgorithm::None` the message must already fit the key's
    /// operable length and is used as-is; an oversized raw message is
    /// rejected here rather than handed to the primitive.
    fn prepare(&self, message: &[u8], algorithm: HashAlgorithm) -> Result<Vec<u8>> {
        if algorithm == HashAlgorithm::None {
            let max = self.size_bytes();
            if message.len() < max {
                return Ok(message.to_vec());
            }
            return Err(Error::OversizedInput {
                len: message.len(),
                max,
            });
        }
        Ok(hash::digest(message, algorithm))
    }
}

impl KeyHandle {
    /// Generate a fresh RSA key of the given modulus size
    pub fn generate_rsa(bits: usize) -> Result<Self> {
        let mut random = EntropySource::new();
        let private = RsaPrivateKey::new(random.rng(), bits).map_err(|e| {
            Error::KeyGeneration(format!("failed to generate RSA-{} key: {}", bits, e))
        })?;
        let context = KeyContext::from_rsa_private(private)?;
        Ok(Self {
            algorithm: context.algorithm(),
            context,
            random,
        })
    }

    /// Generate a fresh ECDSA P-256 key
    pub fn generate_ec_p256() -> Result<Self> {
        let mut random = EntropySource::new();
        let private = p256::ecdsa::SigningKey::random(random.rng());
        let context = KeyContext::from_p256_private(private);
        Ok(Self {
            algorithm: context.algorithm(),
            context,
            random,
        })
    }

    /// Generate a fresh ECDSA P-384 key
    pub fn generate_ec_p384() -> Result<Self> {
        let mut random = EntropySource::new();
        let private = p384::ecdsa::SigningKey::random(random.rng());
        let context = KeyContext::from_p384_private(private);
        Ok(Self {
            algorithm: context.algorithm(),
            context,
            random,
        })
    }

    /// Export the public half as DER-encoded SubjectPublicKeyInfo
    pub fn public_key_der(&self) -> Result<DerBytes> {
        let document = match &self.context {
            KeyContext::None => return Err(Error::NoKey),
            KeyContext::Rsa { public, .. } => public.to_public_key_der(),
            KeyContext::P256 { public, .. } => public.to_public_key_der(),
            KeyContext::P384 { public, .. } => public.to_public_key_der(),
        }
        .map_err(|e| Error::InvalidKeyFormat(format!("failed to encode public key: {}", e)))?;
        Ok(DerBytes::new(document.as_bytes().to_vec()))
    }

    /// Export the public half as PEM-encoded SubjectPublicKeyInfo
    pub fn public_key_pem(&self) -> Result<PublicKeyPem> {
        let der = self.public_key_der()?;
        let block = pem::Pem::new("PUBLIC KEY", der.into_bytes());
        Ok(PublicKeyPem::new(pem::encode(&block)))
    }
}

impl Default for KeyHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for KeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyHandle")
            .field("algorithm", &self.algorithm)
            .field("size_bits", &self.size_bits())
            .field("has_private_key", &self.has_private_key())
            .finish()
    }
}

fn check_modulus(public: &RsaPublicKey) -> Result<()> {
    if public.size() > MAX_KEY_BYTES {
        return Err(Error::InvalidKeyFormat(format!(
            "RSA modulus of {} bytes exceeds the supported maximum of {} bytes",
            public.size(),
            MAX_KEY_BYTES
        )));
    }
    Ok(())
}

fn check_size(data: &[u8], max: usize) -> Result<()> {
    if data.len() > max {
        return Err(Error::OversizedInput {
            len: data.len(),
            max,
        });
    }
    Ok(())
}

fn pkcs1v15_padding(algorithm: HashAlgorithm) -> Pkcs1v15Sign {
    match algorithm {
        HashAlgorithm::None => Pkcs1v15Sign::new_unprefixed(),
        HashAlgorithm::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
        HashAlgorithm::Sha384 => Pkcs1v15Sign::new::<Sha384>(),
        HashAlgorithm::Sha512 => Pkcs1v15Sign::new::<Sha512>(),
    }
}

fn looks_like_pem(data: &[u8]) -> bool {
    data.trim_ascii_start().starts_with(b"-----BEGIN")
}

fn decode_private_key(key_data: &[u8], passphrase: Option<&str>) -> Result<KeyContext> {
    if key_data.is_empty() {
        return Err(Error::InvalidKeyFormat("empty key data".to_string()));
    }
    if looks_like_pem(key_data) {
        let block = pem::parse(key_data)
            .map_err(|e| Error::Pem(format!("failed to parse PEM: {}", e)))?;
        match block.tag() {
            "PRIVATE KEY" => private_from_pkcs8(block.contents()),
            "ENCRYPTED PRIVATE KEY" => {
                let document = decrypt_pkcs8(block.contents(), passphrase)?;
                private_from_pkcs8(document.as_bytes())
            }
            "RSA PRIVATE KEY" => rsa_private_from_pkcs1(block.contents()),
            "EC PRIVATE KEY" => ec_private_from_sec1(block.contents()),
            other => Err(Error::InvalidKeyFormat(format!(
                "unexpected PEM block: {}",
                other
            ))),
        }
    } else if PrivateKeyInfo::try_from(key_data).is_ok() {
        private_from_pkcs8(key_data)
    } else if EncryptedPrivateKeyInfo::try_from(key_data).is_ok() {
        let document = decrypt_pkcs8(key_data, passphrase)?;
        private_from_pkcs8(document.as_bytes())
    } else if let Ok(context) = rsa_private_from_pkcs1(key_data) {
        Ok(context)
    } else {
        ec_private_from_sec1(key_data)
    }
}

/// Decode a PKCS#8 PrivateKeyInfo, dispatching on its algorithm OID.
fn private_from_pkcs8(der: &[u8]) -> Result<KeyContext> {
    let info = PrivateKeyInfo::try_from(der)
        .map_err(|e| Error::InvalidKeyFormat(format!("failed to parse PKCS#8: {}", e)))?;
    let oid = info.algorithm.oid;
    if oid == RSA_ENCRYPTION {
        let key = RsaPrivateKey::from_pkcs8_der(der).map_err(|e| {
            Error::InvalidKeyFormat(format!("failed to parse RSA private key: {}", e))
        })?;
        KeyContext::from_rsa_private(key)
    } else if oid == ID_EC_PUBLIC_KEY {
        let curve = ec_curve_oid(&info.algorithm)?;
        if curve == SECP_256_R_1 {
            let key = p256::ecdsa::SigningKey::from_pkcs8_der(der).map_err(|e| {
                Error::InvalidKeyFormat(format!("failed to parse P-256 private key: {}", e))
            })?;
            Ok(KeyContext::from_p256_private(key))
        } else if curve == SECP_384_R_1 {
            let key = p384::ecdsa::SigningKey::from_pkcs8_der(der).map_err(|e| {
                Error::InvalidKeyFormat(format!("failed to parse P-384 private key: {}", e))
            })?;
            Ok(KeyContext::from_p384_private(key))
        } else {
            Err(Error::UnsupportedAlgorithm(format!(
                "unsupported EC curve OID: {}",
                curve
            )))
        }
    } else {
        Err(Error::UnsupportedAlgorithm(format!(
            "unsupported key algorithm OID: {}",
            oid
        )))
    }
}

fn decrypt_pkcs8(der: &[u8], passphrase: Option<&str>) -> Result<SecretDocument> {
    let passphrase = passphrase.ok_or_else(|| {
        Error::InvalidKeyFormat("encrypted private key requires a passphrase".to_string())
    })?;
    let info = EncryptedPrivateKeyInfo::try_from(der)
        .map_err(|e| Error::InvalidKeyFormat(format!("failed to parse encrypted PKCS#8: {}", e)))?;
    info.decrypt(passphrase)
        .map_err(|e| Error::InvalidKeyFormat(format!("failed to decrypt private key: {}", e)))
}

fn rsa_private_from_pkcs1(der: &[u8]) -> Result<KeyContext> {
    let key = RsaPrivateKey::from_pkcs1_der(der).map_err(|e| {
        Error::InvalidKeyFormat(format!("failed to parse PKCS#1 private key: {}", e))
    })?;
    KeyContext::from_rsa_private(key)
}

/// Decode a SEC1 ECPrivateKey, trying P-256 then P-384.
///
/// The curve is validated against the named-curve parameters inside the
/// encoding, so the wrong-curve attempt fails cleanly.
fn ec_private_from_sec1(der: &[u8]) -> Result<KeyContext> {
    if let Ok(secret) = p256::SecretKey::from_sec1_der(der) {
        return Ok(KeyContext::from_p256_private(p256::ecdsa::SigningKey::from(
            secret,
        )));
    }
    let secret = p384::SecretKey::from_sec1_der(der)
        .map_err(|e| Error::InvalidKeyFormat(format!("failed to parse EC private key: {}", e)))?;
    Ok(KeyContext::from_p384_private(p384::ecdsa::SigningKey::from(
        secret,
    )))
}

fn decode_public_key(key_data: &[u8]) -> Result<KeyContext> {
    if key_data.is_empty() {
        return Err(Error::InvalidKeyFormat("empty key data".to_string()));
    }
    if looks_like_pem(key_data) {
        let block = pem::parse(key_data)
            .map_err(|e| Error::Pem(format!("failed to parse PEM: {}", e)))?;
        match block.tag() {
            "PUBLIC KEY" => public_from_spki(block.contents()),
            "RSA PUBLIC KEY" => {
                let key = RsaPublicKey::from_pkcs1_der(block.contents()).map_err(|e| {
                    Error::InvalidKeyFormat(format!("failed to parse PKCS#1 public key: {}", e))
                })?;
                KeyContext::from_rsa_public(key)
            }
            other => Err(Error::InvalidKeyFormat(format!(
                "unexpected PEM block: {}",
                other
            ))),
        }
    } else if spki::SubjectPublicKeyInfoRef::try_from(key_data).is_ok() {
        public_from_spki(key_data)
    } else {
        let key = RsaPublicKey::from_pkcs1_der(key_data).map_err(|e| {
            Error::InvalidKeyFormat(format!("failed to parse PKCS#1 public key: {}", e))
        })?;
        KeyContext::from_rsa_public(key)
    }
}

/// Decode a SubjectPublicKeyInfo, dispatching on its algorithm OID.
fn public_from_spki(der: &[u8]) -> Result<KeyContext> {
    let info = spki::SubjectPublicKeyInfoRef::try_from(der)
        .map_err(|e| Error::InvalidKeyFormat(format!("failed to parse SPKI: {}", e)))?;
    let oid = info.algorithm.oid;
    if oid == RSA_ENCRYPTION {
        let key = RsaPublicKey::from_public_key_der(der).map_err(|e| {
            Error::InvalidKeyFormat(format!("failed to parse RSA public key: {}", e))
        })?;
        KeyContext::from_rsa_public(key)
    } else if oid == ID_EC_PUBLIC_KEY {
        let curve = ec_curve_oid(&info.algorithm)?;
        if curve == SECP_256_R_1 {
            let key = p256::ecdsa::VerifyingKey::from_public_key_der(der).map_err(|e| {
                Error::InvalidKeyFormat(format!("failed to parse P-256 public key: {}", e))
            })?;
            Ok(KeyContext::P256 {
                public: key,
                private: None,
            })
        } else if curve == SECP_384_R_1 {
            let key = p384::ecdsa::VerifyingKey::from_public_key_der(der).map_err(|e| {
                Error::InvalidKeyFormat(format!("failed to parse P-384 public key: {}", e))
            })?;
            Ok(KeyContext::P384 {
                public: key,
                private: None,
            })
        } else {
            Err(Error::UnsupportedAlgorithm(format!(
                "unsupported EC curve OID: {}",
                curve
            )))
        }
    } else {
        Err(Error::UnsupportedAlgorithm(format!(
            "unsupported key algorithm OID: {}",
            oid
        )))
    }
}

/// Extract the named-curve OID from an EC algorithm identifier.
///
/// The parameters field holds the raw OID; `ObjectIdentifier::from_bytes`
/// expects the OID content bytes without tag and length.
fn ec_curve_oid(algorithm: &spki::AlgorithmIdentifierRef<'_>) -> Result<ObjectIdentifier> {
    let params = algorithm.parameters.ok_or_else(|| {
        Error::InvalidKeyFormat("EC key missing curve parameters".to_string())
    })?;
    ObjectIdentifier::from_bytes(params.value())
        .map_err(|e| Error::InvalidKeyFormat(format!("failed to parse EC curve OID: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_algorithm_validity() {
        assert!(KeyHandle::with_algorithm(KeyAlgorithm::Rsa).is_valid());
        assert!(KeyHandle::with_algorithm(KeyAlgorithm::EcKey).is_valid());
        assert!(KeyHandle::with_algorithm(KeyAlgorithm::EcKeyDh).is_valid());
        assert!(KeyHandle::with_algorithm(KeyAlgorithm::Ecdsa).is_valid());
        assert!(!KeyHandle::with_algorithm(KeyAlgorithm::None).is_valid());
        assert!(!KeyHandle::new().is_valid());
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut handle = KeyHandle::generate_ec_p256().unwrap();
        assert!(handle.is_valid());
        handle.reset();
        assert!(!handle.is_valid());
        handle.reset();
        assert!(!handle.is_valid());
        assert_eq!(handle.size_bits(), 0);
        assert_eq!(handle.algorithm(), KeyAlgorithm::None);
    }

    #[test]
    fn test_empty_handle_introspection_defaults() {
        let handle = KeyHandle::new();
        assert_eq!(handle.size_bits(), 0);
        assert_eq!(handle.size_bytes(), 0);
        assert_eq!(handle.algorithm_name(), "NONE");
        assert!(!handle.supports(KeyAlgorithm::Rsa));
        assert!(!handle.has_private_key());
    }

    #[test]
    fn test_empty_handle_operations_return_no_key() {
        let mut handle = KeyHandle::new();
        assert!(matches!(
            handle.sign(b"message", HashAlgorithm::Sha256),
            Err(Error::NoKey)
        ));
        assert!(matches!(
            handle.verify(b"message", b"sig", HashAlgorithm::Sha256),
            Err(Error::NoKey)
        ));
        assert!(matches!(handle.encrypt(b"data"), Err(Error::NoKey)));
        assert!(matches!(handle.decrypt(b"data"), Err(Error::NoKey)));
        assert!(matches!(handle.public_key_der(), Err(Error::NoKey)));
    }

    #[test]
    fn test_tag_bound_but_empty_handle() {
        // A handle with a bound tag but no parsed material is valid yet
        // cannot operate.
        let mut handle = KeyHandle::with_algorithm(KeyAlgorithm::Rsa);
        assert!(handle.is_valid());
        assert!(matches!(
            handle.sign(b"message", HashAlgorithm::Sha256),
            Err(Error::NoKey)
        ));
    }

    #[test]
    fn test_prepare_passthrough_for_short_raw_message() {
        let handle = KeyHandle::generate_ec_p256().unwrap();
        assert_eq!(handle.size_bytes(), 32);

        let message = [7u8; 31];
        let prepared = handle.prepare(&message, HashAlgorithm::None).unwrap();
        assert_eq!(prepared, message.to_vec());
    }

    #[test]
    fn test_prepare_rejects_oversized_raw_message() {
        let handle = KeyHandle::generate_ec_p256().unwrap();
        let message = [7u8; 32];
        assert!(matches!(
            handle.prepare(&message, HashAlgorithm::None),
            Err(Error::OversizedInput { len: 32, max: 32 })
        ));
    }

    #[test]
    fn test_prepare_hashes_regardless_of_length() {
        let handle = KeyHandle::generate_ec_p256().unwrap();
        let short = handle.prepare(b"x", HashAlgorithm::Sha256).unwrap();
        let long = handle.prepare(&[0u8; 4096], HashAlgorithm::Sha256).unwrap();
        assert_eq!(short.len(), 32);
        assert_eq!(long.len(), 32);
        assert_eq!(short, crate::hash::sha256(b"x").to_vec());
    }

    #[test]
    fn test_supports_matrix_for_ec_key() {
        let handle = KeyHandle::generate_ec_p256().unwrap();
        assert!(handle.supports(KeyAlgorithm::EcKey));
        assert!(handle.supports(KeyAlgorithm::EcKeyDh));
        assert!(handle.supports(KeyAlgorithm::Ecdsa));
        assert!(!handle.supports(KeyAlgorithm::Rsa));
        assert!(!handle.supports(KeyAlgorithm::None));
    }

    #[test]
    fn test_generated_p256_sign_verify_roundtrip() {
        let mut handle = KeyHandle::generate_ec_p256().unwrap();
        assert_eq!(handle.algorithm(), KeyAlgorithm::EcKey);
        assert_eq!(handle.size_bits(), 256);

        let sig = handle.sign(b"payload", HashAlgorithm::Sha256).unwrap();
        assert!(!sig.is_empty());
        handle
            .verify(b"payload", sig.as_bytes(), HashAlgorithm::Sha256)
            .unwrap();
        assert!(handle
            .verify(b"other payload", sig.as_bytes(), HashAlgorithm::Sha256)
            .is_err());
    }

    #[test]
    fn test_generated_p384_sign_verify_roundtrip() {
        let mut handle = KeyHandle::generate_ec_p384().unwrap();
        assert_eq!(handle.size_bits(), 384);

        let sig = handle.sign(b"payload", HashAlgorithm::Sha384).unwrap();
        handle
            .verify(b"payload", sig.as_bytes(), HashAlgorithm::Sha384)
            .unwrap();
    }

    #[test]
    fn test_public_only_handle_cannot_sign() {
        let handle = KeyHandle::generate_ec_p256().unwrap();
        let der = handle.public_key_der().unwrap();

        let mut public_only = KeyHandle::new();
        public_only.parse_public_key(der.as_bytes()).unwrap();
        assert!(public_only.is_valid());
        assert!(!public_only.has_private_key());
        assert!(matches!(
            public_only.sign(b"message", HashAlgorithm::Sha256),
            Err(Error::Signing(_))
        ));
    }

    #[test]
    fn test_public_export_roundtrip_verifies() {
        let mut signer = KeyHandle::generate_ec_p256().unwrap();
        let sig = signer.sign(b"exported", HashAlgorithm::Sha256).unwrap();

        let pem = signer.public_key_pem().unwrap();
        let mut verifier = KeyHandle::new();
        verifier.parse_public_key(pem.as_str().as_bytes()).unwrap();
        verifier
            .verify(b"exported", sig.as_bytes(), HashAlgorithm::Sha256)
            .unwrap();
    }

    #[test]
    fn test_parse_garbage_leaves_handle_empty() {
        let mut handle = KeyHandle::new();
        assert!(handle.parse_private_key(b"not a key at all", None).is_err());
        assert!(!handle.is_valid());
        assert!(handle.parse_public_key(&[0xde, 0xad, 0xbe, 0xef]).is_err());
        assert!(!handle.is_valid());
    }

    #[test]
    fn test_parse_empty_input_fails() {
        let mut handle = KeyHandle::new();
        assert!(handle.parse_private_key(&[], None).is_err());
        assert!(!handle.is_valid());
    }
}
