//! Shared vocabulary for the keybox public-key engine
//!
//! This crate provides the algorithm identifiers and type-safe wrappers for
//! encoded data (DER bytes, PEM text, signatures) used across the keybox
//! crates.

pub mod algorithm;
pub mod encoding;

pub use algorithm::{HashAlgorithm, KeyAlgorithm};
pub use encoding::{DerBytes, PublicKeyPem, Signature};
