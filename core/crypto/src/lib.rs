//! Cryptographic primitives for the messaging pipeline.
//!
//! This module provides:
//! - A fixed allow-list of symmetric ciphers and the guards that enforce it
//! - Decryption of raw binary ciphertext behind a swappable backend
//! - HMAC calculation and constant-time verification
//! - Key material with automatic zeroization
//!
//! # Security Guarantees
//! - Cipher, IV and key lengths are validated before the cipher library runs
//! - No plaintext, key material or digest is ever logged or put in an error
//! - Digest comparison is constant-time

pub mod cipher;
pub mod keys;
pub mod mac;
pub mod symmetric;
pub mod validate;

pub use cipher::{
    lookup_cipher, required_iv_length, supported_ciphers, CipherDescriptor, CipherMode,
};
pub use keys::SecretKey;
pub use mac::{calculate_hmac, require_valid_hash_algorithm, verify_hmac, HashAlgorithm};
pub use symmetric::{
    decrypt_string, decrypt_string_with, encrypt_string, generate_iv, BackendError,
    RustCryptoBackend, SymmetricBackend,
};
pub use validate::{require_valid_cipher, require_valid_iv, require_valid_key};
