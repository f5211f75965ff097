//! Keyed-hash message authentication.
//!
//! Verification recomputes the HMAC and compares it with the expected digest
//! in constant time, so the comparison does not reveal how many leading
//! bytes matched.

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::{Sha224, Sha256, Sha384, Sha512, Sha512_224, Sha512_256};
use sha3::{Sha3_224, Sha3_256, Sha3_384, Sha3_512};
use subtle::ConstantTimeEq;
use tracing::{trace, warn};

use msgpipe_common::{Error, Result, ValidationFailure};

/// Hash functions available for HMAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    Sha512_224,
    Sha512_256,
    Sha3_224,
    Sha3_256,
    Sha3_384,
    Sha3_512,
}

// Canonical names first, then accepted aliases.
const NAMES: [(&str, HashAlgorithm); 16] = [
    ("sha224", HashAlgorithm::Sha224),
    ("sha256", HashAlgorithm::Sha256),
    ("sha384", HashAlgorithm::Sha384),
    ("sha512", HashAlgorithm::Sha512),
    ("sha512/224", HashAlgorithm::Sha512_224),
    ("sha512/256", HashAlgorithm::Sha512_256),
    ("sha3-224", HashAlgorithm::Sha3_224),
    ("sha3-256", HashAlgorithm::Sha3_256),
    ("sha3-384", HashAlgorithm::Sha3_384),
    ("sha3-512", HashAlgorithm::Sha3_512),
    ("sha-224", HashAlgorithm::Sha224),
    ("sha-256", HashAlgorithm::Sha256),
    ("sha-384", HashAlgorithm::Sha384),
    ("sha-512", HashAlgorithm::Sha512),
    ("sha-512/224", HashAlgorithm::Sha512_224),
    ("sha-512/256", HashAlgorithm::Sha512_256),
];

impl HashAlgorithm {
    /// Every supported algorithm.
    pub const ALL: [HashAlgorithm; 10] = [
        HashAlgorithm::Sha224,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha384,
        HashAlgorithm::Sha512,
        HashAlgorithm::Sha512_224,
        HashAlgorithm::Sha512_256,
        HashAlgorithm::Sha3_224,
        HashAlgorithm::Sha3_256,
        HashAlgorithm::Sha3_384,
        HashAlgorithm::Sha3_512,
    ];

    /// Look up an algorithm by name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        NAMES
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, algorithm)| *algorithm)
    }

    /// Canonical lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sha224 => "sha224",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
            Self::Sha512_224 => "sha512/224",
            Self::Sha512_256 => "sha512/256",
            Self::Sha3_224 => "sha3-224",
            Self::Sha3_256 => "sha3-256",
            Self::Sha3_384 => "sha3-384",
            Self::Sha3_512 => "sha3-512",
        }
    }

    /// Digest length in bytes.
    pub fn digest_len(&self) -> usize {
        match self {
            Self::Sha224 | Self::Sha512_224 | Self::Sha3_224 => 28,
            Self::Sha256 | Self::Sha512_256 | Self::Sha3_256 => 32,
            Self::Sha384 | Self::Sha3_384 => 48,
            Self::Sha512 | Self::Sha3_512 => 64,
        }
    }

    /// Compute the HMAC of `message` under `secret`.
    ///
    /// # Errors
    /// - `Validation` naming `key` if the MAC refuses the secret
    pub fn mac(&self, message: &[u8], secret: &[u8]) -> Result<Vec<u8>> {
        macro_rules! hmac_with {
            ($hash:ty) => {{
                let mut mac = Hmac::<$hash>::new_from_slice(secret).map_err(|e| {
                    Error::validation("key", ValidationFailure::InvalidKey(e.to_string()))
                })?;
                mac.update(message);
                Ok(mac.finalize().into_bytes().to_vec())
            }};
        }

        match self {
            Self::Sha224 => hmac_with!(Sha224),
            Self::Sha256 => hmac_with!(Sha256),
            Self::Sha384 => hmac_with!(Sha384),
            Self::Sha512 => hmac_with!(Sha512),
            Self::Sha512_224 => hmac_with!(Sha512_224),
            Self::Sha512_256 => hmac_with!(Sha512_256),
            Self::Sha3_224 => hmac_with!(Sha3_224),
            Self::Sha3_256 => hmac_with!(Sha3_256),
            Self::Sha3_384 => hmac_with!(Sha3_384),
            Self::Sha3_512 => hmac_with!(Sha3_512),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reject hash algorithm names we cannot compute an HMAC with.
///
/// # Errors
/// - `Validation` naming `parameter` if the algorithm is unsupported
pub fn require_valid_hash_algorithm(name: &str, parameter: &str) -> Result<HashAlgorithm> {
    HashAlgorithm::from_name(name).ok_or_else(|| {
        Error::validation(
            parameter,
            ValidationFailure::UnsupportedHashAlgorithm(name.to_string()),
        )
    })
}

/// Calculate the HMAC of `message` with the named hash algorithm.
///
/// # Errors
/// - `Validation` naming `hash_algo` if the algorithm is unsupported
pub fn calculate_hmac(message: &[u8], hash_algo: &str, secret: &[u8]) -> Result<Vec<u8>> {
    let algorithm = require_valid_hash_algorithm(hash_algo, "hash_algo")?;
    algorithm.mac(message, secret)
}

/// Make sure `expected_digest` is the HMAC of `message` under `secret`.
///
/// # Preconditions
/// - `hash_algo` must name a supported algorithm (checked before hashing)
///
/// # Postconditions
/// - Returns `Ok(())` only if the full digest matches
///
/// # Errors
/// - `Validation` naming `hash_algo` if the algorithm is unsupported
/// - `Verification` naming `field_name` on any mismatch, including a digest
///   of the wrong length
///
/// # Security
/// - Digest bytes are compared in constant time
/// - Neither digest nor the secret appears in errors or logs
pub fn verify_hmac(
    message: &[u8],
    field_name: &str,
    expected_digest: &[u8],
    hash_algo: &str,
    secret: &[u8],
) -> Result<()> {
    let algorithm = require_valid_hash_algorithm(hash_algo, "hash_algo")?;
    let actual = algorithm.mac(message, secret)?;

    if bool::from(actual.as_slice().ct_eq(expected_digest)) {
        trace!("HMAC verified for {} using {}", field_name, algorithm);
        Ok(())
    } else {
        warn!("HMAC mismatch for {} using {}", field_name, algorithm);
        Err(Error::verification(field_name))
    }
}
