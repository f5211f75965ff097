//! Common error types for the messaging pipeline.
//!
//! Every variant names the offending parameter. None of them ever carries
//! key material, IVs, plaintext or digests.

use std::fmt;

use thiserror::Error;

/// Why a parameter was rejected before any sensitive operation ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    /// Cipher name is not in the supported allow-list.
    UnsupportedCipher(String),
    /// IV length does not match what the cipher requires.
    InvalidIvLength { expected: usize, actual: usize },
    /// Key length does not match what the cipher requires.
    InvalidKeyLength { expected: usize, actual: usize },
    /// Key was refused by the primitive it was handed to.
    InvalidKey(String),
    /// Hash algorithm is not available for HMAC.
    UnsupportedHashAlgorithm(String),
    /// An instruction received a payload of a kind it does not accept.
    UnexpectedPayload {
        expected: &'static str,
        actual: &'static str,
    },
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedCipher(name) => write!(f, "unsupported cipher '{}'", name),
            Self::InvalidIvLength { expected, actual } => write!(
                f,
                "invalid IV length: expected {} bytes, got {}",
                expected, actual
            ),
            Self::InvalidKeyLength { expected, actual } => write!(
                f,
                "invalid key length: expected {} bytes, got {}",
                expected, actual
            ),
            Self::InvalidKey(message) => write!(f, "key rejected: {}", message),
            Self::UnsupportedHashAlgorithm(name) => {
                write!(f, "unsupported hash algorithm '{}'", name)
            }
            Self::UnexpectedPayload { expected, actual } => {
                write!(f, "expected {} payload, got {}", expected, actual)
            }
        }
    }
}

/// Coarse classification of [`Error`], handy for matching in callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Decode,
    Decryption,
    Verification,
    Pipeline,
}

/// Top-level error type for pipeline operations.
///
/// All errors are terminal for the message being processed. Retrying is the
/// consumer's decision, not ours.
#[derive(Debug, Error)]
pub enum Error {
    /// A parameter was rejected before any cryptographic work started.
    #[error("Invalid {parameter}: {reason}")]
    Validation {
        parameter: String,
        reason: ValidationFailure,
    },

    /// The transport encoding of the payload was malformed.
    #[error("Cannot decode {parameter}: {message}")]
    Decode { parameter: String, message: String },

    /// Decryption failed or produced nothing usable.
    #[error("Cannot decrypt {parameter}: {message}")]
    Decryption { parameter: String, message: String },

    /// HMAC did not match; the message has probably been tampered with.
    #[error("HMAC verification failed for {parameter}")]
    Verification { parameter: String },

    /// The instruction chain itself was misused.
    #[error("Pipeline error: {0}")]
    Pipeline(String),
}

impl Error {
    /// Build a validation error for `parameter`.
    pub fn validation(parameter: impl Into<String>, reason: ValidationFailure) -> Self {
        Self::Validation {
            parameter: parameter.into(),
            reason,
        }
    }

    /// Build a decode error for `parameter`.
    pub fn decode(parameter: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Decode {
            parameter: parameter.into(),
            message: message.to_string(),
        }
    }

    /// Build a decryption error for `parameter`.
    pub fn decryption(parameter: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Decryption {
            parameter: parameter.into(),
            message: message.to_string(),
        }
    }

    /// Build a verification error for `parameter`.
    pub fn verification(parameter: impl Into<String>) -> Self {
        Self::Verification {
            parameter: parameter.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::Decryption { .. } => ErrorKind::Decryption,
            Self::Verification { .. } => ErrorKind::Verification,
            Self::Pipeline(_) => ErrorKind::Pipeline,
        }
    }

    /// Name of the offending parameter, if the error is attributable to one.
    pub fn parameter(&self) -> Option<&str> {
        match self {
            Self::Validation { parameter, .. }
            | Self::Decode { parameter, .. }
            | Self::Decryption { parameter, .. }
            | Self::Verification { parameter } => Some(parameter),
            Self::Pipeline(_) => None,
        }
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
