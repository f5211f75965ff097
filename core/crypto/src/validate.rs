//! Parameter guards run before any cryptographic call.
//!
//! Raw-mode ciphers turn a wrong-length IV into garbage plaintext rather
//! than an error, so lengths are checked here and attributed to a named
//! parameter.

use tracing::trace;

use msgpipe_common::{Error, Result, ValidationFailure};

use crate::cipher::{lookup_cipher, CipherDescriptor};

/// Reject cipher names that are not in the supported allow-list.
///
/// # Postconditions
/// - Returns the descriptor for the cipher on success
///
/// # Errors
/// - `Validation` naming `parameter` if the cipher is unsupported
pub fn require_valid_cipher(name: &str, parameter: &str) -> Result<&'static CipherDescriptor> {
    match lookup_cipher(name) {
        Some(descriptor) => {
            trace!("cipher accepted: {}", descriptor.name);
            Ok(descriptor)
        }
        None => Err(Error::validation(
            parameter,
            ValidationFailure::UnsupportedCipher(name.to_string()),
        )),
    }
}

/// Reject IVs whose length differs from what `cipher` requires.
///
/// # Errors
/// - `Validation` naming `parameter` on a length mismatch
pub fn require_valid_iv(cipher: &CipherDescriptor, iv: &[u8], parameter: &str) -> Result<()> {
    if iv.len() != cipher.iv_len {
        return Err(Error::validation(
            parameter,
            ValidationFailure::InvalidIvLength {
                expected: cipher.iv_len,
                actual: iv.len(),
            },
        ));
    }
    Ok(())
}

/// Reject keys whose length differs from what `cipher` requires.
///
/// OpenSSL zero-pads short keys without complaint; we refuse them instead.
///
/// # Errors
/// - `Validation` naming `parameter` on a length mismatch
pub fn require_valid_key(cipher: &CipherDescriptor, key: &[u8], parameter: &str) -> Result<()> {
    if key.len() != cipher.key_len {
        return Err(Error::validation(
            parameter,
            ValidationFailure::InvalidKeyLength {
                expected: cipher.key_len,
                actual: key.len(),
            },
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::supported_ciphers;
    use msgpipe_common::ErrorKind;
    use proptest::prelude::*;

    #[test]
    fn test_rot13_is_rejected() {
        let err = require_valid_cipher("rot13", "cipher").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.parameter(), Some("cipher"));
        assert!(err.to_string().contains("rot13"));
    }

    #[test]
    fn test_supported_cipher_is_accepted() {
        let descriptor = require_valid_cipher("Aes-128-Ctr", "cipher").unwrap();
        assert_eq!(descriptor.name, "aes-128-ctr");
    }

    #[test]
    fn test_iv_length() {
        let cipher = require_valid_cipher("aes-256-cbc", "cipher").unwrap();
        assert!(require_valid_iv(cipher, &[0u8; 16], "iv").is_ok());

        let err = require_valid_iv(cipher, &[0u8; 12], "iv").unwrap_err();
        assert_eq!(err.parameter(), Some("iv"));
        match err {
            Error::Validation {
                reason: ValidationFailure::InvalidIvLength { expected, actual },
                ..
            } => {
                assert_eq!(expected, 16);
                assert_eq!(actual, 12);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_key_length() {
        let cipher = require_valid_cipher("aes-192-cbc", "cipher").unwrap();
        assert!(require_valid_key(cipher, &[0u8; 24], "key").is_ok());

        let err = require_valid_key(cipher, &[0u8; 32], "key").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.parameter(), Some("key"));
    }

    proptest! {
        #[test]
        fn prop_wrong_iv_length_is_rejected(
            index in 0usize..6,
            len in 0usize..64,
        ) {
            let cipher = &supported_ciphers()[index];
            prop_assume!(len != cipher.iv_len);
            let iv = vec![0u8; len];
            let err = require_valid_iv(cipher, &iv, "iv").unwrap_err();
            prop_assert_eq!(err.kind(), ErrorKind::Validation);
        }

        #[test]
        fn prop_unlisted_names_are_rejected(name in "[a-z0-9-]{1,16}") {
            prop_assume!(lookup_cipher(&name).is_none());
            prop_assert!(require_valid_cipher(&name, "cipher").is_err());
        }
    }
}
