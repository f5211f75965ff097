use std::fmt;

use msgpipe_common::{Error, Payload, Result};
use msgpipe_crypto::{require_valid_hash_algorithm, verify_hmac, HashAlgorithm, SecretKey};

use crate::instruction::{Instruction, InstructionKind, Next};

/// Checks the HMAC trailing a binary payload and passes the message on.
///
/// Payload layout is `message || digest`, where the digest length is fixed
/// by the hash algorithm.
pub struct VerifyPayloadHmac {
    algorithm: HashAlgorithm,
    secret: SecretKey,
}

impl VerifyPayloadHmac {
    /// Create the step.
    ///
    /// # Errors
    /// - `Validation` naming `hash_algo` if the algorithm is unsupported
    pub fn new(hash_algo: &str, secret: SecretKey) -> Result<Self> {
        let algorithm = require_valid_hash_algorithm(hash_algo, "hash_algo")?;
        Ok(Self { algorithm, secret })
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }
}

impl fmt::Debug for VerifyPayloadHmac {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifyPayloadHmac")
            .field("algorithm", &self.algorithm)
            .field("secret", &self.secret)
            .finish()
    }
}

impl Instruction for VerifyPayloadHmac {
    fn name(&self) -> &'static str {
        "verify-hmac"
    }

    fn kind(&self) -> InstructionKind {
        InstructionKind::BytesInBytesOut
    }

    fn invoke(&self, next: &dyn Next, payload: Payload) -> Result<Payload> {
        let mut message = payload.into_bytes("payload")?;

        let digest_len = self.algorithm.digest_len();
        if message.len() < digest_len {
            return Err(Error::verification("payload"));
        }
        let digest = message.split_off(message.len() - digest_len);

        verify_hmac(
            &message,
            "payload",
            &digest,
            self.algorithm.name(),
            self.secret.as_bytes(),
        )?;

        next.process(Payload::Bytes(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use msgpipe_common::ErrorKind;
    use msgpipe_crypto::calculate_hmac;
    use std::cell::Cell;

    fn signed(message: &[u8], secret: &[u8]) -> Vec<u8> {
        let mut out = message.to_vec();
        out.extend(calculate_hmac(message, "sha256", secret).unwrap());
        out
    }

    fn identity(payload: Payload) -> Result<Payload> {
        Ok(payload)
    }

    #[test]
    fn test_passes_message_on() {
        let step = VerifyPayloadHmac::new("sha256", SecretKey::from_slice(b"k")).unwrap();
        let out = step
            .invoke(&identity, Payload::Bytes(signed(b"hello", b"k")))
            .unwrap();
        assert_eq!(out, Payload::Bytes(b"hello".to_vec()));
    }

    #[test]
    fn test_tampered_message_stops_chain() {
        let step = VerifyPayloadHmac::new("sha256", SecretKey::from_slice(b"k")).unwrap();
        let mut payload = signed(b"hello", b"k");
        payload[0] ^= 0x20;

        let called = Cell::new(false);
        let next = |payload: Payload| -> Result<Payload> {
            called.set(true);
            Ok(payload)
        };

        let err = step.invoke(&next, Payload::Bytes(payload)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Verification);
        assert_eq!(err.parameter(), Some("payload"));
        assert!(!called.get());
    }

    #[test]
    fn test_wrong_secret() {
        let step = VerifyPayloadHmac::new("sha256", SecretKey::from_slice(b"other")).unwrap();
        let err = step
            .invoke(&identity, Payload::Bytes(signed(b"hello", b"k")))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Verification);
    }

    #[test]
    fn test_payload_shorter_than_digest() {
        let step = VerifyPayloadHmac::new("sha512", SecretKey::from_slice(b"k")).unwrap();
        let err = step
            .invoke(&identity, Payload::Bytes(vec![0u8; 10]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Verification);
    }

    #[test]
    fn test_unsupported_algorithm_rejected_up_front() {
        let err = VerifyPayloadHmac::new("md5", SecretKey::from_slice(b"k")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.parameter(), Some("hash_algo"));
    }

    #[test]
    fn test_debug_hides_secret() {
        let step = VerifyPayloadHmac::new("sha256", SecretKey::from_slice(b"hunter2")).unwrap();
        assert!(!format!("{:?}", step).contains("hunter2"));
    }
}
