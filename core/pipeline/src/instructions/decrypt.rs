use std::fmt;
use std::sync::Arc;

use msgpipe_common::{Error, Payload, Result, ValidationFailure};
use msgpipe_crypto::{
    decrypt_string_with, require_valid_cipher, require_valid_iv, require_valid_key,
    CipherDescriptor, RustCryptoBackend, SecretKey, SymmetricBackend,
};

use crate::instruction::{Instruction, InstructionKind, Next};

/// Where a message's IV comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum IvSource {
    /// One IV configured for every message.
    Fixed(Vec<u8>),
    /// The first IV-length bytes of each payload.
    Prefixed,
}

impl fmt::Debug for IvSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(iv) => write!(f, "Fixed({} bytes)", iv.len()),
            Self::Prefixed => write!(f, "Prefixed"),
        }
    }
}

/// Decrypts a binary payload and passes the plaintext on.
pub struct DecryptPayload {
    cipher: &'static CipherDescriptor,
    key: SecretKey,
    iv: IvSource,
    backend: Arc<dyn SymmetricBackend>,
}

impl DecryptPayload {
    /// Create the step.
    ///
    /// # Errors
    /// - `Validation` naming `cipher`, `key` or `iv` if the cipher is
    ///   unsupported, or the key or a fixed IV has the wrong length
    pub fn new(cipher: &str, key: SecretKey, iv: IvSource) -> Result<Self> {
        let cipher = require_valid_cipher(cipher, "cipher")?;
        require_valid_key(cipher, key.as_bytes(), "key")?;
        if let IvSource::Fixed(iv) = &iv {
            require_valid_iv(cipher, iv, "iv")?;
        }

        Ok(Self {
            cipher,
            key,
            iv,
            backend: Arc::new(RustCryptoBackend),
        })
    }

    /// Use a different cipher backend.
    pub fn with_backend(mut self, backend: Arc<dyn SymmetricBackend>) -> Self {
        self.backend = backend;
        self
    }

    pub fn cipher(&self) -> &'static CipherDescriptor {
        self.cipher
    }
}

impl fmt::Debug for DecryptPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecryptPayload")
            .field("cipher", &self.cipher.name)
            .field("key", &self.key)
            .field("iv", &self.iv)
            .finish()
    }
}

impl Instruction for DecryptPayload {
    fn name(&self) -> &'static str {
        "decrypt"
    }

    fn kind(&self) -> InstructionKind {
        InstructionKind::BytesInBytesOut
    }

    fn invoke(&self, next: &dyn Next, payload: Payload) -> Result<Payload> {
        let bytes = payload.into_bytes("payload")?;

        let (iv, ciphertext) = match &self.iv {
            IvSource::Fixed(iv) => (iv.as_slice(), bytes.as_slice()),
            IvSource::Prefixed => {
                if bytes.len() < self.cipher.iv_len {
                    return Err(Error::validation(
                        "iv",
                        ValidationFailure::InvalidIvLength {
                            expected: self.cipher.iv_len,
                            actual: bytes.len(),
                        },
                    ));
                }
                let (iv, ciphertext) = bytes.split_at(self.cipher.iv_len);
                (iv, ciphertext)
            }
        };

        let plaintext = decrypt_string_with(
            self.backend.as_ref(),
            ciphertext,
            "payload",
            self.cipher.name,
            self.key.as_bytes(),
            iv,
        )?;

        next.process(Payload::Bytes(plaintext))
    }
}
