//! Symmetric decryption of raw binary ciphertext.
//!
//! Ciphertext and plaintext are handled as raw bytes (no base64 layer). The
//! cipher library is reached through [`SymmetricBackend`], and every failure
//! it reports comes back as an explicit `Result`; there is no global
//! error-capture state.

use aes::{Aes128, Aes192, Aes256};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use ctr::cipher::StreamCipher;
use rand::RngCore;
use tracing::{debug, warn};

use msgpipe_common::{Error, Result};

use crate::cipher::{CipherDescriptor, CipherMode, AES_BLOCK_SIZE};
use crate::validate::{require_valid_cipher, require_valid_iv, require_valid_key};

/// Low-level failure reported by a cipher backend.
///
/// The message describes what went wrong and never includes key, IV or
/// plaintext bytes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct BackendError(String);

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Seam between the pipeline and the symmetric cipher library.
///
/// Implementations receive parameters that have already been validated
/// against the cipher descriptor.
pub trait SymmetricBackend: Send + Sync {
    /// Decrypt `ciphertext` with `cipher`, `key` and `iv`.
    fn decrypt(
        &self,
        cipher: &CipherDescriptor,
        key: &[u8],
        iv: &[u8],
        ciphertext: &[u8],
    ) -> std::result::Result<Vec<u8>, BackendError>;

    /// Encrypt `plaintext` with `cipher`, `key` and `iv`.
    fn encrypt(
        &self,
        cipher: &CipherDescriptor,
        key: &[u8],
        iv: &[u8],
        plaintext: &[u8],
    ) -> std::result::Result<Vec<u8>, BackendError>;
}

/// Backend built on the RustCrypto `aes`, `cbc` and `ctr` crates.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustCryptoBackend;

macro_rules! cbc_decrypt {
    ($aes:ty, $key:expr, $iv:expr, $data:expr) => {
        cbc::Decryptor::<$aes>::new_from_slices($key, $iv)
            .map_err(|e| BackendError::new(format!("cipher setup failed: {}", e)))?
            .decrypt_padded_vec_mut::<Pkcs7>($data)
            .map_err(|_| BackendError::new("bad decrypt: invalid padding"))
    };
}

macro_rules! cbc_encrypt {
    ($aes:ty, $key:expr, $iv:expr, $data:expr) => {
        Ok(cbc::Encryptor::<$aes>::new_from_slices($key, $iv)
            .map_err(|e| BackendError::new(format!("cipher setup failed: {}", e)))?
            .encrypt_padded_vec_mut::<Pkcs7>($data))
    };
}

macro_rules! ctr_apply {
    ($aes:ty, $key:expr, $iv:expr, $data:expr) => {{
        let mut cipher = ctr::Ctr128BE::<$aes>::new_from_slices($key, $iv)
            .map_err(|e| BackendError::new(format!("cipher setup failed: {}", e)))?;
        let mut buffer = $data.to_vec();
        cipher
            .try_apply_keystream(&mut buffer)
            .map_err(|_| BackendError::new("keystream exhausted"))?;
        Ok(buffer)
    }};
}

impl SymmetricBackend for RustCryptoBackend {
    fn decrypt(
        &self,
        cipher: &CipherDescriptor,
        key: &[u8],
        iv: &[u8],
        ciphertext: &[u8],
    ) -> std::result::Result<Vec<u8>, BackendError> {
        match cipher.mode {
            CipherMode::Cbc => {
                if ciphertext.is_empty() || ciphertext.len() % AES_BLOCK_SIZE != 0 {
                    return Err(BackendError::new(format!(
                        "wrong final block length: {} bytes is not a positive multiple of {}",
                        ciphertext.len(),
                        AES_BLOCK_SIZE
                    )));
                }
                match cipher.key_len {
                    16 => cbc_decrypt!(Aes128, key, iv, ciphertext),
                    24 => cbc_decrypt!(Aes192, key, iv, ciphertext),
                    32 => cbc_decrypt!(Aes256, key, iv, ciphertext),
                    other => Err(unsupported_key_size(other)),
                }
            }
            CipherMode::Ctr => match cipher.key_len {
                16 => ctr_apply!(Aes128, key, iv, ciphertext),
                24 => ctr_apply!(Aes192, key, iv, ciphertext),
                32 => ctr_apply!(Aes256, key, iv, ciphertext),
                other => Err(unsupported_key_size(other)),
            },
        }
    }

    fn encrypt(
        &self,
        cipher: &CipherDescriptor,
        key: &[u8],
        iv: &[u8],
        plaintext: &[u8],
    ) -> std::result::Result<Vec<u8>, BackendError> {
        match cipher.mode {
            CipherMode::Cbc => match cipher.key_len {
                16 => cbc_encrypt!(Aes128, key, iv, plaintext),
                24 => cbc_encrypt!(Aes192, key, iv, plaintext),
                32 => cbc_encrypt!(Aes256, key, iv, plaintext),
                other => Err(unsupported_key_size(other)),
            },
            CipherMode::Ctr => match cipher.key_len {
                16 => ctr_apply!(Aes128, key, iv, plaintext),
                24 => ctr_apply!(Aes192, key, iv, plaintext),
                32 => ctr_apply!(Aes256, key, iv, plaintext),
                other => Err(unsupported_key_size(other)),
            },
        }
    }
}

fn unsupported_key_size(len: usize) -> BackendError {
    BackendError::new(format!("no AES variant with a {}-byte key", len))
}

/// Decrypt a previously encrypted string with the default backend.
///
/// See [`decrypt_string_with`].
pub fn decrypt_string(
    ciphertext: &[u8],
    field_name: &str,
    cipher: &str,
    key: &[u8],
    iv: &[u8],
) -> Result<Vec<u8>> {
    decrypt_string_with(&RustCryptoBackend, ciphertext, field_name, cipher, key, iv)
}

/// Decrypt a previously encrypted string.
///
/// # Preconditions
/// - `cipher` must be a supported cipher name
/// - `iv` and `key` must have the lengths that cipher requires
///
/// All three are checked before `backend` is called.
///
/// # Postconditions
/// - Returns the non-empty plaintext
///
/// # Errors
/// - `Validation` naming `cipher`, `iv` or `key` if a precondition fails
/// - `Decryption` naming `field_name` if the backend reports a failure or
///   produces an empty plaintext
pub fn decrypt_string_with(
    backend: &dyn SymmetricBackend,
    ciphertext: &[u8],
    field_name: &str,
    cipher: &str,
    key: &[u8],
    iv: &[u8],
) -> Result<Vec<u8>> {
    let descriptor = require_valid_cipher(cipher, "cipher")?;
    require_valid_iv(descriptor, iv, "iv")?;
    require_valid_key(descriptor, key, "key")?;

    debug!(
        "decrypting {}: cipher={}, len={}",
        field_name,
        descriptor.name,
        ciphertext.len()
    );

    let plaintext = backend
        .decrypt(descriptor, key, iv, ciphertext)
        .map_err(|e| {
            warn!("decryption failed for {}: {}", field_name, e);
            Error::decryption(field_name, e)
        })?;

    if plaintext.is_empty() {
        warn!("decryption of {} produced no plaintext", field_name);
        return Err(Error::decryption(field_name, "decryption produced an empty result"));
    }

    Ok(plaintext)
}

/// Encrypt `plaintext` so that [`decrypt_string`] can recover it.
///
/// # Errors
/// - `Validation` naming `cipher`, `iv` or `key` if a precondition fails
/// - `Decryption` naming `field_name` if the backend fails
pub fn encrypt_string(
    plaintext: &[u8],
    field_name: &str,
    cipher: &str,
    key: &[u8],
    iv: &[u8],
) -> Result<Vec<u8>> {
    let descriptor = require_valid_cipher(cipher, "cipher")?;
    require_valid_iv(descriptor, iv, "iv")?;
    require_valid_key(descriptor, key, "key")?;

    RustCryptoBackend
        .encrypt(descriptor, key, iv, plaintext)
        .map_err(|e| Error::decryption(field_name, e))
}

/// Generate a random IV of the length `cipher` requires.
///
/// # Errors
/// - `Validation` naming `cipher` if the cipher is unsupported
pub fn generate_iv(cipher: &str) -> Result<Vec<u8>> {
    let descriptor = require_valid_cipher(cipher, "cipher")?;
    let mut iv = vec![0u8; descriptor.iv_len];
    rand::rng().fill_bytes(&mut iv);
    Ok(iv)
}
