//! Key material with secure memory handling.
//!
//! Keys are supplied and owned by the caller. This wrapper only makes sure
//! that the bytes are zeroized on drop and never show up in debug output.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Symmetric key or shared HMAC secret.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey {
    key: Vec<u8>,
}

impl SecretKey {
    /// Wrap raw key bytes.
    ///
    /// Length is not checked here; each operation validates it against
    /// what the chosen cipher requires.
    pub fn from_bytes(key: Vec<u8>) -> Self {
        Self { key }
    }

    /// Copy key bytes out of a borrowed slice.
    pub fn from_slice(key: &[u8]) -> Self {
        Self { key: key.to_vec() }
    }

    /// Get the key bytes.
    ///
    /// # Security
    /// The returned slice should be used immediately and not stored.
    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }

    pub fn len(&self) -> usize {
        self.key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_is_redacted() {
        let key = SecretKey::from_slice(b"super-secret");
        let debug = format!("{:?}", key);
        assert_eq!(debug, "SecretKey([REDACTED])");
        assert!(!debug.contains("super"));
    }

    #[test]
    fn test_as_bytes() {
        let key = SecretKey::from_bytes(vec![7u8; 32]);
        assert_eq!(key.len(), 32);
        assert!(!key.is_empty());
        assert_eq!(key.as_bytes(), &[7u8; 32][..]);
    }
}
