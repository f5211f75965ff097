//! Supported symmetric ciphers.
//!
//! The allow-list is fixed at compile time. Anything not listed here is
//! rejected before the cipher library is touched.

use std::fmt;

/// AES block size, which is also the IV length for every supported mode.
pub const AES_BLOCK_SIZE: usize = 16;

/// Block cipher mode of operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherMode {
    /// Cipher block chaining with PKCS#7 padding.
    Cbc,
    /// Counter mode, big-endian 128-bit counter. No padding.
    Ctr,
}

/// Static description of a supported cipher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CipherDescriptor {
    /// Canonical (OpenSSL-style) lowercase name.
    pub name: &'static str,
    /// Required key length in bytes.
    pub key_len: usize,
    /// Required IV length in bytes.
    pub iv_len: usize,
    pub mode: CipherMode,
}

impl fmt::Display for CipherDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

const fn aes(name: &'static str, key_len: usize, mode: CipherMode) -> CipherDescriptor {
    CipherDescriptor {
        name,
        key_len,
        iv_len: AES_BLOCK_SIZE,
        mode,
    }
}

static SUPPORTED_CIPHERS: [CipherDescriptor; 6] = [
    aes("aes-128-cbc", 16, CipherMode::Cbc),
    aes("aes-192-cbc", 24, CipherMode::Cbc),
    aes("aes-256-cbc", 32, CipherMode::Cbc),
    aes("aes-128-ctr", 16, CipherMode::Ctr),
    aes("aes-192-ctr", 24, CipherMode::Ctr),
    aes("aes-256-ctr", 32, CipherMode::Ctr),
];

/// Every cipher this crate will decrypt with.
pub fn supported_ciphers() -> &'static [CipherDescriptor] {
    &SUPPORTED_CIPHERS
}

/// Look up a cipher by name. Matching ignores ASCII case, like OpenSSL.
pub fn lookup_cipher(name: &str) -> Option<&'static CipherDescriptor> {
    SUPPORTED_CIPHERS
        .iter()
        .find(|descriptor| descriptor.name.eq_ignore_ascii_case(name))
}

/// IV length the named cipher mandates, or `None` if it is not supported.
pub fn required_iv_length(name: &str) -> Option<usize> {
    lookup_cipher(name).map(|descriptor| descriptor.iv_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let lower = lookup_cipher("aes-256-cbc").unwrap();
        let upper = lookup_cipher("AES-256-CBC").unwrap();
        assert_eq!(lower, upper);
        assert_eq!(lower.key_len, 32);
        assert_eq!(lower.mode, CipherMode::Cbc);
    }

    #[test]
    fn test_unknown_cipher() {
        assert!(lookup_cipher("rot13").is_none());
        assert!(lookup_cipher("").is_none());
        assert!(lookup_cipher("aes-256-gcm").is_none());
        assert_eq!(required_iv_length("rot13"), None);
    }

    #[test]
    fn test_required_iv_length() {
        for descriptor in supported_ciphers() {
            assert_eq!(required_iv_length(descriptor.name), Some(16));
        }
    }

    #[test]
    fn test_names_are_unique() {
        let ciphers = supported_ciphers();
        for (i, a) in ciphers.iter().enumerate() {
            for b in &ciphers[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }
}
