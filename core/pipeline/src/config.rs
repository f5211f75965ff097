//! Pipeline configuration.
//!
//! The configuration says which steps a consumer runs and with which
//! algorithms. Key material is deliberately not part of it; keys are handed
//! to [`PipelineConfig::build`] separately.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use tracing::info;

use msgpipe_common::{Error, Result, ValidationFailure};
use msgpipe_crypto::{
    require_valid_cipher, require_valid_hash_algorithm, require_valid_iv, SecretKey,
};

use crate::instructions::{
    DecodeBase64, DecodePayloadFromJson, DecryptPayload, IvSource, VerifyPayloadHmac,
};
use crate::pipeline::Pipeline;

/// How binary payloads are carried in queue messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportEncoding {
    /// Payloads arrive as raw bytes.
    Raw,
    /// Payloads arrive as standard base64 text.
    #[default]
    Base64,
}

/// Where the decryption step finds each message's IV.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum IvLayout {
    /// IV is the first block of each payload.
    #[default]
    Prefixed,
    /// One base64-encoded IV shared by every message.
    Fixed { iv: String },
}

/// Which steps to run, and with which algorithms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Transport encoding of incoming payloads.
    pub transport: TransportEncoding,
    /// HMAC algorithm; `None` skips verification.
    pub hash_algo: Option<String>,
    /// Cipher name; `None` skips decryption.
    pub cipher: Option<String>,
    /// IV location for the decryption step.
    pub iv: IvLayout,
    /// Decode the final plaintext as JSON.
    pub decode_json: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            transport: TransportEncoding::Base64,
            hash_algo: Some("sha256".to_string()),
            cipher: Some("aes-256-cbc".to_string()),
            iv: IvLayout::Prefixed,
            decode_json: true,
        }
    }
}

/// Key material for a pipeline, supplied and owned by the caller.
#[derive(Debug, Clone, Default)]
pub struct PipelineKeys {
    /// Symmetric key for the decryption step.
    pub encryption_key: Option<SecretKey>,
    /// Shared secret for the HMAC step.
    pub hmac_secret: Option<SecretKey>,
}

impl PipelineConfig {
    /// Check every algorithm name and the fixed IV, if any.
    ///
    /// # Errors
    /// - `Validation` naming `cipher`, `hash_algo` or `iv`
    pub fn validate(&self) -> Result<()> {
        if let Some(hash_algo) = &self.hash_algo {
            require_valid_hash_algorithm(hash_algo, "hash_algo")?;
        }
        if let Some(cipher) = &self.cipher {
            let descriptor = require_valid_cipher(cipher, "cipher")?;
            if let IvLayout::Fixed { .. } = &self.iv {
                require_valid_iv(descriptor, &self.fixed_iv()?, "iv")?;
            }
        }
        Ok(())
    }

    /// Assemble the chain this configuration describes.
    ///
    /// Steps run in this order, each one optional:
    /// base64 decode, HMAC verification, decryption, JSON decode.
    ///
    /// # Errors
    /// - `Validation` if the configuration is invalid, or a key the
    ///   configuration needs is missing or has the wrong length
    pub fn build(&self, keys: &PipelineKeys) -> Result<Pipeline> {
        self.validate()?;

        let mut builder = Pipeline::builder();

        if self.decode_json {
            builder = builder.wrap(DecodePayloadFromJson);
        }

        if let Some(cipher) = &self.cipher {
            let key = required_key(&keys.encryption_key, "encryption_key")?;
            let iv = match &self.iv {
                IvLayout::Prefixed => IvSource::Prefixed,
                IvLayout::Fixed { .. } => IvSource::Fixed(self.fixed_iv()?),
            };
            builder = builder.wrap(DecryptPayload::new(cipher, key, iv)?);
        }

        if let Some(hash_algo) = &self.hash_algo {
            let secret = required_key(&keys.hmac_secret, "hmac_secret")?;
            builder = builder.wrap(VerifyPayloadHmac::new(hash_algo, secret)?);
        }

        if self.transport == TransportEncoding::Base64 {
            builder = builder.wrap(DecodeBase64);
        }

        let pipeline = builder.build();
        info!("Pipeline built: {:?}", pipeline.instruction_names());
        Ok(pipeline)
    }

    /// Serialize configuration to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::decode("config", e))
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::decode("config", e))
    }

    fn fixed_iv(&self) -> Result<Vec<u8>> {
        match &self.iv {
            IvLayout::Fixed { iv } => STANDARD.decode(iv).map_err(|e| Error::decode("iv", e)),
            IvLayout::Prefixed => Ok(Vec::new()),
        }
    }
}

fn required_key(key: &Option<SecretKey>, parameter: &str) -> Result<SecretKey> {
    key.clone().ok_or_else(|| {
        Error::validation(parameter, ValidationFailure::InvalidKey("missing".to_string()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use msgpipe_common::{ErrorKind, Payload};
    use msgpipe_crypto::{calculate_hmac, encrypt_string};

    // base64(iv || aes-256-cbc(json) || hmac-sha256(iv || ciphertext)), made
    // with OpenSSL: key 00..1f, iv a0..af, HMAC secret "shared-secret".
    const SEALED: &str = "oKGio6SlpqeoqaqrrK2ur22+Bx4e21OjaKTBPTLKjl6+0v/LxdTtiWuhkcrgzQUrRGsSg7LX1RhXlTcmA21TjiX7m5uLBAQgj7bmcMi+96M=";

    fn keys() -> PipelineKeys {
        PipelineKeys {
            encryption_key: Some(SecretKey::from_bytes((0u8..32).collect())),
            hmac_secret: Some(SecretKey::from_slice(b"shared-secret")),
        }
    }

    fn identity(payload: Payload) -> Result<Payload> {
        Ok(payload)
    }

    fn seal(plaintext: &[u8], iv: &[u8]) -> String {
        let key: Vec<u8> = (0u8..32).collect();
        let mut body = iv.to_vec();
        body.extend(encrypt_string(plaintext, "payload", "aes-256-cbc", &key, iv).unwrap());
        body.extend(calculate_hmac(&body, "sha256", b"shared-secret").unwrap());
        STANDARD.encode(body)
    }

    #[test]
    fn test_default_chain_order() {
        let pipeline = PipelineConfig::default().build(&keys()).unwrap();
        assert_eq!(
            pipeline.instruction_names(),
            vec!["decode-base64", "verify-hmac", "decrypt", "decode-json"]
        );
    }

    #[test]
    fn test_unwraps_openssl_sealed_message() {
        let pipeline = PipelineConfig::default().build(&keys()).unwrap();
        let out = pipeline.process(Payload::from(SEALED), &identity).unwrap();

        assert_eq!(
            out.into_value(),
            Some(serde_json::json!({"order": 42, "status": "shipped"}))
        );
    }

    #[test]
    fn test_tampered_message_never_reaches_sink() {
        let pipeline = PipelineConfig::default().build(&keys()).unwrap();

        let mut body = STANDARD.decode(SEALED).unwrap();
        body[20] ^= 0x01;
        let tampered = STANDARD.encode(body);

        let sink = |_payload: Payload| -> Result<Payload> { panic!("sink must not run") };
        let err = pipeline.process(Payload::from(tampered), &sink).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Verification);
    }

    #[test]
    fn test_non_utf8_plaintext_is_rejected() {
        let pipeline = PipelineConfig::default().build(&keys()).unwrap();
        let sealed = seal(&[0xff, 0xfe, 0xfd], &[9u8; 16]);

        let err = pipeline.process(Payload::from(sealed), &identity).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert_eq!(err.parameter(), Some("payload"));
    }

    #[test]
    fn test_fixed_iv_without_hmac() {
        let iv = [3u8; 16];
        let key: Vec<u8> = (0u8..32).collect();
        let ciphertext =
            encrypt_string(br#"{"ok":true}"#, "payload", "aes-256-cbc", &key, &iv).unwrap();

        let config = PipelineConfig {
            transport: TransportEncoding::Raw,
            hash_algo: None,
            iv: IvLayout::Fixed {
                iv: STANDARD.encode(iv),
            },
            ..PipelineConfig::default()
        };
        let pipeline = config.build(&keys()).unwrap();
        assert_eq!(pipeline.instruction_names(), vec!["decrypt", "decode-json"]);

        let out = pipeline.process(Payload::Bytes(ciphertext), &identity).unwrap();
        assert_eq!(out.into_value(), Some(serde_json::json!({"ok": true})));
    }

    #[test]
    fn test_missing_key() {
        let keys = PipelineKeys {
            encryption_key: None,
            ..keys()
        };
        let err = PipelineConfig::default().build(&keys).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.parameter(), Some("encryption_key"));
    }

    #[test]
    fn test_validate_rejects_bad_names() {
        let config = PipelineConfig {
            cipher: Some("rot13".to_string()),
            ..PipelineConfig::default()
        };
        assert_eq!(config.validate().unwrap_err().parameter(), Some("cipher"));

        let config = PipelineConfig {
            hash_algo: Some("md5".to_string()),
            ..PipelineConfig::default()
        };
        assert_eq!(config.validate().unwrap_err().parameter(), Some("hash_algo"));

        let config = PipelineConfig {
            iv: IvLayout::Fixed {
                iv: STANDARD.encode([0u8; 8]),
            },
            ..PipelineConfig::default()
        };
        assert_eq!(config.validate().unwrap_err().parameter(), Some("iv"));
    }

    #[test]
    fn test_config_serialization() {
        let json = r#"{
            "transport": "raw",
            "hash_algo": "sha512",
            "cipher": "aes-128-ctr",
            "iv": { "source": "prefixed" }
        }"#;
        let config = PipelineConfig::from_json(json).unwrap();
        assert_eq!(config.transport, TransportEncoding::Raw);
        assert_eq!(config.hash_algo.as_deref(), Some("sha512"));
        assert_eq!(config.iv, IvLayout::Prefixed);
        assert!(config.decode_json);

        let restored = PipelineConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(restored, config);
    }

    proptest::proptest! {
        #[test]
        fn prop_any_bit_flip_is_caught_before_decryption(bit in 0usize..(80 * 8)) {
            let pipeline = PipelineConfig::default().build(&keys()).unwrap();
            let mut body = STANDARD.decode(SEALED).unwrap();
            let bit = bit % (body.len() * 8);
            body[bit / 8] ^= 1 << (bit % 8);

            let sink = |_payload: Payload| -> Result<Payload> { panic!("sink must not run") };
            let err = pipeline
                .process(Payload::from(STANDARD.encode(body)), &sink)
                .unwrap_err();
            proptest::prop_assert_eq!(err.kind(), ErrorKind::Verification);
        }
    }

    #[test]
    fn test_malformed_config() {
        let err = PipelineConfig::from_json("{\"transport\": 3}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert_eq!(err.parameter(), Some("config"));
    }
}
