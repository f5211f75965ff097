//! Payload values that flow through an instruction chain.

use std::fmt;

use crate::error::{Error, Result, ValidationFailure};

/// Tag for the shape of a [`Payload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    /// Wire string, as delivered by the queue.
    Text,
    /// Binary data: ciphertext, signed envelopes, plaintext.
    Bytes,
    /// Decoded application value.
    Value,
}

impl PayloadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Bytes => "bytes",
            Self::Value => "value",
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An opaque value moving through the pipeline.
///
/// Entry payloads are usually `Text`; decoding steps turn them into `Bytes`
/// or `Value`. The pipeline imposes no schema on `Value` contents.
#[derive(Clone, PartialEq)]
pub enum Payload {
    Text(String),
    Bytes(Vec<u8>),
    Value(serde_json::Value),
}

impl Payload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Self::Text(_) => PayloadKind::Text,
            Self::Bytes(_) => PayloadKind::Bytes,
            Self::Value(_) => PayloadKind::Value,
        }
    }

    /// Size in bytes of string and binary payloads; `None` for decoded values.
    pub fn byte_len(&self) -> Option<usize> {
        match self {
            Self::Text(text) => Some(text.len()),
            Self::Bytes(bytes) => Some(bytes.len()),
            Self::Value(_) => None,
        }
    }

    /// Take the payload as a string.
    ///
    /// Bytes are accepted when they are valid UTF-8; anything else is
    /// rejected, never converted lossily.
    ///
    /// # Errors
    /// - `Validation` if the payload is a decoded value
    /// - `Decode` if bytes are not valid UTF-8
    pub fn into_text(self, parameter: &str) -> Result<String> {
        match self {
            Self::Text(text) => Ok(text),
            Self::Bytes(bytes) => String::from_utf8(bytes).map_err(|e| {
                Error::decode(parameter, format!("not valid UTF-8: {}", e.utf8_error()))
            }),
            Self::Value(_) => Err(Error::validation(
                parameter,
                ValidationFailure::UnexpectedPayload {
                    expected: "text",
                    actual: PayloadKind::Value.as_str(),
                },
            )),
        }
    }

    /// Take the payload as raw bytes. Strings hand over their UTF-8 bytes.
    ///
    /// # Errors
    /// - `Validation` if the payload is a decoded value
    pub fn into_bytes(self, parameter: &str) -> Result<Vec<u8>> {
        match self {
            Self::Text(text) => Ok(text.into_bytes()),
            Self::Bytes(bytes) => Ok(bytes),
            Self::Value(_) => Err(Error::validation(
                parameter,
                ValidationFailure::UnexpectedPayload {
                    expected: "bytes",
                    actual: PayloadKind::Value.as_str(),
                },
            )),
        }
    }

    /// Borrow the decoded value, if this is one.
    pub fn as_value(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Take the decoded value, if this is one.
    pub fn into_value(self) -> Option<serde_json::Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }
}

// Payloads are frequently plaintext; only their shape goes into debug output.
impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.byte_len() {
            Some(len) => write!(f, "Payload::{}({} bytes)", self.kind(), len),
            None => write!(f, "Payload::{}", self.kind()),
        }
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        Self::Value(value)
    }
}
