//! The contract every pipeline step implements.
//!
//! A step receives the current payload plus a handle to the rest of the
//! chain. It either returns a final value or hands a transformed payload to
//! that handle exactly once.

use msgpipe_common::{Payload, PayloadKind, Result};

/// Handle to "the rest of the pipeline".
///
/// Any `Fn(Payload) -> Result<Payload>` closure is a `Next`, which is how
/// callers supply the terminal sink.
pub trait Next {
    /// Continue the chain with `payload` as the new payload.
    fn process(&self, payload: Payload) -> Result<Payload>;
}

impl<F> Next for F
where
    F: Fn(Payload) -> Result<Payload>,
{
    fn process(&self, payload: Payload) -> Result<Payload> {
        self(payload)
    }
}

/// Declared input/output contract of an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstructionKind {
    /// Wire string in, decoded value out.
    StringInMixedOut,
    /// Wire string in, binary out.
    StringInBytesOut,
    /// Binary in, binary out.
    BytesInBytesOut,
    /// Anything in, anything out.
    MixedInMixedOut,
}

impl InstructionKind {
    /// Whether a payload of `kind` may be handed to an instruction of this kind.
    ///
    /// String inputs also accept bytes, which are checked for UTF-8 when the
    /// instruction takes them. Binary inputs accept strings as their UTF-8
    /// bytes.
    pub fn accepts(&self, kind: PayloadKind) -> bool {
        match self {
            Self::StringInMixedOut | Self::StringInBytesOut | Self::BytesInBytesOut => {
                matches!(kind, PayloadKind::Text | PayloadKind::Bytes)
            }
            Self::MixedInMixedOut => true,
        }
    }

    /// Human-readable name of the accepted input, for error messages.
    pub fn input(&self) -> &'static str {
        match self {
            Self::StringInMixedOut | Self::StringInBytesOut => "text",
            Self::BytesInBytesOut => "bytes",
            Self::MixedInMixedOut => "any",
        }
    }
}

/// A single, stateless pipeline step.
///
/// # Contract
/// - `invoke` must either return a value itself or call `next.process`
///   exactly once
/// - Failures from the step or from `next` are returned unchanged
/// - Neither `payload` nor `next` outlives the call
pub trait Instruction: Send + Sync {
    /// Short identifier used in logs and errors.
    fn name(&self) -> &'static str;

    fn kind(&self) -> InstructionKind;

    /// Do this step's work and, usually, continue with `next`.
    fn invoke(&self, next: &dyn Next, payload: Payload) -> Result<Payload>;
}
