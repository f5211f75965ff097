use base64::{engine::general_purpose::STANDARD, Engine};

use msgpipe_common::{Error, Payload, Result};

use crate::instruction::{Instruction, InstructionKind, Next};

/// Turns standard base64 text into the binary payload it carries.
///
/// Surrounding ASCII whitespace (a trailing newline from the queue, say) is
/// ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeBase64;

impl Instruction for DecodeBase64 {
    fn name(&self) -> &'static str {
        "decode-base64"
    }

    fn kind(&self) -> InstructionKind {
        InstructionKind::StringInBytesOut
    }

    fn invoke(&self, next: &dyn Next, payload: Payload) -> Result<Payload> {
        let text = payload.into_text("payload")?;
        let bytes = STANDARD
            .decode(text.trim())
            .map_err(|e| Error::decode("payload", e))?;

        next.process(Payload::Bytes(bytes))
    }
}
