use msgpipe_common::{Error, Payload, Result};

use crate::instruction::{Instruction, InstructionKind, Next};

/// Takes a payload from a message queue and turns it back into a value.
///
/// JSON is the data representation of choice. Binary payloads must be valid
/// UTF-8; they are never converted lossily.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodePayloadFromJson;

impl Instruction for DecodePayloadFromJson {
    fn name(&self) -> &'static str {
        "decode-json"
    }

    fn kind(&self) -> InstructionKind {
        InstructionKind::StringInMixedOut
    }

    fn invoke(&self, next: &dyn Next, payload: Payload) -> Result<Payload> {
        let text = payload.into_text("payload")?;
        let value: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| Error::decode("payload", e))?;

        next.process(Payload::Value(value))
    }
}
