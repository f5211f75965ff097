//! Concrete pipeline instructions.
//!
//! Each one is a thin adapter that binds a decoding or cryptographic
//! operation into the [`Instruction`](crate::instruction::Instruction)
//! contract.

mod decode_base64;
mod decode_json;
mod decrypt;
mod verify_hmac;

pub use decode_base64::DecodeBase64;
pub use decode_json::DecodePayloadFromJson;
pub use decrypt::{DecryptPayload, IvSource};
pub use verify_hmac::VerifyPayloadHmac;
