//! Chain-of-responsibility pipeline for unwrapping queue message payloads.
//!
//! A [`Pipeline`] is a fixed chain of [`Instruction`]s. Each instruction gets
//! the current [`Payload`] and a [`Next`] handle for the rest of the chain,
//! does one job such as decoding or verifying, and hands the result on. The caller
//! supplies the terminal sink.
//!
//! ```ignore
//! let pipeline = PipelineConfig::default().build(&keys)?;
//! pipeline.process(Payload::from(message), &|value| handle(value))?;
//! ```

pub mod config;
pub mod instruction;
pub mod instructions;
pub mod pipeline;

pub use config::{IvLayout, PipelineConfig, PipelineKeys, TransportEncoding};
pub use instruction::{Instruction, InstructionKind, Next};
pub use instructions::{
    DecodeBase64, DecodePayloadFromJson, DecryptPayload, IvSource, VerifyPayloadHmac,
};
pub use msgpipe_common::{Error, ErrorKind, Payload, PayloadKind, Result};
pub use pipeline::{Pipeline, PipelineBuilder};
