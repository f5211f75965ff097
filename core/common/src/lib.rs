//! Common types shared across the messaging pipeline crates.
//!
//! This module provides the error taxonomy and the payload value that every
//! pipeline instruction consumes and produces.

pub mod error;
pub mod types;

pub use error::{Error, ErrorKind, Result, ValidationFailure};
pub use types::{Payload, PayloadKind};
