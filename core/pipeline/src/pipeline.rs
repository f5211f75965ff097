//! Instruction chains and the runner that walks them.
//!
//! A chain is built once and then shared by every message it processes. Each
//! call to [`Pipeline::process`] walks the chain with its own stack-local
//! cursor, so concurrent calls need no locking.

use std::cell::Cell;
use std::fmt;

use tracing::debug;

use msgpipe_common::{Error, Payload, Result, ValidationFailure};

use crate::instruction::{Instruction, Next};

/// Immutable, ordered chain of instructions.
pub struct Pipeline {
    /// Instructions in invocation order.
    steps: Vec<Box<dyn Instruction>>,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Run `payload` through the chain, finishing at `sink`.
    ///
    /// # Postconditions
    /// - Returns whatever the last step that ran returned
    /// - An empty chain hands `payload` straight to `sink`
    ///
    /// # Errors
    /// - Any failure from a step or from `sink`, unchanged
    /// - `Validation` naming `payload` if a step receives a payload kind it
    ///   does not accept
    /// - `Pipeline` if a step calls its successor more than once
    pub fn process(&self, payload: Payload, sink: &dyn Next) -> Result<Payload> {
        Cursor {
            steps: &self.steps,
            sink,
        }
        .process(payload)
    }

    /// Number of instructions in the chain.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Instruction names in the order they run.
    pub fn instruction_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|step| step.name()).collect()
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("steps", &self.instruction_names())
            .finish()
    }
}

/// Builds a [`Pipeline`] by nesting.
///
/// Each call to [`wrap`](Self::wrap) puts a new instruction around the chain
/// built so far, so the last-wrapped instruction is the first to run.
#[derive(Default)]
pub struct PipelineBuilder {
    /// Instructions in wrapping order (innermost first).
    layers: Vec<Box<dyn Instruction>>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Wrap `instruction` around the chain built so far.
    pub fn wrap<I>(self, instruction: I) -> Self
    where
        I: Instruction + 'static,
    {
        self.wrap_boxed(Box::new(instruction))
    }

    /// Wrap an already boxed instruction around the chain built so far.
    pub fn wrap_boxed(mut self, instruction: Box<dyn Instruction>) -> Self {
        self.layers.push(instruction);
        self
    }

    pub fn build(mut self) -> Pipeline {
        self.layers.reverse();
        Pipeline { steps: self.layers }
    }
}

/// Position in a chain for one `process` call.
struct Cursor<'a> {
    steps: &'a [Box<dyn Instruction>],
    sink: &'a dyn Next,
}

impl Next for Cursor<'_> {
    fn process(&self, payload: Payload) -> Result<Payload> {
        let Some((step, rest)) = self.steps.split_first() else {
            debug!("pipeline complete, handing {:?} to sink", payload);
            return self.sink.process(payload);
        };

        let kind = step.kind();
        if !kind.accepts(payload.kind()) {
            return Err(Error::validation(
                "payload",
                ValidationFailure::UnexpectedPayload {
                    expected: kind.input(),
                    actual: payload.kind().as_str(),
                },
            ));
        }

        debug!("invoking {} with {:?}", step.name(), payload);

        let successor = Successor {
            owner: step.name(),
            called: Cell::new(false),
            rest: Cursor {
                steps: rest,
                sink: self.sink,
            },
        };
        step.invoke(&successor, payload)
    }
}

/// The `next` handle given to one step; refuses to be called twice.
struct Successor<'a> {
    owner: &'static str,
    called: Cell<bool>,
    rest: Cursor<'a>,
}

impl Next for Successor<'_> {
    fn process(&self, payload: Payload) -> Result<Payload> {
        if self.called.replace(true) {
            return Err(Error::Pipeline(format!(
                "instruction '{}' invoked its successor more than once",
                self.owner
            )));
        }
        self.rest.process(payload)
    }
}
