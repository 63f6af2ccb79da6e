//! Downsampling to a fixed-size display string

use std::num::NonZeroUsize;

use crate::error::ConfigError;
use crate::symbol::{Symbol, SymbolString};

/// Keeps every `step`-th symbol and caps the result at `max_length`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Condenser {
    step: NonZeroUsize,
    max_length: usize,
}

impl Condenser {
    /// A step of zero is rejected here, before any frame arrives
    pub fn new(step: usize, max_length: usize) -> Result<Self, ConfigError> {
        let step = NonZeroUsize::new(step).ok_or(ConfigError::ZeroStep)?;
        Ok(Self { step, max_length })
    }

    pub fn step(&self) -> usize {
        self.step.get()
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Output length for an input of `input_len` symbols
    pub fn output_len(&self, input_len: usize) -> usize {
        input_len.div_ceil(self.step.get()).min(self.max_length)
    }

    pub fn condense(&self, symbols: &SymbolString) -> SymbolString {
        condense(symbols.symbols(), self.step, self.max_length)
    }
}

/// `symbols[0], symbols[step], symbols[2*step], ...`, at most `max_length` of them
pub fn condense(symbols: &[Symbol], step: NonZeroUsize, max_length: usize) -> SymbolString {
    symbols
        .iter()
        .step_by(step.get())
        .take(max_length)
        .copied()
        .collect()
}
