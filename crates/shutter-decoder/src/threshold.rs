//! Adaptive binarization threshold

use crate::error::DecoderError;

/// Mean brightness of one column
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Threshold(f64);

impl Threshold {
    pub fn value(&self) -> f64 {
        self.0
    }
}

/// Arithmetic mean of the samples.
///
/// Recomputed from scratch every frame; nothing is carried over.
pub fn estimate(samples: &[u8]) -> Result<Threshold, DecoderError> {
    if samples.is_empty() {
        return Err(DecoderError::EmptyColumn);
    }
    let sum: u64 = samples.iter().map(|&s| s as u64).sum();
    Ok(Threshold(sum as f64 / samples.len() as f64))
}
