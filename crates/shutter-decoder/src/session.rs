//! Capture session generations
//!
//! The capture side bumps the generation whenever the source stops or is
//! reconfigured. A decode that began under an older generation is dropped
//! instead of published.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Identifies the capture configuration a frame was taken under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

/// Shared handle to the current capture generation
#[derive(Debug, Clone, Default)]
pub struct CaptureSession {
    generation: Arc<AtomicU64>,
}

impl CaptureSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Generation {
        Generation(self.generation.load(Ordering::Acquire))
    }

    /// Mark every in-flight decode as stale
    pub fn invalidate(&self) -> Generation {
        Generation(self.generation.fetch_add(1, Ordering::AcqRel) + 1)
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.current() == generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalidate_stales_previous() {
        let session = CaptureSession::new();
        let before = session.current();
        assert!(session.is_current(before));

        let after = session.invalidate();
        assert!(!session.is_current(before));
        assert!(session.is_current(after));
    }

    #[test]
    fn test_clones_share_generation() {
        let session = CaptureSession::new();
        let capture_side = session.clone();
        let generation = session.current();
        capture_side.invalidate();
        assert!(!session.is_current(generation));
    }
}
