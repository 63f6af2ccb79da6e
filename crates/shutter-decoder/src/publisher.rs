//! Single-slot result publisher
//!
//! The decode side overwrites the slot once per decoded frame; the display
//! side reads it on its own timer. Only the latest value is kept.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::symbol::SymbolString;

/// Shown before the first frame is decoded
pub const SCANNING: &str = "Scanning...";
/// Shown after a frame fails to decode
pub const PROCESSING_ERROR: &str = "Processing error";

/// Latest decoded display string, shared between schedules
pub struct ResultPublisher {
    slot: Mutex<Arc<str>>,
    version: AtomicU64,
}

impl ResultPublisher {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Arc::from(SCANNING)),
            version: AtomicU64::new(0),
        }
    }

    /// Overwrite the slot with the rendered symbols
    pub fn publish(&self, symbols: &SymbolString) {
        self.store(Arc::from(symbols.render()));
    }

    /// Overwrite the slot with the error sentinel
    pub fn publish_error(&self) {
        self.store(Arc::from(PROCESSING_ERROR));
    }

    /// Current display string. Never waits on a decode in progress,
    /// only on the pointer swap itself.
    pub fn read(&self) -> Arc<str> {
        // A poisoned slot still holds a complete value
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of writes so far; lets readers skip unchanged values
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    fn store(&self, value: Arc<str>) {
        // Render outside the lock; the critical section is a pointer swap
        let previous = {
            let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *slot, value)
        };
        self.version.fetch_add(1, Ordering::AcqRel);
        drop(previous);
    }
}

impl Default for ResultPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Symbol;
    use std::thread;

    #[test]
    fn test_initial_placeholder() {
        let publisher = ResultPublisher::new();
        assert_eq!(&*publisher.read(), SCANNING);
        assert_eq!(publisher.version(), 0);
    }

    #[test]
    fn test_publish_and_read() {
        let publisher = ResultPublisher::new();
        let symbols: SymbolString = [Symbol::Dark, Symbol::Light].into_iter().collect();
        publisher.publish(&symbols);

        assert_eq!(&*publisher.read(), ".|");
        assert_eq!(&*publisher.read(), ".|");
        assert_eq!(publisher.version(), 1);
    }

    #[test]
    fn test_error_sentinel_overwrites() {
        let publisher = ResultPublisher::new();
        publisher.publish(&[Symbol::Light].into_iter().collect());
        publisher.publish_error();
        assert_eq!(&*publisher.read(), PROCESSING_ERROR);
    }

    #[test]
    fn test_concurrent_reads_never_torn() {
        let publisher = Arc::new(ResultPublisher::new());
        let light: SymbolString = std::iter::repeat(Symbol::Light).take(50).collect();
        let dark: SymbolString = std::iter::repeat(Symbol::Dark).take(50).collect();

        let writer = {
            let publisher = Arc::clone(&publisher);
            thread::spawn(move || {
                for i in 0..2000 {
                    publisher.publish(if i % 2 == 0 { &light } else { &dark });
                }
            })
        };

        for _ in 0..2000 {
            let value = publisher.read();
            let whole = &*value == SCANNING
                || value.chars().all(|c| c == '|')
                || value.chars().all(|c| c == '.');
            assert!(whole, "torn read: {}", value);
        }
        writer.join().unwrap();
        assert_eq!(publisher.version(), 2000);
    }
}
