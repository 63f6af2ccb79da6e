//! Decoder counters

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

/// Per-outcome frame counters, updated by the decode side
#[derive(Debug, Default)]
pub struct DecoderStats {
    frames_seen: AtomicU64,
    published: AtomicU64,
    throttled: AtomicU64,
    skipped: AtomicU64,
    failed: AtomicU64,
    abandoned: AtomicU64,
    last_decode_us: AtomicU64,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub frames_seen: u64,
    pub published: u64,
    pub throttled: u64,
    pub skipped: u64,
    pub failed: u64,
    pub abandoned: u64,
    pub last_decode_us: u64,
}

impl DecoderStats {
    pub fn record_seen(&self) {
        self.frames_seen.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_published(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_throttled(&self) {
        self.throttled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_abandoned(&self) {
        self.abandoned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_latency(&self, elapsed: Duration) {
        self.last_decode_us
            .store(elapsed.as_micros().min(u64::MAX as u128) as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            frames_seen: self.frames_seen.load(Ordering::Relaxed),
            published: self.published.load(Ordering::Relaxed),
            throttled: self.throttled.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            abandoned: self.abandoned.load(Ordering::Relaxed),
            last_decode_us: self.last_decode_us.load(Ordering::Relaxed),
        }
    }
}
