//! Processor statistics
//!
//! Both counters live behind one lock so a snapshot never observes a frame
//! counted without its encoded bytes.

use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub frames_processed: u64,
    pub bytes_encoded: u64,
}

#[derive(Debug, Default)]
pub struct Statistics {
    counters: Mutex<StatsSnapshot>,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one successful non-encoding operation
    pub fn record_frame(&self) {
        self.counters.lock().frames_processed += 1;
    }

    /// Count one successful encode and its codestream length
    pub fn record_encoded(&self, bytes: usize) {
        let mut counters = self.counters.lock();
        counters.frames_processed += 1;
        counters.bytes_encoded += bytes as u64;
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        *self.counters.lock()
    }

    pub fn frames_processed(&self) -> u64 {
        self.counters.lock().frames_processed
    }

    pub fn bytes_encoded(&self) -> u64 {
        self.counters.lock().bytes_encoded
    }

    pub fn reset(&self) {
        *self.counters.lock() = StatsSnapshot::default();
    }
}
