//! Cycle-Accurate Timing
//!
//! Tracks the emulated CPU's executed cycle count. The PSG only ever reads it.

use std::sync::atomic::{AtomicU64, Ordering};

/// Source of the emulated CPU's total executed cycles
///
/// Implementations must be monotonically non-decreasing and must not block.
pub trait CpuClock: Send + Sync {
    /// Total CPU cycles executed since power-on
    fn total_cycles(&self) -> u64;
}

/// Cycle counter shared between the CPU thread and the audio thread
#[derive(Debug, Default)]
pub struct CycleCounter {
    cycles: AtomicU64,
}

impl CycleCounter {
    /// Create a new cycle counter at cycle 0
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Create a counter that has already executed `cycles`
    pub fn starting_at(cycles: u64) -> Self {
        CycleCounter {
            cycles: AtomicU64::new(cycles),
        }
    }

    /// Increment the cycle counter by one
    pub fn clock(&self) {
        self.advance(1);
    }

    /// Increment by n cycles, returning the new total
    pub fn advance(&self, n: u64) -> u64 {
        self.cycles.fetch_add(n, Ordering::AcqRel) + n
    }

    /// Get current cycle count
    pub fn get_cycles(&self) -> u64 {
        self.cycles.load(Ordering::Acquire)
    }
}

impl CpuClock for CycleCounter {
    fn total_cycles(&self) -> u64 {
        self.get_cycles()
    }
}
