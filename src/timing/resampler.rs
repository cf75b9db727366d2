//! Clock-domain mapping between CPU cycles, chip ticks and audio frames
//!
//! Both mappings are pure integer arithmetic so that no rounding error can
//! accumulate across buffer requests.

use crate::{PsgError, Result};

/// CPU cycles covered by one buffer request, spread across its frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleWindow {
    start: u64,
    end: u64,
    frames: usize,
}

impl CycleWindow {
    /// Build the window `[start, end]` for `frames` output frames
    ///
    /// Fails with [`PsgError::ClockRegression`] when `end < start`.
    pub fn new(start: u64, end: u64, frames: usize) -> Result<Self> {
        if end < start {
            return Err(PsgError::ClockRegression {
                last_sampled: start,
                current: end,
            });
        }
        Ok(CycleWindow { start, end, frames })
    }

    /// First CPU cycle of the window
    pub fn start(&self) -> u64 {
        self.start
    }

    /// CPU cycle the window ends at
    pub fn end(&self) -> u64 {
        self.end
    }

    /// CPU cycles elapsed across the window
    pub fn elapsed(&self) -> u64 {
        self.end - self.start
    }

    /// Cycle offset (relative to `start`) that frame `frame` corresponds to
    ///
    /// `floor(frame * elapsed / frames)`, recomputed from scratch for every
    /// frame so the mapping never drifts.
    #[inline]
    pub fn offset(&self, frame: usize) -> u64 {
        if self.frames == 0 {
            return 0;
        }
        ((frame as u128 * self.elapsed() as u128) / self.frames as u128) as u64
    }
}

/// Bresenham-style converter from the output frame rate to the chip tick rate
///
/// Each frame subtracts the chip clock; every internal tick adds back the
/// sample rate scaled by the chip's clock divider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickAccumulator {
    stepper: i64,
    clock_rate: i64,
    tick_credit: i64,
}

impl TickAccumulator {
    /// Create an accumulator for a chip clocked at `clock_rate` Hz that ticks
    /// once every `clock_divider` input cycles, sampled at `sample_rate` Hz
    pub fn new(clock_rate: u32, clock_divider: u32, sample_rate: u32) -> Self {
        TickAccumulator {
            stepper: 0,
            clock_rate: clock_rate as i64,
            tick_credit: sample_rate as i64 * clock_divider as i64,
        }
    }

    /// Number of internal chip ticks to run for the next output frame
    #[inline]
    pub fn ticks_for_frame(&mut self) -> u32 {
        self.stepper -= self.clock_rate;
        let mut ticks = 0;
        while self.stepper < 0 {
            ticks += 1;
            self.stepper += self.tick_credit;
        }
        ticks
    }

    /// Current stepper value (always in `0..tick_credit` between frames)
    pub fn stepper(&self) -> i64 {
        self.stepper
    }

    /// Restart from zero
    pub fn reset(&mut self) {
        self.stepper = 0;
    }
}
