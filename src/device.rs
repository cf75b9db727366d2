//! Thread-safe PSG device
//!
//! A [`Psg`] is shared between the CPU-execution thread, which enqueues
//! register writes, and the audio thread, which pulls sample buffers.
//!
//! # Locking
//!
//! All chip state (channels, shift register, write queue, tick accumulator,
//! last sampled cycle) sits behind one `parking_lot::Mutex`. It is the only
//! lock this crate takes, so there is no ordering to get wrong inside the
//! crate. Callers that hold their own machine-level lock must acquire it
//! before calling into the `Psg`, never while a closure passed to
//! [`Psg::with_chip`] is running.
//!
//! `create_samples` holds the lock for the full call; `enqueue_write` holds
//! it for a single push. The CPU clock is read through [`CpuClock`], which
//! must not block.

use crate::config::PsgConfig;
use crate::sn76489::{RegisterSnapshot, Sn76489};
use crate::timing::CpuClock;
use crate::Result;
use parking_lot::Mutex;
use std::sync::Arc;

/// Shared handle to one emulated PSG
///
/// Cloning the handle shares the same chip.
#[derive(Clone)]
pub struct Psg {
    chip: Arc<Mutex<Sn76489>>,
    clock: Arc<dyn CpuClock>,
}

impl Psg {
    /// Create a PSG synchronized to the current value of `clock`
    pub fn new(config: PsgConfig, clock: Arc<dyn CpuClock>) -> Result<Self> {
        let chip = Sn76489::new(config, clock.total_cycles())?;
        log::debug!(
            "PSG created: {} Hz / {}, {}-bit LFSR taps {:#06x}",
            config.clock_rate,
            config.clock_divider,
            config.shift_register_width,
            config.tapped_bits
        );
        Ok(Psg {
            chip: Arc::new(Mutex::new(chip)),
            clock,
        })
    }

    /// Queue a register write issued by the CPU at cycle `timestamp`
    ///
    /// Fails with [`PsgError::OutOfOrderWrite`](crate::PsgError::OutOfOrderWrite)
    /// if `timestamp` is earlier than the previously enqueued write.
    pub fn enqueue_write(&self, timestamp: u64, payload: u8) -> Result<()> {
        self.chip.lock().enqueue_write(timestamp, payload)
    }

    /// Queue a register write stamped with the clock's current cycle
    pub fn write_now(&self, payload: u8) -> Result<()> {
        let mut chip = self.chip.lock();
        chip.enqueue_write(self.clock.total_cycles(), payload)
    }

    /// Fill `buffer` with interleaved stereo 16-bit frames at 44.1 kHz
    ///
    /// Covers the CPU cycles executed since the previous call. Fails without
    /// touching any state if `buffer` has an odd length or the CPU clock went
    /// backwards.
    pub fn create_samples(&self, buffer: &mut [i16]) -> Result<()> {
        let mut chip = self.chip.lock();
        let current = self.clock.total_cycles();
        chip.render(buffer, current)
    }

    /// Power-cycle the chip and resynchronize it with the CPU clock
    pub fn reset(&self) {
        let mut chip = self.chip.lock();
        chip.reset(self.clock.total_cycles());
    }

    /// Dump the register file
    pub fn registers(&self) -> RegisterSnapshot {
        self.chip.lock().registers()
    }

    /// Number of queued writes not yet applied
    pub fn pending_writes(&self) -> usize {
        self.chip.lock().pending_writes()
    }

    /// Mute or unmute a channel (0-3, 3 = noise)
    pub fn set_channel_mute(&self, channel: usize, mute: bool) {
        self.chip.lock().set_channel_mute(channel, mute);
    }

    /// Run `f` with shared access to the chip while holding the device lock
    pub fn with_chip<R>(&self, f: impl FnOnce(&Sn76489) -> R) -> R {
        f(&self.chip.lock())
    }
}

impl std::fmt::Debug for Psg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Psg")
            .field("chip", &*self.chip.lock())
            .field("cycles", &self.clock.total_cycles())
            .finish()
    }
}
