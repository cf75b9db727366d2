//! SN76489 PSG Emulator for Sega 8-bit hardware
//!
//! A cycle-accurate emulator of the Texas Instruments SN76489 Programmable
//! Sound Generator and its Sega SN76496 derivative, as found in the SG-1000,
//! Master System, Game Gear and Mega Drive. Register writes issued by an
//! emulated CPU are time-stamped, queued, and replayed against the audio
//! frames they affect.
//!
//! # Features
//! - Three square-wave tone channels and one LFSR noise channel
//! - Integer-only resampling of the chip clock to 44.1 kHz (no drift)
//! - CPU-cycle synchronized register replay
//! - Hardware-variant configuration (clock, shift width, taps, noise rates)
//! - Thread-safe device handle for a CPU thread and an audio thread
//!
//! # Quick start
//! ```
//! use std::sync::Arc;
//! use sn76489::{CycleCounter, HardwareVariant, Psg, PsgConfig};
//!
//! let clock = Arc::new(CycleCounter::new());
//! let psg = Psg::new(PsgConfig::from_variant(HardwareVariant::MasterSystemNtsc), clock.clone()).unwrap();
//!
//! // CPU side: tone 0 at divisor 0x0FE, full volume
//! psg.enqueue_write(clock.get_cycles(), 0x8E).unwrap();
//! psg.enqueue_write(clock.get_cycles(), 0x0F).unwrap();
//! psg.enqueue_write(clock.get_cycles(), 0x90).unwrap();
//! clock.advance(59_659);
//!
//! // Audio side: one 60 Hz video frame of stereo samples
//! let mut buffer = vec![0i16; 735 * 2];
//! psg.create_samples(&mut buffer).unwrap();
//! ```

#![warn(missing_docs)]

pub mod channel_state; // Visualization view of the register file
pub mod config; // Hardware-variant configuration
pub mod device; // Thread-safe device handle
pub mod sn76489; // SN76489 PSG Emulation (core)
pub mod timing; // CPU clock, write queue and frame/cycle mapping

/// Error types for PSG emulator operations
///
/// The first three variants are caller precondition violations. They are
/// reported before any device state is touched.
#[derive(thiserror::Error, Debug)]
pub enum PsgError {
    /// Output buffer does not hold a whole number of stereo frames
    #[error("Output buffer length {0} is not a whole number of stereo frames")]
    OddBufferLength(usize),

    /// Register write enqueued with a timestamp earlier than its predecessor
    #[error("Register write at cycle {timestamp} enqueued after a write at cycle {previous}")]
    OutOfOrderWrite {
        /// Timestamp of the rejected write
        timestamp: u64,
        /// Timestamp of the most recently enqueued write
        previous: u64,
    },

    /// CPU cycle counter moved backwards between two sample requests
    #[error("CPU cycle counter went backwards: last sampled at {last_sampled}, now {current}")]
    ClockRegression {
        /// Cycle recorded by the previous request
        last_sampled: u64,
        /// Cycle read by the current request
        current: u64,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Configuration could not be parsed
    #[error("Configuration parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for emulator operations
pub type Result<T> = std::result::Result<T, PsgError>;

// Public API exports
pub use channel_state::ChannelStates;
pub use config::{HardwareVariant, PsgConfig};
pub use device::Psg;
pub use sn76489::{parity, ChannelMask, RegisterSnapshot, Sn76489};
pub use timing::{CpuClock, CycleCounter};
