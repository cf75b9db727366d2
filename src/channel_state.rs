//! Channel state extraction from SN76489 registers.
//!
//! Turns a register dump into visualization-ready data: frequencies, note
//! names and normalized amplitudes.
//!
//! # Example
//!
//! ```
//! use sn76489::{ChannelStates, PsgConfig, RegisterSnapshot};
//!
//! let mut regs = RegisterSnapshot::default();
//! regs.tone_divisors[0] = 254;
//! regs.attenuation[0] = 0;
//! let states = ChannelStates::from_registers(&regs, &PsgConfig::default());
//!
//! for (i, ch) in states.active_channels() {
//!     println!("Channel {}: {:?}Hz {:?}", i, ch.frequency_hz, ch.note_name);
//! }
//! ```

use crate::config::PsgConfig;
use crate::sn76489::constants::MAX_ATTENUATION;
use crate::sn76489::{NoiseControl, NoiseRate, RegisterSnapshot};

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// State of a single tone channel extracted from registers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelState {
    /// Tone divisor (10-bit, 0-1023).
    pub divisor: u16,
    /// Square-wave frequency in Hz.
    pub frequency_hz: Option<f32>,
    /// Musical note name (e.g., "A4", "C#5").
    pub note_name: Option<String>,
    /// Raw attenuation value (0-15, 15 = silent).
    pub attenuation: u8,
    /// Normalized amplitude (0.0-1.0) for visualization.
    pub amplitude_normalized: f32,
}

/// Noise generator state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseState {
    /// White (true) or periodic (false) noise.
    pub white: bool,
    /// Selected shift rate.
    pub rate: NoiseRate,
    /// Shift register clock in Hz.
    pub shift_rate_hz: f32,
    /// Raw attenuation value (0-15).
    pub attenuation: u8,
    /// Normalized amplitude (0.0-1.0).
    pub amplitude_normalized: f32,
}

/// Complete state of all PSG channels.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelStates {
    /// Tone channels 0-2.
    pub channels: [ChannelState; 3],
    /// Noise channel.
    pub noise: NoiseState,
}

impl ChannelStates {
    /// Extract channel states from a register dump.
    pub fn from_registers(regs: &RegisterSnapshot, config: &PsgConfig) -> Self {
        let tick_hz = config.tick_rate_hz() as f32;

        let channels = [0, 1, 2].map(|c| {
            let divisor = regs.tone_divisors[c];
            // One full cycle is two half-periods of `divisor` ticks
            let frequency_hz = (divisor > 0).then(|| tick_hz / (2.0 * divisor as f32));
            ChannelState {
                divisor,
                frequency_hz,
                note_name: frequency_hz.and_then(frequency_to_note),
                attenuation: regs.attenuation[c],
                amplitude_normalized: normalized(regs.attenuation[c]),
            }
        });

        let control = NoiseControl::from_register(regs.noise_control);
        let rate = control.rate();
        let reload = rate.reload_value(&config.noise_rates, regs.tone_divisors[2]);
        let noise = NoiseState {
            white: control.is_white(),
            rate,
            // Shifts happen on every second reload
            shift_rate_hz: tick_hz / (2.0 * reload as f32),
            attenuation: regs.attenuation[3],
            amplitude_normalized: normalized(regs.attenuation[3]),
        };

        ChannelStates { channels, noise }
    }

    /// Get the maximum amplitude across all channels (for VU meter).
    pub fn max_amplitude(&self) -> f32 {
        self.channels
            .iter()
            .map(|ch| ch.amplitude_normalized)
            .fold(self.noise.amplitude_normalized, f32::max)
    }

    /// Tone channels that are audible and have a pitch.
    pub fn active_channels(&self) -> impl Iterator<Item = (usize, &ChannelState)> {
        self.channels
            .iter()
            .enumerate()
            .filter(|(_, ch)| ch.attenuation < MAX_ATTENUATION && ch.frequency_hz.is_some())
    }
}

fn normalized(attenuation: u8) -> f32 {
    (MAX_ATTENUATION - (attenuation & MAX_ATTENUATION)) as f32 / MAX_ATTENUATION as f32
}

/// Nearest equal-tempered note for a frequency (A4 = 440 Hz).
fn frequency_to_note(freq: f32) -> Option<String> {
    if !freq.is_finite() || freq <= 0.0 {
        return None;
    }
    let midi = (69.0 + 12.0 * (freq / 440.0).log2()).round();
    if !(0.0..=127.0).contains(&midi) {
        return None;
    }
    let midi = midi as i32;
    Some(format!("{}{}", NOTE_NAMES[(midi % 12) as usize], midi / 12 - 1))
}
