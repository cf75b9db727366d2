//! Sound generators for the SN76489 PSG
//!
//! Tick logic for the tone channels and the noise LFSR. Both follow the same
//! hardware timing: a channel whose countdown has run out reloads first, and
//! every channel then decrements on every tick, including the tick it
//! reloaded on.

use super::channel::{NoiseChannel, ToneChannel};
use crate::config::PsgConfig;

/// Parity (0 or 1) of a 16-bit value, by successive halving and XOR
#[inline]
pub const fn parity(value: u16) -> u16 {
    let mut v = value;
    v ^= v >> 8;
    v ^= v >> 4;
    v ^= v >> 2;
    v ^= v >> 1;
    v & 1
}

/// Noise shift register geometry of a hardware variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lfsr {
    width: u8,
    tapped_bits: u16,
}

impl Lfsr {
    /// Shift register with `width` bits and the given feedback taps
    pub const fn new(width: u8, tapped_bits: u16) -> Self {
        Lfsr { width, tapped_bits }
    }

    /// Geometry taken from a validated configuration
    pub fn from_config(config: &PsgConfig) -> Self {
        Self::new(config.shift_register_width, config.tapped_bits)
    }

    /// Register width in bits
    pub fn width(&self) -> u8 {
        self.width
    }

    /// Value loaded on power-on and on every noise control write
    pub fn seed(&self) -> u16 {
        1 << (self.width - 1)
    }

    /// Shift once, feeding either tapped parity (white) or the low bit (periodic)
    #[inline]
    pub fn shift(&self, register: u16, white: bool) -> u16 {
        let feed = if white {
            parity(register & self.tapped_bits)
        } else {
            register & 1
        };
        (register >> 1) | (feed << (self.width - 1))
    }
}

impl ToneChannel {
    /// Advance one internal tick
    #[inline]
    pub fn tick(&mut self) {
        if self.countdown <= 0 {
            self.level ^= 1;
            self.countdown = self.reload_value();
        }
        self.countdown -= 1;
    }
}

impl NoiseChannel {
    /// Advance one internal tick
    ///
    /// `rates` are the variant's reloads for presets 0-2; preset 3 reloads
    /// from `tone2_divisor`. The register shifts on every second reload.
    #[inline]
    pub fn tick(&mut self, rates: &[u16; 3], tone2_divisor: u16, lfsr: &Lfsr) {
        if self.countdown <= 0 {
            self.countdown = self.control.rate().reload_value(rates, tone2_divisor);
            self.tick_parity = !self.tick_parity;
            if self.tick_parity {
                self.shift_register = lfsr.shift(self.shift_register, self.control.is_white());
                self.level = (self.shift_register & 1) as u8;
            }
        }
        self.countdown -= 1;
    }

    /// Reload value the next countdown expiry will use
    #[inline]
    pub fn reload_value(&self, rates: &[u16; 3], tone2_divisor: u16) -> i32 {
        self.control.rate().reload_value(rates, tone2_divisor)
    }
}
