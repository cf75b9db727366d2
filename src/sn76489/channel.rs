//! Channel State
//!
//! Per-channel registers and generator state. The tick logic that advances
//! these lives in [`generators`](super::generators).

use super::constants::MAX_DIVISOR;
use bitflags::bitflags;

/// Square-wave tone channel (channels 0-2)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToneChannel {
    /// 10-bit reload value from the frequency register
    pub(crate) divisor: u16,
    /// Ticks remaining until the next polarity flip
    pub(crate) countdown: i32,
    /// Current square-wave polarity (0 or 1)
    pub(crate) level: u8,
}

impl ToneChannel {
    /// Create a silent channel at power-on state
    pub fn new() -> Self {
        Self::default()
    }

    /// Frequency register value
    #[inline]
    pub fn divisor(&self) -> u16 {
        self.divisor
    }

    /// Set the frequency register (masked to 10 bits)
    #[inline]
    pub fn set_divisor(&mut self, divisor: u16) {
        self.divisor = divisor & MAX_DIVISOR;
    }

    /// Ticks remaining before the next reload
    #[inline]
    pub fn countdown(&self) -> i32 {
        self.countdown
    }

    /// Current output polarity
    #[inline]
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Countdown reload value; a zero divisor reloads as 1
    #[inline]
    pub fn reload_value(&self) -> i32 {
        self.divisor.max(1) as i32
    }
}

bitflags! {
    /// Noise control register (3 bits)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct NoiseControl: u8 {
        /// Rate select, low bit
        const RATE_LO = 0x01;
        /// Rate select, high bit
        const RATE_HI = 0x02;
        /// White noise (1) or periodic noise (0)
        const WHITE = 0x04;
    }
}

impl NoiseControl {
    /// Create control flags from a raw register value
    pub fn from_register(value: u8) -> Self {
        NoiseControl::from_bits_truncate(value)
    }

    /// Whether the LFSR feeds back tapped-bit parity
    #[inline]
    pub fn is_white(&self) -> bool {
        self.contains(NoiseControl::WHITE)
    }

    /// Selected shift rate
    #[inline]
    pub fn rate(&self) -> NoiseRate {
        match self.bits() & 0x03 {
            0 => NoiseRate::Fast,
            1 => NoiseRate::Medium,
            2 => NoiseRate::Slow,
            _ => NoiseRate::ToneChannel2,
        }
    }
}

/// Noise shift-rate presets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseRate {
    /// Preset 0 (shortest reload)
    Fast,
    /// Preset 1
    Medium,
    /// Preset 2 (longest fixed reload)
    Slow,
    /// Preset 3: follows tone channel 2's divisor
    ToneChannel2,
}

impl NoiseRate {
    /// Countdown reload for this preset
    ///
    /// `rates` holds the variant's fixed reloads for presets 0-2.
    #[inline]
    pub fn reload_value(self, rates: &[u16; 3], tone2_divisor: u16) -> i32 {
        match self {
            NoiseRate::Fast => rates[0] as i32,
            NoiseRate::Medium => rates[1] as i32,
            NoiseRate::Slow => rates[2] as i32,
            NoiseRate::ToneChannel2 => tone2_divisor.max(1) as i32,
        }
    }
}

/// LFSR noise channel (channel 3)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoiseChannel {
    pub(crate) control: NoiseControl,
    pub(crate) countdown: i32,
    /// Low bit of the shift register after the latest shift
    pub(crate) level: u8,
    pub(crate) shift_register: u16,
    /// Shifts happen only when this flips to true
    pub(crate) tick_parity: bool,
}

impl NoiseChannel {
    /// Create a noise channel with its shift register at `seed`
    pub fn new(seed: u16) -> Self {
        NoiseChannel {
            control: NoiseControl::empty(),
            countdown: 0,
            level: 0,
            shift_register: seed,
            tick_parity: false,
        }
    }

    /// Current control register
    #[inline]
    pub fn control(&self) -> NoiseControl {
        self.control
    }

    /// Write the control register; the hardware reloads the shift register
    pub fn set_control(&mut self, control: NoiseControl, seed: u16) {
        self.control = control;
        self.shift_register = seed;
    }

    /// Ticks remaining before the next reload
    #[inline]
    pub fn countdown(&self) -> i32 {
        self.countdown
    }

    /// Current output level (0 or 1)
    #[inline]
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Raw shift register contents
    #[inline]
    pub fn shift_register(&self) -> u16 {
        self.shift_register
    }

    /// Whether the next reload will skip the shift
    #[inline]
    pub fn tick_parity(&self) -> bool {
        self.tick_parity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tone_divisor_masked_to_ten_bits() {
        let mut tone = ToneChannel::new();
        tone.set_divisor(0xFFFF);
        assert_eq!(tone.divisor(), 0x3FF);
    }

    #[test]
    fn test_zero_divisor_reloads_as_one() {
        let mut tone = ToneChannel::new();
        assert_eq!(tone.reload_value(), 1);
        tone.set_divisor(1);
        assert_eq!(tone.reload_value(), 1);
        tone.set_divisor(254);
        assert_eq!(tone.reload_value(), 254);
    }

    #[test]
    fn test_noise_control_decoding() {
        let ctrl = NoiseControl::from_register(0x07);
        assert!(ctrl.is_white());
        assert_eq!(ctrl.rate(), NoiseRate::ToneChannel2);

        let ctrl = NoiseControl::from_register(0x01);
        assert!(!ctrl.is_white());
        assert_eq!(ctrl.rate(), NoiseRate::Medium);

        // Bits above the 3-bit register are dropped
        assert_eq!(NoiseControl::from_register(0xFA).bits(), 0x02);
    }

    #[test]
    fn test_noise_rate_reloads() {
        let rates = [0x10, 0x20, 0x40];
        assert_eq!(NoiseRate::Fast.reload_value(&rates, 99), 0x10);
        assert_eq!(NoiseRate::Medium.reload_value(&rates, 99), 0x20);
        assert_eq!(NoiseRate::Slow.reload_value(&rates, 99), 0x40);
        assert_eq!(NoiseRate::ToneChannel2.reload_value(&rates, 99), 99);
        assert_eq!(NoiseRate::ToneChannel2.reload_value(&rates, 0), 1);
    }

    #[test]
    fn test_control_write_reseeds_register() {
        let mut noise = NoiseChannel::new(0x8000);
        noise.shift_register = 0x1234;
        noise.set_control(NoiseControl::WHITE, 0x8000);
        assert_eq!(noise.shift_register(), 0x8000);
        assert!(noise.control().is_white());
    }
}
