//! SN76489 Register Protocol
//!
//! The chip has a single write-only port. A byte with bit 7 set latches a
//! channel/register pair and writes its low nibble; a byte with bit 7 clear
//! writes to whichever register was latched last.
//!
//! ```text
//! latch: 1 c c t d d d d    cc = channel, t = 1 attenuation / 0 tone or noise
//! data:  0 - d d d d d d
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which register of a channel is latched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegisterKind {
    /// Tone divisor (channels 0-2) or noise control (channel 3)
    ToneOrNoise,
    /// 4-bit attenuation
    Attenuation,
}

/// A decoded register write, ready to be applied to channel state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterWrite {
    /// Low 4 bits of a tone divisor
    ToneLow {
        /// Tone channel 0-2
        channel: usize,
        /// Bits 0-3 of the divisor
        bits: u16,
    },
    /// High 6 bits of a tone divisor
    ToneHigh {
        /// Tone channel 0-2
        channel: usize,
        /// Bits 4-9 of the divisor, already shifted into place
        bits: u16,
    },
    /// Channel attenuation
    Attenuation {
        /// Channel 0-3
        channel: usize,
        /// Attenuation 0-15
        value: u8,
    },
    /// Noise control register (3 bits)
    NoiseControl(u8),
}

impl RegisterWrite {
    /// Merge this write into an existing tone divisor
    ///
    /// Returns `None` for writes that do not target a tone divisor.
    pub fn merge_divisor(&self, divisor: u16) -> Option<u16> {
        match *self {
            RegisterWrite::ToneLow { bits, .. } => Some((divisor & 0x3F0) | bits),
            RegisterWrite::ToneHigh { bits, .. } => Some((divisor & 0x00F) | bits),
            _ => None,
        }
    }
}

impl fmt::Display for RegisterWrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterWrite::ToneLow { channel, bits } => {
                write!(f, "tone {channel} divisor low = {bits:#03x}")
            }
            RegisterWrite::ToneHigh { channel, bits } => {
                write!(f, "tone {channel} divisor high = {bits:#05x}")
            }
            RegisterWrite::Attenuation { channel, value } => {
                write!(f, "channel {channel} attenuation = {value}")
            }
            RegisterWrite::NoiseControl(value) => write!(f, "noise control = {value:#03x}"),
        }
    }
}

/// Tracks the latched register and decodes port bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterDecoder {
    channel: usize,
    kind: RegisterKind,
}

impl RegisterDecoder {
    /// Power-on state: tone 0 divisor latched
    pub fn new() -> Self {
        RegisterDecoder {
            channel: 0,
            kind: RegisterKind::ToneOrNoise,
        }
    }

    /// Decode one port byte, updating the latch
    pub fn decode(&mut self, byte: u8) -> RegisterWrite {
        if byte & 0x80 != 0 {
            self.channel = ((byte >> 5) & 0x03) as usize;
            self.kind = if byte & 0x10 != 0 {
                RegisterKind::Attenuation
            } else {
                RegisterKind::ToneOrNoise
            };
            let nibble = byte & 0x0F;
            match (self.kind, self.channel) {
                (RegisterKind::Attenuation, channel) => RegisterWrite::Attenuation {
                    channel,
                    value: nibble,
                },
                (RegisterKind::ToneOrNoise, 3) => RegisterWrite::NoiseControl(nibble & 0x07),
                (RegisterKind::ToneOrNoise, channel) => RegisterWrite::ToneLow {
                    channel,
                    bits: nibble as u16,
                },
            }
        } else {
            // Registers narrower than 6 bits take the low bits of the data byte
            match (self.kind, self.channel) {
                (RegisterKind::Attenuation, channel) => RegisterWrite::Attenuation {
                    channel,
                    value: byte & 0x0F,
                },
                (RegisterKind::ToneOrNoise, 3) => RegisterWrite::NoiseControl(byte & 0x07),
                (RegisterKind::ToneOrNoise, channel) => RegisterWrite::ToneHigh {
                    channel,
                    bits: ((byte & 0x3F) as u16) << 4,
                },
            }
        }
    }

    /// Currently latched channel
    pub fn latched_channel(&self) -> usize {
        self.channel
    }

    /// Currently latched register kind
    pub fn latched_kind(&self) -> RegisterKind {
        self.kind
    }
}

impl Default for RegisterDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Register file dump for debugging and visualization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterSnapshot {
    /// Tone divisors for channels 0-2
    pub tone_divisors: [u16; 3],
    /// Attenuation for channels 0-3
    pub attenuation: [u8; 4],
    /// Noise control register
    pub noise_control: u8,
    /// Latched channel
    pub latched_channel: usize,
    /// Latched register kind
    pub latched_kind: RegisterKind,
}

impl Default for RegisterSnapshot {
    fn default() -> Self {
        RegisterSnapshot {
            tone_divisors: [0; 3],
            attenuation: [0x0F; 4],
            noise_control: 0,
            latched_channel: 0,
            latched_kind: RegisterKind::ToneOrNoise,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latch_tone_low_then_data_high() {
        let mut decoder = RegisterDecoder::new();
        assert_eq!(
            decoder.decode(0x84),
            RegisterWrite::ToneLow {
                channel: 0,
                bits: 0x4
            }
        );
        let high = decoder.decode(0x1A);
        assert_eq!(
            high,
            RegisterWrite::ToneHigh {
                channel: 0,
                bits: 0x1A0
            }
        );
        assert_eq!(high.merge_divisor(0x004), Some(0x1A4));
    }

    #[test]
    fn test_latch_attenuation() {
        let mut decoder = RegisterDecoder::new();
        assert_eq!(
            decoder.decode(0xB5),
            RegisterWrite::Attenuation {
                channel: 1,
                value: 5
            }
        );
        assert_eq!(
            decoder.decode(0xFF),
            RegisterWrite::Attenuation {
                channel: 3,
                value: 15
            }
        );
        assert_eq!(decoder.latched_kind(), RegisterKind::Attenuation);
        assert_eq!(decoder.latched_channel(), 3);
    }

    #[test]
    fn test_data_byte_after_attenuation_latch() {
        let mut decoder = RegisterDecoder::new();
        decoder.decode(0xD0);
        assert_eq!(
            decoder.decode(0x0A),
            RegisterWrite::Attenuation {
                channel: 2,
                value: 0x0A
            }
        );
    }

    #[test]
    fn test_noise_control_latch_and_data() {
        let mut decoder = RegisterDecoder::new();
        assert_eq!(decoder.decode(0xE7), RegisterWrite::NoiseControl(0x07));
        assert_eq!(decoder.decode(0x3D), RegisterWrite::NoiseControl(0x05));
    }

    #[test]
    fn test_tone_low_merge_preserves_high_bits() {
        let low = RegisterWrite::ToneLow {
            channel: 2,
            bits: 0x9,
        };
        assert_eq!(low.merge_divisor(0x3F2), Some(0x3F9));
        assert_eq!(RegisterWrite::NoiseControl(3).merge_divisor(0x100), None);
    }

    #[test]
    fn test_data_byte_before_any_latch_targets_tone_zero() {
        let mut decoder = RegisterDecoder::default();
        assert_eq!(
            decoder.decode(0x3F),
            RegisterWrite::ToneHigh {
                channel: 0,
                bits: 0x3F0
            }
        );
    }
}
