//! Hardware-Variant Configuration
//!
//! The SN76489 family differs between consoles in its input clock and in the
//! width and feedback taps of the noise shift register. These values are
//! supplied by the machine model rather than baked into the chip core.

use crate::{PsgError, Result};
use serde::{Deserialize, Serialize};

/// NTSC colour-burst derived master clock (Hz)
pub const NTSC_CLOCK: u32 = 3_579_545;
/// PAL master clock as used by the Master System (Hz)
pub const PAL_CLOCK: u32 = 3_546_893;
/// Input clock divider of every SN76489 part
pub const HARDWARE_CLOCK_DIVIDER: u32 = 16;

/// Console models the chip is known to ship in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HardwareVariant {
    /// SG-1000 / SC-3000 with a discrete SN76489AN
    Sg1000,
    /// Master System (NTSC)
    MasterSystemNtsc,
    /// Master System (PAL)
    MasterSystemPal,
    /// Game Gear
    GameGear,
    /// Mega Drive / Genesis (integrated PSG)
    MegaDrive,
}

/// PSG configuration fixed at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PsgConfig {
    /// Input clock in Hz
    pub clock_rate: u32,
    /// Input clock cycles per internal chip tick
    pub clock_divider: u32,
    /// Width of the noise shift register in bits (1-16)
    pub shift_register_width: u8,
    /// Bits of the shift register XOR-ed together for white noise
    pub tapped_bits: u16,
    /// Countdown reloads for noise rate presets 0-2 (preset 3 follows tone 2)
    pub noise_rates: [u16; 3],
}

impl PsgConfig {
    /// Sega SN76496 (Master System, Game Gear, Mega Drive): 16-bit register, taps 0 and 3
    pub const fn sega(clock_rate: u32) -> Self {
        PsgConfig {
            clock_rate,
            clock_divider: HARDWARE_CLOCK_DIVIDER,
            shift_register_width: 16,
            tapped_bits: 0x0009,
            noise_rates: [0x10, 0x20, 0x40],
        }
    }

    /// Texas Instruments SN76489(A)N: 15-bit register, taps 0 and 1
    pub const fn texas_instruments(clock_rate: u32) -> Self {
        PsgConfig {
            clock_rate,
            clock_divider: HARDWARE_CLOCK_DIVIDER,
            shift_register_width: 15,
            tapped_bits: 0x0003,
            noise_rates: [0x10, 0x20, 0x40],
        }
    }

    /// Configuration for a console model
    pub const fn from_variant(variant: HardwareVariant) -> Self {
        match variant {
            HardwareVariant::Sg1000 => Self::texas_instruments(NTSC_CLOCK),
            HardwareVariant::MasterSystemNtsc
            | HardwareVariant::GameGear
            | HardwareVariant::MegaDrive => Self::sega(NTSC_CLOCK),
            HardwareVariant::MasterSystemPal => Self::sega(PAL_CLOCK),
        }
    }

    /// Parse and validate a configuration from JSON
    ///
    /// ```
    /// use sn76489::PsgConfig;
    /// let cfg = PsgConfig::from_json(r#"{
    ///     "clock_rate": 4000000, "clock_divider": 16,
    ///     "shift_register_width": 15, "tapped_bits": 3,
    ///     "noise_rates": [16, 32, 64]
    /// }"#).unwrap();
    /// assert_eq!(cfg.shift_register_width, 15);
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let config: PsgConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the configuration for values the core cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.clock_rate == 0 {
            return Err(PsgError::ConfigError("clock_rate must be non-zero".into()));
        }
        if self.clock_divider == 0 {
            return Err(PsgError::ConfigError(
                "clock_divider must be non-zero".into(),
            ));
        }
        if !(1..=16).contains(&self.shift_register_width) {
            return Err(PsgError::ConfigError(format!(
                "shift_register_width {} outside 1-16",
                self.shift_register_width
            )));
        }
        if self.tapped_bits & !self.register_mask() != 0 {
            return Err(PsgError::ConfigError(format!(
                "tapped_bits {:#06x} exceed a {}-bit shift register",
                self.tapped_bits, self.shift_register_width
            )));
        }
        if self.noise_rates.contains(&0) {
            return Err(PsgError::ConfigError(
                "noise_rates entries must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Mask covering every bit of the shift register
    pub fn register_mask(&self) -> u16 {
        (((1u32 << self.shift_register_width) - 1) & 0xFFFF) as u16
    }

    /// Shift register value after power-on or a noise control write
    pub fn shift_register_seed(&self) -> u16 {
        1 << (self.shift_register_width - 1)
    }

    /// Internal chip ticks per second (informational)
    pub fn tick_rate_hz(&self) -> f64 {
        self.clock_rate as f64 / self.clock_divider as f64
    }
}

impl Default for PsgConfig {
    fn default() -> Self {
        Self::from_variant(HardwareVariant::MasterSystemNtsc)
    }
}
