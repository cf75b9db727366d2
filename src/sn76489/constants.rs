//! SN76489 Hardware Constants

/// Output sample rate of the core (Hz)
pub const SAMPLE_RATE: u32 = 44_100;

/// Number of square-wave tone channels
pub const NUM_TONE_CHANNELS: usize = 3;

/// Total channel count (three tones plus noise)
pub const NUM_CHANNELS: usize = 4;

/// Index of the noise channel in per-channel arrays
pub const NOISE_CHANNEL: usize = 3;

/// Attenuation value that silences a channel
pub const MAX_ATTENUATION: u8 = 0x0F;

/// Largest 10-bit tone divisor
pub const MAX_DIVISOR: u16 = 0x3FF;

/// Linear scale from mix units (0-60) to signed 16-bit PCM
///
/// 60 * 512 = 30720, inside `i16::MAX`.
pub const MIX_SCALE: i32 = 512;

/// Linear weight of a channel at the given attenuation (15 loudest, 0 silent)
///
/// Masks the input to the 4-bit register range.
#[inline]
pub fn channel_weight(attenuation: u8) -> i32 {
    (MAX_ATTENUATION - (attenuation & MAX_ATTENUATION)) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_weight_edges() {
        assert_eq!(channel_weight(0), 15);
        assert_eq!(channel_weight(15), 0);
        assert_eq!(channel_weight(0xF7), channel_weight(0x07));
    }

    #[test]
    fn test_full_mix_fits_in_i16() {
        let max_mix = NUM_CHANNELS as i32 * channel_weight(0);
        assert_eq!(max_mix * MIX_SCALE, 30_720);
        assert!(max_mix * MIX_SCALE <= i16::MAX as i32);
    }
}
