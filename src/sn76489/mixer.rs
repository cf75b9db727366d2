//! SN76489 Output Mixer
//!
//! Sums the four channel levels weighted by their linear attenuation and
//! writes the result to both slots of a stereo frame. The chip has a single
//! output pin, so left and right always carry the same value.

use super::constants::{channel_weight, MIX_SCALE, NUM_CHANNELS};
use bitflags::bitflags;

bitflags! {
    /// Per-channel selection (used for user muting)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ChannelMask: u8 {
        /// Tone channel 0
        const TONE_0 = 0x01;
        /// Tone channel 1
        const TONE_1 = 0x02;
        /// Tone channel 2
        const TONE_2 = 0x04;
        /// Noise channel
        const NOISE = 0x08;
    }
}

impl ChannelMask {
    /// Mask for a channel index (0-3); out-of-range indices select nothing
    pub fn channel(index: usize) -> Self {
        if index < NUM_CHANNELS {
            ChannelMask::from_bits_truncate(1 << index)
        } else {
            ChannelMask::empty()
        }
    }
}

/// Audio Mixer - combines all channels into PCM frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mixer {
    muted: ChannelMask,
}

impl Mixer {
    /// Create a mixer with every channel audible
    pub fn new() -> Self {
        Mixer {
            muted: ChannelMask::empty(),
        }
    }

    /// Weighted sum of channel levels, 0-60
    #[inline]
    pub fn mix(&self, levels: &[u8; NUM_CHANNELS], attenuation: &[u8; NUM_CHANNELS]) -> i32 {
        let mut mix = 0;
        for c in 0..NUM_CHANNELS {
            if self.muted.contains(ChannelMask::channel(c)) {
                continue;
            }
            mix += (levels[c] & 1) as i32 * channel_weight(attenuation[c]);
        }
        mix
    }

    /// Scale a mix value to a signed 16-bit sample
    #[inline]
    pub fn to_sample(mix: i32) -> i16 {
        (mix * MIX_SCALE) as i16
    }

    /// Mix one stereo frame into `frame` (left, right)
    #[inline]
    pub fn write_frame(
        &self,
        frame: &mut [i16],
        levels: &[u8; NUM_CHANNELS],
        attenuation: &[u8; NUM_CHANNELS],
    ) {
        let sample = Self::to_sample(self.mix(levels, attenuation));
        frame[0] = sample;
        frame[1] = sample;
    }

    /// Mute or unmute a channel (0-3)
    pub fn set_channel_mute(&mut self, channel: usize, mute: bool) {
        self.muted.set(ChannelMask::channel(channel), mute);
    }

    /// Check if a channel is muted
    pub fn is_channel_muted(&self, channel: usize) -> bool {
        let mask = ChannelMask::channel(channel);
        !mask.is_empty() && self.muted.contains(mask)
    }

    /// Currently muted channels
    pub fn muted(&self) -> ChannelMask {
        self.muted
    }
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_attenuation_mixes_to_zero() {
        let mixer = Mixer::new();
        assert_eq!(mixer.mix(&[1, 1, 1, 1], &[15, 15, 15, 15]), 0);
    }

    #[test]
    fn test_full_scale_mix() {
        let mixer = Mixer::new();
        let mix = mixer.mix(&[1, 1, 1, 1], &[0, 0, 0, 0]);
        assert_eq!(mix, 60);
        assert_eq!(Mixer::to_sample(mix), 30_720);
    }

    #[test]
    fn test_linear_weights() {
        let mixer = Mixer::new();
        // 15 + (15 - 5) + 0 + (15 - 14)
        assert_eq!(mixer.mix(&[1, 1, 0, 1], &[0, 5, 0, 14]), 26);
    }

    #[test]
    fn test_frame_is_identical_on_both_sides() {
        let mixer = Mixer::new();
        let mut frame = [0i16; 2];
        mixer.write_frame(&mut frame, &[1, 0, 1, 0], &[3, 0, 9, 0]);
        assert_eq!(frame[0], (12 + 6) * 512);
        assert_eq!(frame[0], frame[1]);
    }

    #[test]
    fn test_channel_mute() {
        let mut mixer = Mixer::new();
        mixer.set_channel_mute(3, true);
        assert!(mixer.is_channel_muted(3));
        assert!(!mixer.is_channel_muted(0));
        assert_eq!(mixer.mix(&[1, 1, 1, 1], &[0, 0, 0, 0]), 45);
        assert_eq!(mixer.muted(), ChannelMask::NOISE);

        mixer.set_channel_mute(3, false);
        assert_eq!(mixer.mix(&[1, 1, 1, 1], &[0, 0, 0, 0]), 60);
    }

    #[test]
    fn test_out_of_range_channel_is_ignored() {
        let mut mixer = Mixer::new();
        mixer.set_channel_mute(7, true);
        assert!(mixer.muted().is_empty());
        assert!(!mixer.is_channel_muted(7));
    }
}
