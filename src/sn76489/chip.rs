//! SN76489 PSG emulation core
//!
//! Single-threaded chip model. [`Sn76489::render`] is the whole
//! sample-generation pipeline: map the CPU cycle window onto the output
//! frames, replay queued register writes at the frame they belong to, run
//! the internal ticks each frame is worth, and mix.
//!
//! Thread-safe access from a CPU thread and an audio thread goes through
//! [`Psg`](crate::device::Psg).

use super::channel::{NoiseChannel, NoiseControl, ToneChannel};
use super::constants::{MAX_ATTENUATION, NUM_CHANNELS, NUM_TONE_CHANNELS, SAMPLE_RATE};
use super::generators::Lfsr;
use super::mixer::Mixer;
use super::registers::{RegisterDecoder, RegisterSnapshot, RegisterWrite};
use crate::config::PsgConfig;
use crate::timing::{CycleWindow, TickAccumulator, WriteQueue};
use crate::{PsgError, Result};

/// SN76489 PSG emulator
#[derive(Clone)]
pub struct Sn76489 {
    config: PsgConfig,
    lfsr: Lfsr,
    tones: [ToneChannel; NUM_TONE_CHANNELS],
    noise: NoiseChannel,
    attenuation: [u8; NUM_CHANNELS],
    decoder: RegisterDecoder,
    queue: WriteQueue,
    accumulator: TickAccumulator,
    mixer: Mixer,
    /// CPU cycle the previous render call ended at
    last_sampled: u64,
}

impl Sn76489 {
    /// Create a chip in its power-on state, synchronized to CPU cycle `start_cycle`
    pub fn new(config: PsgConfig, start_cycle: u64) -> Result<Self> {
        config.validate()?;
        let lfsr = Lfsr::from_config(&config);
        Ok(Sn76489 {
            config,
            lfsr,
            tones: [ToneChannel::new(); NUM_TONE_CHANNELS],
            noise: NoiseChannel::new(lfsr.seed()),
            attenuation: [MAX_ATTENUATION; NUM_CHANNELS],
            decoder: RegisterDecoder::new(),
            queue: WriteQueue::new(),
            accumulator: TickAccumulator::new(
                config.clock_rate,
                config.clock_divider,
                SAMPLE_RATE,
            ),
            mixer: Mixer::new(),
            last_sampled: start_cycle,
        })
    }

    /// Return to the power-on state and drop pending writes
    ///
    /// User mutes are kept.
    pub fn reset(&mut self, cycle: u64) {
        self.tones = [ToneChannel::new(); NUM_TONE_CHANNELS];
        self.noise = NoiseChannel::new(self.lfsr.seed());
        self.attenuation = [MAX_ATTENUATION; NUM_CHANNELS];
        self.decoder = RegisterDecoder::new();
        self.queue.clear();
        self.accumulator.reset();
        self.last_sampled = cycle;
        log::debug!("PSG reset at cycle {cycle}");
    }

    /// Apply a register byte immediately, bypassing the queue
    pub fn write(&mut self, byte: u8) -> RegisterWrite {
        let write = self.decoder.decode(byte);
        match write {
            RegisterWrite::ToneLow { channel, .. } | RegisterWrite::ToneHigh { channel, .. } => {
                let tone = &mut self.tones[channel];
                if let Some(divisor) = write.merge_divisor(tone.divisor()) {
                    tone.set_divisor(divisor);
                }
            }
            RegisterWrite::Attenuation { channel, value } => {
                self.attenuation[channel] = value & MAX_ATTENUATION;
            }
            RegisterWrite::NoiseControl(value) => {
                self.noise
                    .set_control(NoiseControl::from_register(value), self.lfsr.seed());
            }
        }
        log::trace!("PSG write {byte:#04x}: {write}");
        write
    }

    /// Queue a register byte written by the CPU at `timestamp`
    ///
    /// Timestamps must not go backwards; an earlier timestamp is rejected
    /// with [`PsgError::OutOfOrderWrite`] and nothing is queued.
    pub fn enqueue_write(&mut self, timestamp: u64, payload: u8) -> Result<()> {
        self.queue.enqueue(timestamp, payload).inspect_err(|e| {
            log::error!("PSG write rejected: {e}");
        })
    }

    /// Fill `buffer` with interleaved stereo frames covering CPU cycles
    /// `last_sampled..=current_cycle`
    ///
    /// On error nothing has been modified.
    pub fn render(&mut self, buffer: &mut [i16], current_cycle: u64) -> Result<()> {
        if buffer.len() % 2 != 0 {
            log::error!("PSG render rejected: odd buffer length {}", buffer.len());
            return Err(PsgError::OddBufferLength(buffer.len()));
        }
        let frames = buffer.len() / 2;
        let window = CycleWindow::new(self.last_sampled, current_cycle, frames)
            .inspect_err(|e| log::error!("PSG render rejected: {e}"))?;

        let mut applied = 0usize;
        for (i, frame) in buffer.chunks_exact_mut(2).enumerate() {
            let offset = window.offset(i);
            while let Some(write) = self.queue.pop_due(window.start(), offset) {
                self.write(write.payload);
                applied += 1;
            }

            for _ in 0..self.accumulator.ticks_for_frame() {
                self.tick();
            }

            self.mixer
                .write_frame(frame, &self.levels(), &self.attenuation);
        }

        // Writes stamped past the window still take effect before the next call
        let mut late = 0usize;
        while let Some(write) = self.queue.pop() {
            self.write(write.payload);
            late += 1;
        }

        self.last_sampled = current_cycle;
        log::debug!(
            "PSG rendered {frames} frames over {} cycles ({applied} writes in window, {late} late)",
            window.elapsed()
        );
        Ok(())
    }

    /// Run one internal chip tick on all four channels
    #[inline]
    pub fn tick(&mut self) {
        for tone in &mut self.tones {
            tone.tick();
        }
        let tone2 = self.tones[2].divisor();
        self.noise.tick(&self.config.noise_rates, tone2, &self.lfsr);
    }

    /// Current output level of every channel (0 or 1)
    pub fn levels(&self) -> [u8; NUM_CHANNELS] {
        [
            self.tones[0].level(),
            self.tones[1].level(),
            self.tones[2].level(),
            self.noise.level(),
        ]
    }

    /// Mix value (0-60) the next frame would produce with no further ticks
    pub fn current_mix(&self) -> i32 {
        self.mixer.mix(&self.levels(), &self.attenuation)
    }

    /// Tone channel state (0-2)
    ///
    /// # Panics
    ///
    /// Panics if `channel` is not a tone channel.
    pub fn tone(&self, channel: usize) -> &ToneChannel {
        &self.tones[channel]
    }

    /// Noise channel state
    pub fn noise(&self) -> &NoiseChannel {
        &self.noise
    }

    /// Attenuation of a channel (0-3)
    ///
    /// # Panics
    ///
    /// Panics if `channel` is out of range.
    pub fn attenuation(&self, channel: usize) -> u8 {
        self.attenuation[channel]
    }

    /// Countdown reload the noise channel will use at its next expiry
    pub fn noise_reload(&self) -> u16 {
        self.noise
            .reload_value(&self.config.noise_rates, self.tones[2].divisor()) as u16
    }

    /// Dump the register file
    pub fn registers(&self) -> RegisterSnapshot {
        RegisterSnapshot {
            tone_divisors: [
                self.tones[0].divisor(),
                self.tones[1].divisor(),
                self.tones[2].divisor(),
            ],
            attenuation: self.attenuation,
            noise_control: self.noise.control().bits(),
            latched_channel: self.decoder.latched_channel(),
            latched_kind: self.decoder.latched_kind(),
        }
    }

    /// Number of queued writes not yet applied
    pub fn pending_writes(&self) -> usize {
        self.queue.len()
    }

    /// CPU cycle the last render call ended at
    pub fn last_sampled_cycle(&self) -> u64 {
        self.last_sampled
    }

    /// Hardware configuration
    pub fn config(&self) -> &PsgConfig {
        &self.config
    }

    /// Mute or unmute a channel (0-3, 3 = noise)
    pub fn set_channel_mute(&mut self, channel: usize, mute: bool) {
        self.mixer.set_channel_mute(channel, mute);
    }

    /// Check if a channel is muted
    pub fn is_channel_muted(&self, channel: usize) -> bool {
        self.mixer.is_channel_muted(channel)
    }
}

impl std::fmt::Debug for Sn76489 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sn76489")
            .field("registers", &self.registers())
            .field("levels", &self.levels())
            .field("shift_register", &self.noise.shift_register())
            .field("pending_writes", &self.queue.len())
            .field("last_sampled", &self.last_sampled)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HardwareVariant, NTSC_CLOCK};

    fn chip() -> Sn76489 {
        Sn76489::new(PsgConfig::from_variant(HardwareVariant::MasterSystemNtsc), 0).unwrap()
    }

    #[test]
    fn test_power_on_state() {
        let psg = chip();
        let regs = psg.registers();
        assert_eq!(regs, RegisterSnapshot::default());
        assert_eq!(psg.noise().shift_register(), 0x8000);
        assert_eq!(psg.levels(), [0, 0, 0, 0]);
        assert_eq!(psg.current_mix(), 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut cfg = PsgConfig::sega(NTSC_CLOCK);
        cfg.clock_divider = 0;
        assert!(matches!(
            Sn76489::new(cfg, 0),
            Err(PsgError::ConfigError(_))
        ));
    }

    #[test]
    fn test_write_tone_divisor() {
        let mut psg = chip();
        psg.write(0x84);
        psg.write(0x1A);
        assert_eq!(psg.tone(0).divisor(), 0x1A4);

        // Rewriting only the low nibble keeps the high bits
        psg.write(0x8B);
        assert_eq!(psg.tone(0).divisor(), 0x1AB);
    }

    #[test]
    fn test_write_attenuation_and_noise() {
        let mut psg = chip();
        psg.write(0x90);
        psg.write(0xB5);
        psg.write(0xE5);
        assert_eq!(psg.attenuation(0), 0);
        assert_eq!(psg.attenuation(1), 5);
        assert_eq!(psg.noise().control().bits(), 0x05);
        assert!(psg.noise().control().is_white());
    }

    #[test]
    fn test_noise_control_write_reseeds_lfsr() {
        let mut psg = chip();
        psg.write(0xE4); // white, fastest
        for _ in 0..500 {
            psg.tick();
        }
        assert_ne!(psg.noise().shift_register(), 0x8000);
        psg.write(0xE4);
        assert_eq!(psg.noise().shift_register(), 0x8000);
    }

    #[test]
    fn test_ti_variant_uses_fifteen_bit_register() {
        let psg = Sn76489::new(PsgConfig::from_variant(HardwareVariant::Sg1000), 0).unwrap();
        assert_eq!(psg.noise().shift_register(), 0x4000);
    }

    #[test]
    fn test_noise_reload_tracks_tone_two() {
        let mut psg = chip();
        psg.write(0xE3); // periodic, rate 3
        psg.write(0xC2);
        psg.write(0x03); // tone 2 = 0x032 = 50
        assert_eq!(psg.noise_reload(), 50);
        psg.write(0xC9);
        psg.write(0x01); // tone 2 = 0x019 = 25
        assert_eq!(psg.noise_reload(), 25);

        psg.write(0xE1);
        assert_eq!(psg.noise_reload(), 0x20);
    }

    #[test]
    fn test_noise_countdown_reloads_from_new_tone_two_divisor() {
        let mut psg = chip();
        psg.write(0xE3);
        psg.write(0xC2);
        psg.write(0x03);
        psg.tick();
        assert_eq!(psg.noise().countdown(), 49);

        psg.write(0xC9);
        psg.write(0x01);
        while psg.noise().countdown() > 0 {
            psg.tick();
        }
        psg.tick();
        assert_eq!(psg.noise().countdown(), 24);
    }

    #[test]
    fn test_render_rejects_odd_buffer_without_side_effects() {
        let mut psg = chip();
        psg.enqueue_write(10, 0x90).unwrap();
        let mut buffer = [0i16; 7];
        assert!(matches!(
            psg.render(&mut buffer, 100),
            Err(PsgError::OddBufferLength(7))
        ));
        assert_eq!(psg.pending_writes(), 1);
        assert_eq!(psg.last_sampled_cycle(), 0);
    }

    #[test]
    fn test_render_rejects_clock_regression() {
        let mut psg = Sn76489::new(PsgConfig::default(), 1_000).unwrap();
        let mut buffer = [0i16; 8];
        assert!(matches!(
            psg.render(&mut buffer, 999),
            Err(PsgError::ClockRegression {
                last_sampled: 1_000,
                current: 999
            })
        ));
        assert_eq!(psg.last_sampled_cycle(), 1_000);
    }

    #[test]
    fn test_empty_buffer_still_drains_and_advances() {
        let mut psg = chip();
        psg.enqueue_write(5, 0x90).unwrap();
        psg.render(&mut [], 50).unwrap();
        assert_eq!(psg.pending_writes(), 0);
        assert_eq!(psg.attenuation(0), 0);
        assert_eq!(psg.last_sampled_cycle(), 50);
    }

    #[test]
    fn test_late_writes_are_drained() {
        let mut psg = chip();
        psg.enqueue_write(5_000, 0x97).unwrap();
        let mut buffer = [0i16; 8];
        psg.render(&mut buffer, 100).unwrap();
        assert_eq!(psg.pending_writes(), 0);
        assert_eq!(psg.attenuation(0), 7);
    }

    #[test]
    fn test_muted_channel_is_silent() {
        let mut psg = chip();
        psg.write(0x8F);
        psg.write(0x3F); // tone 0 = 1023
        psg.write(0x90);
        psg.set_channel_mute(0, true);
        let mut buffer = [0i16; 16];
        psg.render(&mut buffer, 0).unwrap();
        assert!(buffer.iter().all(|&s| s == 0));

        psg.set_channel_mute(0, false);
        psg.render(&mut buffer, 0).unwrap();
        assert!(buffer.iter().all(|&s| s == 15 * 512));
    }

    #[test]
    fn test_reset_restores_power_on_state() {
        let mut psg = chip();
        psg.write(0x90);
        psg.write(0xE7);
        psg.enqueue_write(10, 0xBF).unwrap();
        for _ in 0..100 {
            psg.tick();
        }
        psg.reset(4_000);
        assert_eq!(psg.registers(), RegisterSnapshot::default());
        assert_eq!(psg.pending_writes(), 0);
        assert_eq!(psg.last_sampled_cycle(), 4_000);
        assert_eq!(psg.noise().shift_register(), 0x8000);
    }
}
