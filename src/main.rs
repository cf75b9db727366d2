#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!(
        "The sn76489 demo requires the \"cli\" feature. Rebuild with `--features cli` to enable it."
    );
}

#[cfg(feature = "cli")]
mod cli {
    use std::env;
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::thread;

    use anyhow::{anyhow, bail, Context};
    use sn76489::{ChannelStates, CycleCounter, HardwareVariant, Psg, PsgConfig};

    /// Tone divisors for a C major arpeggio (C4 E4 G4 C5) at the NTSC clock
    const ARPEGGIO: [u16; 4] = [428, 339, 285, 214];

    fn parse_variant(name: &str) -> Option<HardwareVariant> {
        match name.to_ascii_lowercase().as_str() {
            "sg1000" | "sg-1000" => Some(HardwareVariant::Sg1000),
            "sms" | "ntsc" => Some(HardwareVariant::MasterSystemNtsc),
            "pal" => Some(HardwareVariant::MasterSystemPal),
            "gg" | "gamegear" => Some(HardwareVariant::GameGear),
            "md" | "genesis" | "megadrive" => Some(HardwareVariant::MegaDrive),
            _ => None,
        }
    }

    fn video_frame_cycles(config: &PsgConfig, video_hz: u32) -> u64 {
        (config.clock_rate / video_hz) as u64
    }

    /// Latch/data byte pair for a tone divisor
    fn tone_bytes(channel: u8, divisor: u16) -> [u8; 2] {
        [
            0x80 | (channel << 5) | (divisor & 0x0F) as u8,
            ((divisor >> 4) & 0x3F) as u8,
        ]
    }

    struct Meter {
        peak: i16,
        sum_squares: f64,
        count: usize,
    }

    impl Meter {
        fn measure(samples: &[i16]) -> Self {
            Meter {
                peak: samples.iter().copied().max().unwrap_or(0),
                sum_squares: samples.iter().map(|&s| (s as f64).powi(2)).sum(),
                count: samples.len(),
            }
        }

        fn rms(&self) -> f64 {
            if self.count == 0 {
                0.0
            } else {
                (self.sum_squares / self.count as f64).sqrt()
            }
        }
    }

    pub fn run() -> anyhow::Result<()> {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

        let mut args = env::args().skip(1);
        let variant = match args.next() {
            Some(name) => parse_variant(&name)
                .ok_or_else(|| anyhow!("unknown variant '{name}' (sg1000|sms|pal|gg|md)"))?,
            None => HardwareVariant::MasterSystemNtsc,
        };
        let seconds: u32 = match args.next() {
            Some(s) => s.parse().with_context(|| format!("invalid duration '{s}'"))?,
            None => 2,
        };
        if seconds == 0 {
            bail!("duration must be at least one second");
        }

        let config = PsgConfig::from_variant(variant);
        let video_hz = if variant == HardwareVariant::MasterSystemPal { 50 } else { 60 };
        let frame_cycles = video_frame_cycles(&config, video_hz);
        let audio_frames = 44_100 / video_hz as usize;
        let video_frames = seconds * video_hz;
        log::info!(
            "{variant:?}: {} Hz clock, {frame_cycles} CPU cycles and {audio_frames} audio frames per video frame",
            config.clock_rate
        );

        let clock = Arc::new(CycleCounter::new());
        let psg = Psg::new(config, clock.clone())?;
        let (tx, rx) = mpsc::sync_channel::<u32>(2);

        let cpu = {
            let psg = psg.clone();
            let clock = clock.clone();
            thread::spawn(move || -> sn76489::Result<()> {
                for byte in [0x90, 0xB4, 0xD8, 0xE6, 0xFC] {
                    psg.write_now(byte)?;
                }
                for frame in 0..video_frames {
                    // One arpeggio step every eight video frames
                    if frame % 8 == 0 {
                        let step = (frame / 8) as usize;
                        for (channel, offset) in [(0u8, 0usize), (1, 1), (2, 2)] {
                            let divisor = ARPEGGIO[(step + offset) % ARPEGGIO.len()];
                            for byte in tone_bytes(channel, divisor) {
                                psg.write_now(byte)?;
                                clock.advance(12);
                            }
                        }
                    }
                    clock.advance(frame_cycles / 2);
                    // Retrigger the noise mid-frame
                    if frame % 16 == 4 {
                        psg.write_now(0xE6)?;
                    }
                    clock.advance(frame_cycles - frame_cycles / 2);
                    if tx.send(frame).is_err() {
                        break;
                    }
                }
                Ok(())
            })
        };

        let mut buffer = vec![0i16; audio_frames * 2];
        let mut total_peak = 0i16;
        let mut total_squares = 0f64;
        let mut total_samples = 0usize;
        for frame in rx {
            psg.create_samples(&mut buffer)?;
            let meter = Meter::measure(&buffer);
            total_peak = total_peak.max(meter.peak);
            total_squares += meter.sum_squares;
            total_samples += meter.count;

            if frame % video_hz == 0 {
                let states = ChannelStates::from_registers(&psg.registers(), &config);
                let notes: Vec<String> = states
                    .active_channels()
                    .map(|(i, ch)| {
                        format!("{i}:{}", ch.note_name.as_deref().unwrap_or("--"))
                    })
                    .collect();
                log::info!(
                    "t={:>3}s peak={:>5} rms={:>8.1} notes=[{}] noise={:.0} Hz",
                    frame / video_hz,
                    meter.peak,
                    meter.rms(),
                    notes.join(" "),
                    states.noise.shift_rate_hz
                );
            }
        }

        cpu.join()
            .map_err(|_| anyhow!("CPU thread panicked"))??;

        let total = Meter {
            peak: total_peak,
            sum_squares: total_squares,
            count: total_samples,
        };
        log::info!(
            "rendered {} frames: peak={} rms={:.1}, {} writes pending",
            total_samples / 2,
            total.peak,
            total.rms(),
            psg.pending_writes()
        );
        Ok(())
    }
}

#[cfg(feature = "cli")]
fn main() -> anyhow::Result<()> {
    cli::run()
}
