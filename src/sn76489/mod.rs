//! SN76489 PSG Emulation Domain
//!
//! Core SN76489 Programmable Sound Generator emulation: three square-wave
//! tone channels, one LFSR noise channel, linear attenuation mixing, and
//! CPU-cycle synchronized register replay.

// Internal modules
pub mod channel;
pub mod chip;
pub mod constants;
pub mod generators;
pub mod mixer;
pub mod registers;

// Re-export public API
pub use channel::{NoiseChannel, NoiseControl, NoiseRate, ToneChannel};
pub use chip::Sn76489;
pub use generators::{parity, Lfsr};
pub use mixer::{ChannelMask, Mixer};
pub use registers::{RegisterDecoder, RegisterKind, RegisterSnapshot, RegisterWrite};
