//! CPU/Audio Clock Synchronization
//!
//! Everything that relates the emulated CPU's cycle counter to the fixed
//! 44.1 kHz audio frame domain:
//! - `cycle_counter` - the CPU clock seam and a shareable atomic counter
//! - `write_queue` - time-stamped register writes awaiting replay
//! - `resampler` - cycle-window mapping and the chip-tick accumulator

pub mod cycle_counter;
pub mod resampler;
pub mod write_queue;

pub use cycle_counter::{CpuClock, CycleCounter};
pub use resampler::{CycleWindow, TickAccumulator};
pub use write_queue::{PendingWrite, WriteQueue};
