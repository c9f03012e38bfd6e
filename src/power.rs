//! Sleep-mode arbitration.
//!
//! Components that need the hardware to stay in a shallower power state
//! while they are mid-transaction register a *block* at the deepest mode
//! they can tolerate. The arbiter keeps one counter per mode and hands the
//! main loop the deepest mode no active blocker objects to.
//!
//! Blocks are strictly paired: every `block` must be matched by exactly one
//! `unblock` at the same mode. Unbalancing the pair is a programming defect
//! and panics rather than corrupting the counters.

use portable_atomic::{AtomicU8, Ordering};

/// Processor energy mode, ordered from shallowest to deepest.
///
/// Deeper modes save more power but disable more peripherals. The numeric
/// value is the mode's depth and doubles as the arbiter's counter index.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EnergyMode {
    /// Fully active, no sleeping
    Run = 0,

    /// Core halted, all peripherals and high-frequency clocks available
    Sleep = 1,

    /// High-frequency clocks stopped; low-frequency peripherals keep running
    DeepSleep = 2,

    /// Only ultra-low-frequency resources remain; the deepest mode entered
    Stop = 3,
}

impl EnergyMode {
    /// Number of distinct modes.
    pub const COUNT: usize = 4;

    /// The deepest mode the system ever enters when nothing blocks.
    pub const DEEPEST: EnergyMode = EnergyMode::Stop;

    fn from_index(index: usize) -> EnergyMode {
        match index {
            0 => EnergyMode::Run,
            1 => EnergyMode::Sleep,
            2 => EnergyMode::DeepSleep,
            _ => EnergyMode::Stop,
        }
    }
}

/// Capability to halt the processor at a given energy mode.
///
/// `enter` must return once any enabled interrupt has fired (and its
/// handler has run). Entering [`EnergyMode::Run`] is a no-op by contract:
/// an active blocker at `Run` means some component cannot tolerate
/// sleeping at all.
///
/// This is the sole suspension point of the system - everything else is
/// either interrupt-handler code that runs to completion or plain
/// computation.
pub trait SleepControl {
    /// Halt at `mode` until an enabled interrupt fires.
    fn enter(&mut self, mode: EnergyMode);
}

/// Per-mode block counters.
///
/// All counters are atomic so interrupt handlers and the main loop can
/// block and unblock without a critical section. Relaxed ordering is
/// sufficient under the single flat interrupt priority model.
#[derive(Debug)]
pub struct SleepArbiter {
    counts: [AtomicU8; EnergyMode::COUNT],
}

impl SleepArbiter {
    /// New arbiter with no active blocks.
    pub const fn new() -> Self {
        Self {
            counts: [
                AtomicU8::new(0),
                AtomicU8::new(0),
                AtomicU8::new(0),
                AtomicU8::new(0),
            ],
        }
    }

    /// Register a reason the system must not sleep deeper than `mode`.
    pub fn block(&self, mode: EnergyMode) {
        self.counts[mode as usize].fetch_add(1, Ordering::Relaxed);
    }

    /// Release a block previously taken at `mode`.
    ///
    /// # Panics
    ///
    /// Panics if no block is outstanding at `mode`. An unmatched unblock is
    /// a programming defect; failing loudly beats a silently corrupt
    /// counter table.
    pub fn unblock(&self, mode: EnergyMode) {
        let previous = self.counts[mode as usize].fetch_sub(1, Ordering::Relaxed);
        assert!(previous > 0, "sleep unblock without matching block");
    }

    /// The deepest mode the system may currently enter.
    ///
    /// Returns the shallowest mode with an active block, or
    /// [`EnergyMode::DEEPEST`] when nothing blocks.
    pub fn allowed_mode(&self) -> EnergyMode {
        for (index, count) in self.counts.iter().enumerate() {
            if count.load(Ordering::Relaxed) > 0 {
                return EnergyMode::from_index(index);
            }
        }
        EnergyMode::DEEPEST
    }

    /// Number of outstanding blocks at `mode`.
    pub fn blocks_at(&self, mode: EnergyMode) -> u8 {
        self.counts[mode as usize].load(Ordering::Relaxed)
    }
}

impl Default for SleepArbiter {
    fn default() -> Self {
        Self::new()
    }
}
