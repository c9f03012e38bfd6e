//! # thermolink
//!
//! Interrupt-driven low-power temperature telemetry core for embedded systems.
//!
//! **Key features:**
//! - **Hardware-free core** - All peripheral access behind capability traits
//! - **Sleep arbitration** - Per-mode block counters pick the deepest safe sleep
//! - **Two-phase duty cycle** - One timer period powers the sensor, then acquires
//! - **Framed serial commands** - Delimited command frames switch the report unit
//! - **Static allocation** - `heapless` buffers, zero heap usage
//!
//! The crate models a periodically-measuring sensor node: a low-frequency
//! timer powers a humidity/temperature sensor at each period boundary, reads
//! it over a two-wire bus once the power-up lead time has elapsed, converts
//! the raw code to degrees, and reports the value over a serial link - while
//! a sleep arbiter keeps the CPU in the deepest safe low-power mode whenever
//! no work is pending.
//!
//! Interrupt handlers are plain methods over injected state, so the whole
//! cycle can be driven (and tested) without any interrupt controller:
//!
//! ```rust,ignore
//! let mut controller = Controller::new(
//!     &CONTROL, &ARBITER, timer, sequencer, serial, sleep,
//!     TimingConfig::default(),
//! );
//! controller.start()?;
//!
//! loop {
//!     while controller.service()? {}
//!     controller.idle();
//! }
//! ```
//!
//! ## Optional Features
//!
//! - `defmt` - derive `defmt::Format` on the public data types
//!
//! This library is `no_std` compatible.

#![no_std]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

extern crate heapless;

// ============================================================================
// Module Declarations
// ============================================================================

pub mod config;
pub mod error;

// Sleep arbitration
pub mod power;

// Shared control state
pub mod state;

// Periodic cycle timer
pub mod timer;

// Sensor acquisition sequencer
pub mod acquire;

// Serial transport
pub mod transport;

// Orchestration
pub mod controller;

// ============================================================================
// Re-exports - Public API
// ============================================================================

// Configuration
pub use config::TimingConfig;

// Error types
pub use error::ConfigError;

// Sleep arbitration
pub use power::{EnergyMode, SleepArbiter, SleepControl};

// Shared state
pub use state::{ControlState, EventKind, EventSet};

// Cycle timer
pub use timer::{CycleEvent, CycleTimerConfig, TimerControl};

// Acquisition
pub use acquire::convert::{RawSample, Temperature, Unit};
pub use acquire::{AcquireError, SensorBus, Sequencer};

// Transport
pub use transport::decoder::FrameBuffer;
pub use transport::{SerialLink, SerialPort};

// Orchestration
pub use controller::Controller;

// ============================================================================
// Library Metadata
// ============================================================================

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
