//! Orchestration of the measurement duty cycle.
//!
//! `Controller` wires the shared state, the sleep arbiter and the hardware
//! capabilities together. Every interrupt source maps onto a plain method
//! (`on_*`) that the platform's interrupt glue - or a test - calls
//! directly; the main loop alternates [`Controller::service`] and
//! [`Controller::idle`]:
//!
//! ```rust,ignore
//! loop {
//!     while controller.service()? {}
//!     controller.idle();
//! }
//! ```

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::acquire::convert::Temperature;
use crate::acquire::{AcquireError, SensorBus, Sequencer};
use crate::config::TimingConfig;
use crate::error::ConfigError;
use crate::power::{EnergyMode, SleepArbiter, SleepControl};
use crate::state::{ControlState, EventKind};
use crate::timer::{CycleEvent, CycleTimerConfig, TimerControl};
use crate::transport::{encode_reading, SerialLink, SerialPort};

/// Energy mode floor while the cycle timer is running.
///
/// The timer keeps counting in deep sleep but not below it, so the block is
/// held for as long as the cycle is enabled.
pub const TIMER_ACTIVE_MODE: EnergyMode = EnergyMode::DeepSleep;

/// Duty-cycle orchestrator.
///
/// Generic over the cycle timer, the serial peripheral, the sensor seam
/// (bus, power pin, delay) and the sleep capability. The shared control
/// state and arbiter are injected by reference so interrupt glue and other
/// collaborators can observe them.
pub struct Controller<'a, T, P, B, EN, D, S, const N: usize>
where
    T: TimerControl,
    P: SerialPort,
    B: SensorBus,
    EN: OutputPin,
    D: DelayNs,
    S: SleepControl,
{
    state: &'a ControlState,
    arbiter: &'a SleepArbiter,
    timing: TimingConfig,
    timer: T,
    sequencer: Sequencer<B, EN, D>,
    serial: SerialLink<'a, P, N>,
    sleep: S,
}

impl<'a, T, P, B, EN, D, S, const N: usize> core::fmt::Debug
    for Controller<'a, T, P, B, EN, D, S, N>
where
    T: TimerControl,
    P: SerialPort,
    B: SensorBus,
    EN: OutputPin,
    D: DelayNs,
    S: SleepControl,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Controller")
            .field("timing", &self.timing)
            .field("cycle_enabled", &self.state.cycle_enabled())
            .field("cycle_running", &self.state.cycle_running())
            .finish_non_exhaustive()
    }
}

impl<'a, T, P, B, EN, D, S, const N: usize> Controller<'a, T, P, B, EN, D, S, N>
where
    T: TimerControl,
    P: SerialPort,
    B: SensorBus,
    EN: OutputPin,
    D: DelayNs,
    S: SleepControl,
{
    /// Assemble a controller; nothing runs until [`Controller::start`].
    pub fn new(
        state: &'a ControlState,
        arbiter: &'a SleepArbiter,
        timer: T,
        sequencer: Sequencer<B, EN, D>,
        serial: SerialLink<'a, P, N>,
        sleep: S,
        timing: TimingConfig,
    ) -> Self {
        Self {
            state,
            arbiter,
            timing,
            timer,
            sequencer,
            serial,
            sleep,
        }
    }

    /// Validate the timing, program the cycle timer and start the cycle.
    ///
    /// Call once at startup. A [`ConfigError`] is fatal: the cycle is left
    /// entirely unstarted.
    pub fn start(&mut self) -> Result<(), ConfigError> {
        let config = CycleTimerConfig::from_timing(&self.timing)?;
        self.timer.configure(&config);
        self.timer.clear_event(CycleEvent::PowerOn);
        self.timer.clear_event(CycleEvent::Acquire);
        self.timer.enable_events();
        self.arbiter.block(TIMER_ACTIVE_MODE);
        self.state.set_cycle_enabled(true);
        self.state.set_cycle_running(true);
        self.timer.enable();
        Ok(())
    }

    /// Period-boundary interrupt: power the sensor for this cycle.
    pub fn on_period_start(&mut self) -> Result<(), EN::Error> {
        let powered = self.sequencer.power_on();
        self.timer.clear_event(CycleEvent::PowerOn);
        powered
    }

    /// Lead-time-elapsed interrupt: acquire, then apply a pending disable.
    ///
    /// The acquisition itself always runs to completion - a disable request
    /// never cancels an in-flight transaction. Once teardown is done, a
    /// requested disable stops the timer at the source, releases its sleep
    /// block and withdraws the not-yet-transmitted reading so nothing stale
    /// goes out after the cycle is off.
    pub fn on_acquire_due(&mut self) -> Result<(), AcquireError<B::Error, EN::Error>> {
        let acquired = self.sequencer.acquire(self.state, self.arbiter);
        self.timer.clear_event(CycleEvent::Acquire);

        if !self.state.cycle_enabled() {
            self.state.set_cycle_running(false);
            self.timer.disable_events();
            self.timer.disable();
            self.arbiter.unblock(TIMER_ACTIVE_MODE);
            self.state.events().clear(EventKind::ReadingReady);
        }
        acquired
    }

    /// Transmit-buffer-empty interrupt.
    pub fn on_tx_empty(&mut self) {
        self.serial.on_tx_empty();
    }

    /// Transmit-complete interrupt.
    pub fn on_tx_complete(&mut self) {
        self.serial.on_tx_complete();
    }

    /// Hardware-delivered receive byte.
    pub fn on_rx_byte(&mut self, byte: u8) {
        self.serial.push_byte(byte);
    }

    /// End-of-frame interrupt.
    pub fn on_frame(&mut self) {
        self.serial.on_frame();
    }

    /// Request the periodic cycle off.
    ///
    /// Takes effect at the end of the in-flight acquisition (if any);
    /// a reading already pending for transmission still goes out.
    pub fn request_disable(&self) {
        self.state.set_cycle_enabled(false);
    }

    /// Request the periodic cycle on, restarting the timer if it was
    /// stopped by an earlier disable.
    pub fn request_enable(&mut self) {
        self.state.set_cycle_enabled(true);
        if !self.state.cycle_running() {
            self.timer.clear_event(CycleEvent::PowerOn);
            self.timer.clear_event(CycleEvent::Acquire);
            self.timer.enable_events();
            self.arbiter.block(TIMER_ACTIVE_MODE);
            self.state.set_cycle_running(true);
            self.timer.enable();
        }
    }

    /// Drain one pending event. Returns whether any work was done.
    ///
    /// A pending reading is encoded and sent byte-by-byte; each byte wait
    /// suspends through the sleep arbiter rather than spinning.
    pub fn service(&mut self) -> Result<bool, P::Error> {
        if self.state.events().take(EventKind::ReadingReady) {
            if let Some(reading) = self.sequencer.last_reading() {
                let frame = encode_reading(reading.degrees());
                self.serial.send_all(&frame, &mut self.sleep)?;
            }
            return Ok(true);
        }
        Ok(false)
    }

    /// Suspend at the deepest safe energy mode until an interrupt fires.
    ///
    /// The sole main-loop suspension point.
    pub fn idle(&mut self) {
        self.sleep.enter(self.arbiter.allowed_mode());
    }

    /// The most recently converted reading.
    pub fn last_reading(&self) -> Option<Temperature> {
        self.sequencer.last_reading()
    }
}
