//! Sensor acquisition sequencing.
//!
//! The sequencer owns the sensor-facing hardware capabilities and runs the
//! two timer-driven phases of each measurement cycle: assert the sensor's
//! power line at the period boundary, then - once the power-up lead time
//! has elapsed - recover the bus, read the measurement, convert it and
//! post the result for the main loop to transmit.
//!
//! Both phases run at interrupt level; the bus transaction is deliberately
//! blocking (bounded by the sensor's conversion latency) to keep the
//! control flow flat. The sleep arbiter is blocked at the bus-safe mode for
//! exactly the duration of the transaction.

pub mod bus;
pub mod convert;

pub use bus::SensorBus;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::power::{EnergyMode, SleepArbiter};
use crate::state::{ControlState, EventKind};
use bus::{
    MEASURE_TEMPERATURE_HOLD, RECOVERY_CLOCK_PULSES, REGISTER_SETTLE_US, RESOLUTION_12BIT,
    USER_REGISTER_WRITE,
};
use convert::{RawSample, Temperature};

/// Energy mode floor while a bus transaction is in flight.
///
/// Bus transfer needs a higher power state than idle sleep, so the
/// sequencer blocks here for the duration of the transaction.
pub const BUS_ACTIVE_MODE: EnergyMode = EnergyMode::Sleep;

/// Acquisition failure: either side of the sensor seam can report.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AcquireError<B, P> {
    /// Bus transaction failed (or timed out, if the adapter bounds it)
    Bus(B),

    /// The sensor power/enable line could not be driven
    Pin(P),
}

/// Timer-driven acquisition sequencer.
///
/// Generic over the sensor bus, the power/enable pin and a delay provider
/// for the register settle time.
#[derive(Debug)]
pub struct Sequencer<B, EN, D> {
    bus: B,
    power_pin: EN,
    delay: D,
    resolution: Option<u8>,
    last: Option<Temperature>,
}

impl<B, EN, D> Sequencer<B, EN, D> {
    /// New sequencer writing the 12-bit resolution configuration before
    /// each measurement.
    pub fn new(bus: B, power_pin: EN, delay: D) -> Self {
        Self {
            bus,
            power_pin,
            delay,
            resolution: Some(RESOLUTION_12BIT),
            last: None,
        }
    }

    /// Override the resolution byte written before each measurement, or
    /// skip the configuration write entirely with `None`.
    pub fn set_resolution(&mut self, resolution: Option<u8>) {
        self.resolution = resolution;
    }

    /// The most recently converted reading, if any cycle has completed.
    pub fn last_reading(&self) -> Option<Temperature> {
        self.last
    }
}

impl<B, EN, D> Sequencer<B, EN, D>
where
    B: SensorBus,
    EN: OutputPin,
    D: DelayNs,
{
    /// Period-boundary phase: power the sensor.
    ///
    /// No bus activity happens here - the sensor gets the configured lead
    /// time to settle before [`Sequencer::acquire`] touches the bus.
    pub fn power_on(&mut self) -> Result<(), EN::Error> {
        self.power_pin.set_high()
    }

    /// Lead-time-elapsed phase: read, convert and post one measurement.
    ///
    /// Blocks the sleep arbiter at [`BUS_ACTIVE_MODE`], recovers the bus,
    /// runs the transaction, converts the code in the currently preferred
    /// unit and posts [`EventKind::ReadingReady`]. Teardown (bus detach,
    /// sensor power-off, arbiter unblock) runs whether or not the
    /// transaction succeeded, so a failed cycle can never leak a sleep
    /// block or leave the sensor powered.
    pub fn acquire(
        &mut self,
        state: &ControlState,
        arbiter: &SleepArbiter,
    ) -> Result<(), AcquireError<B::Error, EN::Error>> {
        arbiter.block(BUS_ACTIVE_MODE);
        let transacted = self.transact(state);
        self.bus.detach();
        let powered_off = self.power_pin.set_low();
        arbiter.unblock(BUS_ACTIVE_MODE);

        transacted.map_err(AcquireError::Bus)?;
        powered_off.map_err(AcquireError::Pin)
    }

    fn transact(&mut self, state: &ControlState) -> Result<(), B::Error> {
        self.bus.attach();
        // Walk a stuck peripheral off the data line before resetting our
        // own side of the bus.
        for _ in 0..RECOVERY_CLOCK_PULSES {
            self.bus.pulse_clock();
        }
        self.bus.abort();

        if let Some(value) = self.resolution {
            self.bus.write_register(USER_REGISTER_WRITE, value)?;
            self.delay.delay_us(REGISTER_SETTLE_US);
        }

        let [ms, ls] = self.bus.read_measurement(MEASURE_TEMPERATURE_HOLD)?;
        let sample = RawSample::from_bytes(ms, ls);
        self.last = Some(Temperature::from_raw(sample, state.unit()));
        state.events().post(EventKind::ReadingReady);
        Ok(())
    }
}
