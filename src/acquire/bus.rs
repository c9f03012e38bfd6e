//! Sensor bus capability and protocol constants.
//!
//! The sensor speaks a raw register protocol over a two-wire bus: write a
//! configuration byte to the user register, issue a measurement command,
//! read back two bytes (most-significant first). The trait below exposes
//! exactly the operations the acquisition sequence needs; everything about
//! addressing, start/stop conditions and clock stretching stays in the
//! adapter.

/// Bus address of the sensor.
pub const SENSOR_ADDRESS: u8 = 0x40;

/// Command: write the user configuration register.
pub const USER_REGISTER_WRITE: u8 = 0xE6;

/// Command: measure temperature, holding the bus until the code is ready.
pub const MEASURE_TEMPERATURE_HOLD: u8 = 0xE3;

/// User-register value selecting 12-bit measurement resolution.
pub const RESOLUTION_12BIT: u8 = 0x01;

/// Clock pulses issued during bus recovery.
///
/// Nine pulses walk a peripheral stuck mid-transaction through the rest of
/// its byte (plus acknowledge) so it releases the data line.
pub const RECOVERY_CLOCK_PULSES: usize = 9;

/// Settle time after a configuration register write, in microseconds.
pub const REGISTER_SETTLE_US: u32 = 5_000;

/// Capability interface of the sensor's two-wire bus.
///
/// `attach` must leave both lines driven idle-high; `detach` releases the
/// pins entirely so the powered-down sensor cannot back-feed through them.
/// `write_register` and `read_measurement` are blocking transactions; an
/// adapter may bound them with a timeout surfaced through [`Self::Error`],
/// or block until the sensor answers.
pub trait SensorBus {
    /// Adapter-defined transaction error.
    type Error;

    /// Enable the bus pins, lines idle-high.
    fn attach(&mut self);

    /// Release the bus pins.
    fn detach(&mut self);

    /// Toggle the clock line low then high once.
    fn pulse_clock(&mut self);

    /// Reset the host-side bus state machine.
    fn abort(&mut self);

    /// Write one byte to a sensor register.
    fn write_register(&mut self, register: u8, value: u8) -> Result<(), Self::Error>;

    /// Issue a measurement command and read the two-byte code,
    /// most-significant byte first.
    fn read_measurement(&mut self, command: u8) -> Result<[u8; 2], Self::Error>;
}
