//! Timing configuration for the measurement duty cycle.
//!
//! `TimingConfig` collects the node's duty-cycle constants (measurement
//! period, sensor power-up lead time, timer tick frequency) into one value
//! that is validated when the cycle timer is configured.

/// Duty-cycle timing parameters.
///
/// The period and lead time are wall-clock durations; the tick frequency is
/// a property of the low-frequency oscillator driving the cycle timer.
/// Validation (does the period fit the counter, does the lead fit inside
/// the period) happens in [`CycleTimerConfig::from_timing`].
///
/// [`CycleTimerConfig::from_timing`]: crate::timer::CycleTimerConfig::from_timing
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimingConfig {
    /// Interval between measurements, in milliseconds
    pub measurement_period_ms: u32,

    /// Sensor power-up settle time, in milliseconds.
    ///
    /// The sensor is powered at each period boundary and read this long
    /// afterwards. Must exceed the sensor's datasheet power-up time.
    pub power_up_lead_ms: u32,

    /// Cycle timer input frequency, in Hz (typically a 32.768 kHz crystal)
    pub tick_hz: u32,
}

impl TimingConfig {
    /// Create a timing configuration.
    pub const fn new(measurement_period_ms: u32, power_up_lead_ms: u32, tick_hz: u32) -> Self {
        Self {
            measurement_period_ms,
            power_up_lead_ms,
            tick_hz,
        }
    }
}

/// Default duty cycle: a measurement every 3 s, 80 ms of sensor power-up
/// lead, clocked from a 32.768 kHz low-frequency crystal.
impl Default for TimingConfig {
    fn default() -> Self {
        Self::new(3_000, 80, 32_768)
    }
}
