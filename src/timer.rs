//! Periodic cycle timer configuration and capability.
//!
//! One down-counting hardware timer drives the whole measurement duty
//! cycle with two compare values per period: the reload/top compare marks
//! the period boundary (sensor power-on), and a secondary compare placed
//! `lead` ticks below the top fires once the power-up lead time has
//! elapsed (acquisition). Deriving both compares from a single configured
//! period keeps power-on and acquisition phase-locked regardless of the
//! prescaler choice.
//!
//! The prescaler search picks the *coarsest* divider that still fits the
//! period into the 16-bit counter, i.e. the smallest power of two - that
//! maximizes counting resolution, which matters because the acquisition
//! window is short relative to the period.

use crate::config::TimingConfig;
use crate::error::ConfigError;

/// Counter range of the cycle timer (16-bit).
const MAX_COUNT: u64 = u16::MAX as u64;

/// Largest divider the prescaler supports.
const MAX_DIVIDER: u32 = 32_768;

/// The two per-period timer events.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CycleEvent {
    /// Period boundary: power the sensor
    PowerOn,

    /// Power-up lead time elapsed: acquire a reading
    Acquire,
}

/// Capability interface of the cycle timer peripheral.
///
/// Adapters map these onto the peripheral's compare, prescaler,
/// interrupt-enable and interrupt-clear registers. The counter auto-reloads
/// at the top compare; `enable`/`disable` start and stop counting without
/// touching the configuration.
pub trait TimerControl {
    /// Program prescaler and compare values.
    fn configure(&mut self, config: &CycleTimerConfig);

    /// Start counting.
    fn enable(&mut self);

    /// Stop counting.
    fn disable(&mut self);

    /// Unmask both per-period event interrupts.
    fn enable_events(&mut self);

    /// Mask both per-period event interrupts at the source.
    fn disable_events(&mut self);

    /// Acknowledge a fired event flag.
    fn clear_event(&mut self, event: CycleEvent);
}

/// Validated cycle timer settings.
///
/// Produced by [`CycleTimerConfig::from_timing`]; the values are ready to
/// program into a down-counting 16-bit timer with auto-reload at `top`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CycleTimerConfig {
    divider: u32,
    top: u16,
    acquire_compare: u16,
}

impl CycleTimerConfig {
    /// Compute timer settings for the requested timing.
    ///
    /// The divider is the smallest power of two (up to 32768) for which the
    /// scaled period fits the counter; the top value is ceiling-quantized,
    /// so the realized period is never shorter than the requested one and
    /// exceeds it by less than one tick at the chosen divider. The lead
    /// time is ceiling-quantized the same way, keeping the realized settle
    /// time at least as long as requested.
    ///
    /// # Errors
    ///
    /// [`ConfigError::PeriodTooLong`] if no supported divider fits the
    /// period; [`ConfigError::LeadOutOfRange`] if the lead quantizes to
    /// zero ticks or does not fit inside the period.
    pub fn from_timing(timing: &TimingConfig) -> Result<Self, ConfigError> {
        let period_error = ConfigError::PeriodTooLong {
            requested_ms: timing.measurement_period_ms,
            tick_hz: timing.tick_hz,
        };

        let mut divider = 1u32;
        let mut period_ticks = scaled_ticks(timing.measurement_period_ms, timing.tick_hz, divider);
        while period_ticks > MAX_COUNT {
            if divider >= MAX_DIVIDER {
                return Err(period_error);
            }
            divider <<= 1;
            period_ticks = scaled_ticks(timing.measurement_period_ms, timing.tick_hz, divider);
        }
        if period_ticks == 0 {
            return Err(period_error);
        }
        let top = period_ticks as u16;

        let lead_ticks = scaled_ticks(timing.power_up_lead_ms, timing.tick_hz, divider);
        if lead_ticks == 0 || lead_ticks >= period_ticks {
            return Err(ConfigError::LeadOutOfRange {
                requested_ms: timing.power_up_lead_ms,
                period_ticks: top,
            });
        }

        Ok(Self {
            divider,
            top,
            acquire_compare: (period_ticks - lead_ticks) as u16,
        })
    }

    /// Chosen prescale divider (a power of two).
    pub fn divider(&self) -> u32 {
        self.divider
    }

    /// log2 of the divider, as prescaler registers usually want it.
    pub fn prescaler_exponent(&self) -> u8 {
        self.divider.trailing_zeros() as u8
    }

    /// Reload/top compare value: the period in scaled ticks.
    pub fn top(&self) -> u16 {
        self.top
    }

    /// Secondary compare value, reached `lead` ticks after each reload.
    pub fn acquire_compare(&self) -> u16 {
        self.acquire_compare
    }

    /// Realized period expressed in undivided input ticks.
    pub fn realized_period_ticks(&self) -> u64 {
        self.top as u64 * self.divider as u64
    }
}

/// Ceiling-quantize a duration to scaled timer ticks.
fn scaled_ticks(duration_ms: u32, tick_hz: u32, divider: u32) -> u64 {
    let denominator = 1_000u64 * divider as u64;
    (duration_ms as u64 * tick_hz as u64 + (denominator - 1)) / denominator
}
