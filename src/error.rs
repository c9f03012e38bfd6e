//! Error types for cycle configuration.
//!
//! Configuration errors are fatal by design: a period that cannot be
//! represented must stop startup rather than silently truncate. Hardware
//! errors are not represented here - they stay associated types on the
//! capability traits that produce them.

use core::fmt;

/// Cycle timer configuration error.
///
/// Returned by [`CycleTimerConfig::from_timing`]; callers should treat any
/// variant as fatal at startup.
///
/// [`CycleTimerConfig::from_timing`]: crate::timer::CycleTimerConfig::from_timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// The requested period does not fit the counter even at the maximum
    /// supported divider.
    PeriodTooLong {
        /// Requested measurement period in milliseconds
        requested_ms: u32,
        /// Timer tick frequency in Hz
        tick_hz: u32,
    },

    /// The power-up lead time quantizes to zero ticks or does not fit
    /// inside the period.
    ///
    /// A zero-tick lead would make power-on and acquisition coincide; a
    /// lead reaching the period would schedule acquisition before power-on.
    LeadOutOfRange {
        /// Requested lead time in milliseconds
        requested_ms: u32,
        /// Period length in timer ticks at the chosen divider
        period_ticks: u16,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::PeriodTooLong {
                requested_ms,
                tick_hz,
            } => {
                write!(
                    f,
                    "period {} ms unrepresentable at {} Hz",
                    requested_ms, tick_hz
                )
            }
            ConfigError::LeadOutOfRange {
                requested_ms,
                period_ticks,
            } => {
                write!(
                    f,
                    "lead time {} ms outside period of {} ticks",
                    requested_ms, period_ticks
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    extern crate std;
    use std::format;

    #[test]
    fn test_error_display() {
        let err = ConfigError::PeriodTooLong {
            requested_ms: 90_000_000,
            tick_hz: 32_768,
        };
        assert_eq!(format!("{}", err), "period 90000000 ms unrepresentable at 32768 Hz");

        let err = ConfigError::LeadOutOfRange {
            requested_ms: 5_000,
            period_ticks: 49_152,
        };
        assert_eq!(format!("{}", err), "lead time 5000 ms outside period of 49152 ticks");
    }

    #[test]
    fn test_error_equality() {
        let a = ConfigError::PeriodTooLong {
            requested_ms: 1,
            tick_hz: 2,
        };
        assert_eq!(a, a);
        assert_ne!(
            a,
            ConfigError::LeadOutOfRange {
                requested_ms: 1,
                period_ticks: 2
            }
        );
    }
}
