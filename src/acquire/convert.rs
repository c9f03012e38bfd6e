//! Raw measurement codes and their engineering-unit conversion.

/// Report unit for converted temperatures.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Unit {
    /// Degrees Celsius (the primary unit)
    Celsius,

    /// Degrees Fahrenheit, rescaled from the Celsius conversion
    Fahrenheit,
}

/// Unsigned two-byte measurement code as read from the sensor.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSample(u16);

impl RawSample {
    /// Build a sample from the most- and least-significant bytes.
    pub fn from_bytes(ms: u8, ls: u8) -> Self {
        Self(u16::from_be_bytes([ms, ls]))
    }

    /// The raw code.
    pub fn code(&self) -> u16 {
        self.0
    }

    /// Convert the code to degrees Celsius.
    pub fn celsius(&self) -> f32 {
        (175.72 * f32::from(self.0)) / 65_536.0 - 46.85
    }
}

/// A converted temperature in its report unit.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Temperature {
    degrees: f32,
    unit: Unit,
}

impl Temperature {
    /// Convert a raw sample into the preferred unit.
    ///
    /// The Celsius conversion always runs first; the Fahrenheit result is
    /// rescaled from it rather than computed directly, so both units
    /// derive from the same primary value.
    pub fn from_raw(sample: RawSample, unit: Unit) -> Self {
        let celsius = sample.celsius();
        let degrees = match unit {
            Unit::Celsius => celsius,
            Unit::Fahrenheit => celsius * 1.8 + 32.0,
        };
        Self { degrees, unit }
    }

    /// The temperature value.
    pub fn degrees(&self) -> f32 {
        self.degrees
    }

    /// The unit `degrees` is expressed in.
    pub fn unit(&self) -> Unit {
        self.unit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_byte_order() {
        assert_eq!(RawSample::from_bytes(0x12, 0x34).code(), 0x1234);
        assert_eq!(RawSample::from_bytes(0x00, 0xFF).code(), 0x00FF);
    }

    #[test]
    fn test_celsius_conversion_exact() {
        let sample = RawSample::from_bytes(0x66, 0x00);
        let expected = (175.72 * 26_112.0) / 65_536.0 - 46.85;
        assert_eq!(sample.celsius(), expected);
    }

    #[test]
    fn test_zero_code() {
        assert_eq!(RawSample::from_bytes(0x00, 0x00).celsius(), -46.85);
    }

    #[test]
    fn test_fahrenheit_rescales_primary() {
        let sample = RawSample::from_bytes(0x66, 0x00);
        let primary = sample.celsius();

        let reading = Temperature::from_raw(sample, Unit::Fahrenheit);
        assert_eq!(reading.unit(), Unit::Fahrenheit);
        assert_eq!(reading.degrees(), primary * 1.8 + 32.0);
    }

    #[test]
    fn test_celsius_reading_keeps_primary() {
        let sample = RawSample::from_bytes(0x65, 0xA0);
        let reading = Temperature::from_raw(sample, Unit::Celsius);
        assert_eq!(reading.unit(), Unit::Celsius);
        assert_eq!(reading.degrees(), sample.celsius());
    }
}
