//! Meter calibration constants
//!
//! Everything the engine needs to know about the physical meter and the
//! tick source lives in [`MeterConfig`]. The values are fixed at build time
//! and checked once at startup by [`MeterConfig::validate`].

use log::warn;
use thiserror_no_std::Error;

/// Number of per-minute slots kept in the rolling history (two hours)
pub const HISTORY_MINUTES: usize = 120;

/// Milliseconds in a calibrated minute window
const MINUTE_MS: u64 = 60_000;

/// Which side of the reflectance threshold the disc marking reads on
///
/// With a TCRT-style reflective sensor the ADC reading drops as reflection
/// increases, so the dark stripe on the disc reads *above* the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkingPolarity {
    /// Samples `>= threshold` are the marking
    AboveThreshold,
    /// Samples `<= threshold` are the marking
    BelowThreshold,
}

impl MarkingPolarity {
    /// Returns true if `sample` is on the marking (non-reflective) side
    pub const fn is_marking(self, sample: u16, threshold: u16) -> bool {
        match self {
            Self::AboveThreshold => sample >= threshold,
            Self::BelowThreshold => sample <= threshold,
        }
    }
}

/// Calibration for a single rotating-disc meter and its tick source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeterConfig {
    /// ADC reading separating the reflective disc from the marking
    pub reflectance_threshold: u16,
    /// Which side of the threshold is the marking
    pub marking: MarkingPolarity,
    /// Disc rotations per kWh, printed on the meter's face plate
    pub pulses_per_kwh: u32,
    /// Ticks making up one history minute
    pub ticks_per_minute: u32,
    /// Period of the tick source in milliseconds
    pub tick_period_ms: u32,
}

impl MeterConfig {
    /// Calibration of the reference installation: 375 rev/kWh meter,
    /// 1 ms ticks, stripe reading above 840 counts.
    pub const DEFAULT: Self = Self {
        reflectance_threshold: 840,
        marking: MarkingPolarity::AboveThreshold,
        pulses_per_kwh: 375,
        ticks_per_minute: 60_000,
        tick_period_ms: 1,
    };

    /// Check the constants the engine divides by or counts against
    ///
    /// A minute window that does not add up to 60 seconds of ticks is
    /// accepted, but logged, since history bins will then not be minutes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pulses_per_kwh == 0 {
            return Err(ConfigError::ZeroPulsesPerKwh);
        }
        if self.tick_period_ms == 0 {
            return Err(ConfigError::ZeroTickPeriod);
        }
        if self.ticks_per_minute == 0 {
            return Err(ConfigError::ZeroTicksPerMinute);
        }

        let window_ms = self.minute_window_ms();
        if window_ms != MINUTE_MS {
            warn!(
                "Minute window is {} ms ({} ticks of {} ms), history bins will not be minutes",
                window_ms, self.ticks_per_minute, self.tick_period_ms
            );
        }

        Ok(())
    }

    /// Wall-clock length of one history bin in milliseconds
    pub const fn minute_window_ms(&self) -> u64 {
        self.ticks_per_minute as u64 * self.tick_period_ms as u64
    }

    /// Returns true if `sample` reads as the disc marking
    pub const fn is_marking(&self, sample: u16) -> bool {
        self.marking.is_marking(sample, self.reflectance_threshold)
    }
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("pulses per kWh must be non-zero")]
    ZeroPulsesPerKwh,
    #[error("tick period must be non-zero")]
    ZeroTickPeriod,
    #[error("ticks per minute must be non-zero")]
    ZeroTicksPerMinute,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid_and_calibrated() {
        let config = MeterConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.minute_window_ms(), 60_000);
    }

    #[test]
    fn test_rejects_zero_divisors() {
        let mut config = MeterConfig::DEFAULT;
        config.pulses_per_kwh = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroPulsesPerKwh));

        let mut config = MeterConfig::DEFAULT;
        config.tick_period_ms = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroTickPeriod));

        let mut config = MeterConfig::DEFAULT;
        config.ticks_per_minute = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroTicksPerMinute));
    }

    #[test]
    fn test_short_minute_window_is_accepted() {
        // 6000 ticks of 1 ms is a 6 second "minute"
        let config = MeterConfig {
            ticks_per_minute: 6_000,
            ..MeterConfig::DEFAULT
        };
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.minute_window_ms(), 6_000);
    }

    #[test]
    fn test_marking_polarity() {
        assert!(MarkingPolarity::AboveThreshold.is_marking(840, 840));
        assert!(MarkingPolarity::AboveThreshold.is_marking(900, 840));
        assert!(!MarkingPolarity::AboveThreshold.is_marking(839, 840));

        assert!(MarkingPolarity::BelowThreshold.is_marking(100, 840));
        assert!(!MarkingPolarity::BelowThreshold.is_marking(841, 840));
    }
}
