//! Synthetic meter disc seen through a reflective sensor

use ferraris_core::sensor::{ReflectanceSensor, Sample, SensorError};

/// Share of the disc circumference covered by the dark stripe
const STRIPE_FRACTION: f64 = 0.04;

/// ADC counts over the polished disc
const DISC_LEVEL: f64 = 310.0;

/// ADC counts over the stripe
const STRIPE_LEVEL: f64 = 960.0;

/// Milliseconds in an hour
const MS_PER_HOUR: f64 = 3_600_000.0;

/// A rotating disc whose speed follows a slowly varying household load
pub struct MockDisc {
    pulses_per_kwh: f64,
    tick_period_ms: f64,
    /// Simulated milliseconds since start
    elapsed_ms: f64,
    /// Disc position in revolutions, fractional part is the angle
    position: f64,
}

impl MockDisc {
    pub fn new(pulses_per_kwh: u32, tick_period_ms: u32) -> Self {
        Self {
            pulses_per_kwh: pulses_per_kwh as f64,
            tick_period_ms: tick_period_ms as f64,
            elapsed_ms: 0.0,
            position: 0.0,
        }
    }

    /// Household load in watts at the current simulated time
    pub fn load_watts(&self) -> f64 {
        let t = self.elapsed_ms / 1000.0;

        // Base load 400-1400 W, a kettle-like burst every 15 minutes
        let base = 900.0 + 500.0 * (t / 600.0).sin() + 80.0 * (t / 47.0).cos();
        let burst = if (t % 900.0) < 120.0 { 2000.0 } else { 0.0 };
        base + burst
    }

    fn advance(&mut self) {
        // revolutions/ms = W * rev/kWh / (1000 Wh/kWh * ms/h)
        let revs_per_ms = self.load_watts() * self.pulses_per_kwh / (1000.0 * MS_PER_HOUR);
        self.position += revs_per_ms * self.tick_period_ms;
        self.elapsed_ms += self.tick_period_ms;
    }
}

impl ReflectanceSensor for MockDisc {
    fn sample(&mut self) -> Result<Sample, SensorError> {
        self.advance();

        let angle = self.position.fract();
        let level = if angle < STRIPE_FRACTION {
            STRIPE_LEVEL
        } else {
            DISC_LEVEL
        };
        // A little ambient ripple that never crosses the threshold
        let ripple = 25.0 * (self.elapsed_ms / 7.0).sin();

        Ok((level + ripple).clamp(0.0, 1023.0) as Sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferraris_core::{MeterConfig, MeterEngine};

    #[test]
    fn test_engine_tracks_simulated_load() {
        let config = MeterConfig::DEFAULT;
        let mut engine = MeterEngine::new(config).unwrap();
        let mut disc = MockDisc::new(config.pulses_per_kwh, config.tick_period_ms);

        // Two simulated minutes
        for _ in 0..120_000 {
            let sample = disc.sample().unwrap();
            engine.tick(sample);
        }

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.minutes_committed(), 2);
        assert!(snapshot.total_pulses > 0);

        // Last rotation was measured against a load between 400 and 3400 W
        let watts = snapshot.current_usage();
        assert!((300..4_000).contains(&watts), "usage {} W out of range", watts);
    }
}
