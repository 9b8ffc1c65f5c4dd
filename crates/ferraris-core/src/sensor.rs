//! Reflectance sensor boundary

use thiserror_no_std::Error;

/// One raw reflectance reading, in sensor-specific counts (ADC units)
pub type Sample = u16;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    #[error("conversion not ready")]
    NotReady,
    #[error("sensor read failed")]
    ReadFailed,
}

/// A reflectance source sampled once per tick.
///
/// Implementations are called from the tick path and must return in bounded
/// time. A conversion may be polled a fixed number of times, but a reading
/// that still isn't available is reported as [`SensorError::NotReady`]
/// instead of being waited on.
pub trait ReflectanceSensor {
    /// Take one reading.
    fn sample(&mut self) -> Result<Sample, SensorError>;
}

impl<S: ReflectanceSensor + ?Sized> ReflectanceSensor for &mut S {
    fn sample(&mut self) -> Result<Sample, SensorError> {
        (**self).sample()
    }
}

/// Sensor wrapper that never fails: a failed read repeats the last good one.
///
/// The engine needs exactly one sample per tick, so a dropped conversion is
/// filled with the previous value. Holding can't create a pulse on its own,
/// since the detector only fires on a change of side.
pub struct HeldSensor<S> {
    sensor: S,
    last: Sample,
    failures: u32,
}

impl<S: ReflectanceSensor> HeldSensor<S> {
    /// Wrap `sensor`, reporting `initial` until the first good read
    pub const fn new(sensor: S, initial: Sample) -> Self {
        Self {
            sensor,
            last: initial,
            failures: 0,
        }
    }

    /// Read the sensor, falling back to the last good sample
    pub fn sample(&mut self) -> Sample {
        match self.sensor.sample() {
            Ok(value) => self.last = value,
            Err(_) => self.failures = self.failures.wrapping_add(1),
        }
        self.last
    }

    /// Number of reads that were replaced by the held value
    pub const fn failures(&self) -> u32 {
        self.failures
    }

    pub const fn inner(&self) -> &S {
        &self.sensor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Scripted {
        readings: &'static [Result<Sample, SensorError>],
        pos: usize,
    }

    impl ReflectanceSensor for Scripted {
        fn sample(&mut self) -> Result<Sample, SensorError> {
            let r = self.readings[self.pos % self.readings.len()];
            self.pos += 1;
            r
        }
    }

    #[test]
    fn test_held_sensor_repeats_last_good_sample() {
        let mut sensor = HeldSensor::new(
            Scripted {
                readings: &[
                    Err(SensorError::NotReady),
                    Ok(500),
                    Err(SensorError::ReadFailed),
                    Ok(900),
                ],
                pos: 0,
            },
            100,
        );

        assert_eq!(sensor.sample(), 100);
        assert_eq!(sensor.sample(), 500);
        assert_eq!(sensor.sample(), 500);
        assert_eq!(sensor.sample(), 900);
        assert_eq!(sensor.failures(), 2);
    }
}
