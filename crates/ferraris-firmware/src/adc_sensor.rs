//! TCRT5000-style reflective sensor on ADC1

use esp_hal::Blocking;
use esp_hal::analog::adc::{Adc, AdcConfig, AdcPin, Attenuation};
use esp_hal::peripherals::{ADC1, GPIO1};
use ferraris_core::sensor::{ReflectanceSensor, Sample, SensorError};

/// Phototransistor output on GPIO1, read in one-shot mode
///
/// The 12-bit reading rises as reflection drops, so the disc stripe reads
/// high.
pub struct AdcReflectance<'d> {
    adc: Adc<'d, ADC1<'d>, Blocking>,
    pin: AdcPin<GPIO1<'d>, ADC1<'d>>,
}

impl<'d> AdcReflectance<'d> {
    pub fn new(adc1: ADC1<'d>, gpio: GPIO1<'d>) -> Self {
        let mut config = AdcConfig::new();
        // Full 0-3.1 V range, the sensor is powered from 3.3 V
        let pin = config.enable_pin(gpio, Attenuation::_11dB);
        let adc = Adc::new(adc1, config);

        Self { adc, pin }
    }
}

/// Polls of a running conversion before giving up on this tick
///
/// A one-shot conversion finishes in a few microseconds, well inside this.
const CONVERSION_POLLS: u32 = 64;

impl ReflectanceSensor for AdcReflectance<'_> {
    fn sample(&mut self) -> Result<Sample, SensorError> {
        for _ in 0..CONVERSION_POLLS {
            match self.adc.read_oneshot(&mut self.pin) {
                Ok(value) => return Ok(value),
                Err(nb::Error::WouldBlock) => continue,
                Err(nb::Error::Other(_)) => return Err(SensorError::ReadFailed),
            }
        }
        Err(SensorError::NotReady)
    }
}
