//! ESP32-S3 firmware-specific modules for ferraris
//!
//! This crate contains hardware-specific code that cannot compile on desktop
//! targets: the ADC-backed reflectance sensor, the tick task feeding the
//! engine, WiFi bring-up and the TCP page server.

#![no_std]

extern crate alloc;

pub mod adc_sensor;
pub mod net;
pub mod tick;
pub mod wifi_secrets;
