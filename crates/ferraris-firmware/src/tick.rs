//! The tick source: samples the sensor and advances the engine every period

use embassy_time::{Duration, Ticker};
use ferraris_core::SharedMeter;
use ferraris_core::engine::{TickOutcome, UsageReading};
use ferraris_core::sensor::HeldSensor;
use log::{debug, info, warn};

use crate::adc_sensor::AdcReflectance;

/// Failed conversions are reported every this many failures
const FAILURE_REPORT_INTERVAL: u32 = 1000;

fn log_outcome(outcome: &TickOutcome) {
    if let Some(pulse) = outcome.pulse {
        match pulse.usage {
            UsageReading::Measured(watts) => {
                debug!("Pulse after {} ticks: {} W", pulse.interval_ticks, watts)
            }
            UsageReading::Held(watts) => warn!("Pulse with zero interval, holding {} W", watts),
        }
    }

    if let Some(committed) = outcome.committed {
        info!(
            "Minute {} committed: {} rotations",
            committed.index, committed.rotations
        );
    }
}

/// Sample the sensor once per tick period and feed the engine
///
/// Spawned on an interrupt executor, so it preempts the network and page
/// tasks running in thread mode. `Ticker` schedules against absolute
/// deadlines, so a tick held back by a critical section is caught up
/// rather than dropped.
#[embassy_executor::task]
pub async fn tick_task(
    meter: &'static SharedMeter,
    mut sensor: HeldSensor<AdcReflectance<'static>>,
    tick_period_ms: u32,
) {
    let mut ticker = Ticker::every(Duration::from_millis(tick_period_ms as u64));
    let mut reported_failures = 0;

    info!("Tick task running every {} ms", tick_period_ms);

    loop {
        ticker.next().await;

        let outcome = meter.tick(sensor.sample());
        log_outcome(&outcome);

        let failures = sensor.failures();
        if failures.wrapping_sub(reported_failures) >= FAILURE_REPORT_INTERVAL {
            warn!("{} ADC reads failed since boot, holding last sample", failures);
            reported_failures = failures;
        }
    }
}
