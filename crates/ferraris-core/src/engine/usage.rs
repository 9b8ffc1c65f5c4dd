/// Watt-hours numerator: 1000 Wh/kWh * 3_600_000 ms/h
const WATT_MS_PER_KWH: u64 = 1000 * 3_600_000;

/// Outcome of a usage update on a pulse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageReading {
    /// Rate computed from the interval since the previous pulse
    Measured(u32),
    /// Zero-length interval; the previous rate was kept
    Held(u32),
}

impl UsageReading {
    pub const fn watts(self) -> u32 {
        match self {
            Self::Measured(w) | Self::Held(w) => w,
        }
    }
}

/// Converts inter-pulse timing into an instantaneous power estimate
///
/// The estimate is last-observed-rate: it only changes on a pulse and keeps
/// its value in between, however long the disc takes to come round again.
#[derive(Debug, Clone, Copy)]
pub struct UsageEstimator {
    pulses_per_kwh: u32,
    tick_period_ms: u32,
    ticks_since_last_pulse: u32,
    current_watts: u32,
}

impl UsageEstimator {
    pub const fn new(pulses_per_kwh: u32, tick_period_ms: u32) -> Self {
        Self {
            pulses_per_kwh,
            tick_period_ms,
            ticks_since_last_pulse: 0,
            current_watts: 0,
        }
    }

    /// Count one elapsed tick
    pub fn advance(&mut self) {
        self.ticks_since_last_pulse = self.ticks_since_last_pulse.saturating_add(1);
    }

    /// Rate in watts for one rotation taking `ticks` ticks
    ///
    /// `watts = (1000 / pulses_per_kwh) * (3_600_000 / interval_ms)`, evaluated
    /// in integers with a single truncating division. `None` for a zero interval.
    pub fn estimate(&self, ticks: u32) -> Option<u32> {
        if ticks == 0 {
            return None;
        }

        let denominator = (self.pulses_per_kwh as u64)
            .checked_mul(ticks as u64)
            .and_then(|d| d.checked_mul(self.tick_period_ms as u64));

        // An interval long enough to overflow the denominator is far below 1 W
        let watts = match denominator {
            Some(0) | None => 0,
            Some(d) => WATT_MS_PER_KWH / d,
        };

        Some(u32::try_from(watts).unwrap_or(u32::MAX))
    }

    /// Update the estimate for a pulse `ticks` after the previous one
    ///
    /// Resets the inter-pulse counter. A zero interval keeps the previous rate.
    pub fn on_pulse(&mut self, ticks: u32) -> UsageReading {
        self.ticks_since_last_pulse = 0;

        match self.estimate(ticks) {
            Some(watts) => {
                self.current_watts = watts;
                UsageReading::Measured(watts)
            }
            None => UsageReading::Held(self.current_watts),
        }
    }

    /// Update the estimate from the internal inter-pulse counter
    pub fn pulse(&mut self) -> UsageReading {
        self.on_pulse(self.ticks_since_last_pulse)
    }

    pub const fn current_watts(&self) -> u32 {
        self.current_watts
    }

    pub const fn ticks_since_last_pulse(&self) -> u32 {
        self.ticks_since_last_pulse
    }
}
