//! The real-time metering engine
//!
//! [`MeterEngine`] owns every counter the meter keeps and has a single
//! mutation entry point, [`MeterEngine::tick`], driven once per tick by the
//! tick source with a fresh reflectance sample. Each tick runs in bounded
//! time and never fails:
//!
//! 1. the inter-pulse counter advances,
//! 2. the [`EdgeDetector`] decides whether this sample starts a pulse,
//! 3. on a pulse the [`UsageEstimator`] recomputes instantaneous watts,
//! 4. the [`MinuteAggregator`] counts the tick (and pulse) and commits the
//!    minute to the history when the window closes.
//!
//! Readers never touch the engine directly; they take a [`MeterSnapshot`].

mod aggregator;
mod detector;
mod usage;

pub use aggregator::MinuteAggregator;
pub use detector::{EdgeDetector, PulseEvent, TriggerState};
pub use usage::{UsageEstimator, UsageReading};

use core::ops::Range;

use crate::config::{ConfigError, MeterConfig};
use crate::sensor::Sample;
use crate::storage::{CommittedMinute, HistoryWindow, MinuteHistory, WINDOW_MINUTES};

/// A pulse together with the usage estimate it produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectedPulse {
    pub event: PulseEvent,
    pub usage: UsageReading,
    /// Ticks between the previous pulse and this one
    pub interval_ticks: u32,
}

/// What happened during one tick, for the caller to log or display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickOutcome {
    pub pulse: Option<DetectedPulse>,
    pub committed: Option<CommittedMinute>,
}

/// Owns all meter state and advances it one tick at a time
#[derive(Debug, Clone)]
pub struct MeterEngine {
    config: MeterConfig,
    clock_ticks: u32,
    total_pulses: u32,
    detector: EdgeDetector,
    usage: UsageEstimator,
    minutes: MinuteAggregator,
}

impl MeterEngine {
    /// Create an engine with all counters at zero and the detector idle
    pub fn new(config: MeterConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            config,
            clock_ticks: 0,
            total_pulses: 0,
            detector: EdgeDetector::new(config.reflectance_threshold, config.marking),
            usage: UsageEstimator::new(config.pulses_per_kwh, config.tick_period_ms),
            minutes: MinuteAggregator::new(config.ticks_per_minute),
        })
    }

    /// Advance the engine by one tick using `sample`
    pub fn tick(&mut self, sample: Sample) -> TickOutcome {
        self.clock_ticks = self.clock_ticks.wrapping_add(1);
        self.usage.advance();

        let pulse = self.detector.on_tick(sample).map(|event| {
            self.total_pulses = self.total_pulses.wrapping_add(1);
            let interval_ticks = self.usage.ticks_since_last_pulse();
            DetectedPulse {
                event,
                usage: self.usage.on_pulse(interval_ticks),
                interval_ticks,
            }
        });

        let committed = self.minutes.on_tick(pulse.is_some());

        TickOutcome { pulse, committed }
    }

    /// Copy out every value a reader may need
    pub fn snapshot(&self) -> MeterSnapshot {
        MeterSnapshot {
            clock_ticks: self.clock_ticks,
            total_pulses: self.total_pulses,
            trigger_state: self.detector.state(),
            ticks_since_last_pulse: self.usage.ticks_since_last_pulse(),
            usage_watts: self.usage.current_watts(),
            ticks_this_minute: self.minutes.ticks_this_minute(),
            rotations_this_minute: self.minutes.rotations_this_minute(),
            history: *self.minutes.history(),
            pulses_per_kwh: self.config.pulses_per_kwh,
        }
    }

    /// Last instantaneous usage estimate in watts
    pub const fn current_usage(&self) -> u32 {
        self.usage.current_watts()
    }

    pub const fn history(&self) -> &MinuteHistory {
        self.minutes.history()
    }
}

/// Consistent copy of the engine state at one instant between ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeterSnapshot {
    /// Ticks since boot, wrapping on overflow
    pub clock_ticks: u32,
    /// Pulses since boot, wrapping on overflow
    pub total_pulses: u32,
    pub trigger_state: TriggerState,
    pub ticks_since_last_pulse: u32,
    /// Last instantaneous usage estimate in watts
    pub usage_watts: u32,
    pub ticks_this_minute: u32,
    pub rotations_this_minute: u16,
    pub history: MinuteHistory,
    pulses_per_kwh: u32,
}

impl MeterSnapshot {
    pub const fn current_usage(&self) -> u32 {
        self.usage_watts
    }

    /// Committed rotation counts for the slots in `range`, in index order
    pub fn minute_history(&self, range: Range<usize>) -> Option<&[u16]> {
        self.history.range(range)
    }

    pub fn window(&self, window: HistoryWindow) -> &[u16; WINDOW_MINUTES] {
        self.history.window(window)
    }

    /// Slot that will receive the next commit
    pub const fn minute_index(&self) -> usize {
        self.history.next_index()
    }

    pub const fn minutes_committed(&self) -> u32 {
        self.history.commits()
    }

    pub fn last_commit(&self) -> Option<CommittedMinute> {
        self.history.latest()
    }

    /// Energy consumed since boot in watt-hours, truncated
    pub const fn energy_wh(&self) -> u64 {
        self.total_pulses as u64 * 1000 / self.pulses_per_kwh as u64
    }
}
