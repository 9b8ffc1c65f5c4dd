//! Engine state shared between the tick path and readers
//!
//! The tick task mutates the engine while the web server reads it. Every
//! access goes through one critical section, so a reader can never see a
//! half-written usage value or a minute whose slot was written but whose
//! counters were not yet reset.

use core::cell::RefCell;
use core::ops::Range;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use heapless::Vec;

use crate::engine::{MeterEngine, MeterSnapshot, TickOutcome};
use crate::sensor::Sample;
use crate::storage::{HISTORY_MINUTES, HistoryWindow, WINDOW_MINUTES};

/// Interrupt-safe owner of the [`MeterEngine`]
///
/// `tick` is the only way to mutate the engine. Readers get copies taken
/// inside the same critical section, never references into live state.
pub struct SharedMeter {
    engine: Mutex<CriticalSectionRawMutex, RefCell<MeterEngine>>,
}

impl SharedMeter {
    pub const fn new(engine: MeterEngine) -> Self {
        Self {
            engine: Mutex::new(RefCell::new(engine)),
        }
    }

    /// Advance the engine by one tick
    ///
    /// Runs to completion with the critical section held; logging and other
    /// slow work belongs to the caller, on the returned outcome.
    pub fn tick(&self, sample: Sample) -> TickOutcome {
        self.engine.lock(|engine| engine.borrow_mut().tick(sample))
    }

    /// Copy the whole engine state at one instant
    pub fn snapshot(&self) -> MeterSnapshot {
        self.engine.lock(|engine| engine.borrow().snapshot())
    }

    /// Last instantaneous usage estimate in watts
    pub fn current_usage(&self) -> u32 {
        self.engine.lock(|engine| engine.borrow().current_usage())
    }

    /// Copy of the committed counts for `range`, `None` if out of bounds
    pub fn minute_history(&self, range: Range<usize>) -> Option<Vec<u16, HISTORY_MINUTES>> {
        self.engine.lock(|engine| {
            let engine = engine.borrow();
            let slots = engine.history().range(range)?;
            Vec::from_slice(slots).ok()
        })
    }

    /// Copy of one sixty-minute page of the history
    pub fn window(&self, window: HistoryWindow) -> [u16; WINDOW_MINUTES] {
        self.engine
            .lock(|engine| *engine.borrow().history().window(window))
    }
}

/// Read-only view of the meter used by the pages
pub trait MeterView {
    /// Last instantaneous usage estimate in watts
    fn current_usage(&self) -> u32;

    /// Rotation counts for one page of the history, in slot order
    fn window(&self, window: HistoryWindow) -> [u16; WINDOW_MINUTES];
}

impl MeterView for SharedMeter {
    fn current_usage(&self) -> u32 {
        SharedMeter::current_usage(self)
    }

    fn window(&self, window: HistoryWindow) -> [u16; WINDOW_MINUTES] {
        SharedMeter::window(self, window)
    }
}

impl MeterView for MeterSnapshot {
    fn current_usage(&self) -> u32 {
        MeterSnapshot::current_usage(self)
    }

    fn window(&self, window: HistoryWindow) -> [u16; WINDOW_MINUTES] {
        *MeterSnapshot::window(self, window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MeterConfig;

    fn shared(ticks_per_minute: u32) -> SharedMeter {
        let config = MeterConfig {
            ticks_per_minute,
            ..MeterConfig::DEFAULT
        };
        SharedMeter::new(MeterEngine::new(config).unwrap())
    }

    #[test]
    fn test_reads_before_first_pulse_are_zero() {
        let meter = shared(60_000);

        assert_eq!(meter.current_usage(), 0);
        assert_eq!(meter.window(HistoryWindow::Second), [0; WINDOW_MINUTES]);
        assert_eq!(meter.minute_history(0..120).map(|v| v.len()), Some(120));
    }

    #[test]
    fn test_tick_is_visible_to_readers() {
        let meter = shared(10);
        for t in 0..10 {
            meter.tick(if t == 3 { 1000 } else { 0 });
        }

        let snapshot = meter.snapshot();
        assert_eq!(snapshot.history.get(0), Some(1));
        assert_eq!(
            meter.minute_history(0..2).as_deref(),
            Some(&[1u16, 0][..])
        );
        assert_eq!(meter.minute_history(110..130), None);
    }

    #[test]
    fn test_snapshot_and_shared_views_agree() {
        let meter = shared(5);
        for t in 0..100 {
            meter.tick(if t % 7 == 0 { 1000 } else { 0 });
        }

        let snapshot = meter.snapshot();
        assert_eq!(
            MeterView::current_usage(&snapshot),
            MeterView::current_usage(&meter)
        );
        assert_eq!(
            MeterView::window(&snapshot, HistoryWindow::First),
            MeterView::window(&meter, HistoryWindow::First)
        );
    }
}
