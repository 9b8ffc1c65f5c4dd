use crate::config::MarkingPolarity;
use crate::sensor::Sample;

/// Debounce state of the edge detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerState {
    /// Reflective disc in front of the sensor
    #[default]
    Idle,
    /// Marking in front of the sensor, pulse already emitted
    Triggered,
}

/// Emitted once per pass of the disc marking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseEvent {
    /// The sample that crossed onto the marking side
    pub sample: Sample,
}

/// Level-debounced threshold detector
///
/// A pulse fires on the Idle -> Triggered transition only. However many
/// ticks the marking stays in view, it produces one event; the detector
/// re-arms as soon as a sample reads reflective again.
#[derive(Debug, Clone, Copy)]
pub struct EdgeDetector {
    threshold: Sample,
    marking: MarkingPolarity,
    state: TriggerState,
}

impl EdgeDetector {
    pub const fn new(threshold: Sample, marking: MarkingPolarity) -> Self {
        Self {
            threshold,
            marking,
            state: TriggerState::Idle,
        }
    }

    /// Feed one sample; returns `Some` on the first marking sample after reflective ones
    pub fn on_tick(&mut self, sample: Sample) -> Option<PulseEvent> {
        if !self.marking.is_marking(sample, self.threshold) {
            self.state = TriggerState::Idle;
            return None;
        }

        match self.state {
            TriggerState::Idle => {
                self.state = TriggerState::Triggered;
                Some(PulseEvent { sample })
            }
            TriggerState::Triggered => None,
        }
    }

    pub const fn state(&self) -> TriggerState {
        self.state
    }
}
