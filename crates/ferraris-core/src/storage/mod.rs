pub mod history;

pub use history::*;

pub use crate::config::HISTORY_MINUTES;

/// Number of minutes shown on one history page
pub const WINDOW_MINUTES: usize = 60;

// Two pages cover the whole history with nothing left over
const _: () = assert!(HISTORY_MINUTES == 2 * WINDOW_MINUTES);

/// Half of the rolling history, as served by the minute pages
///
/// The history is split by slot index, not by age: `First` is always
/// slots 0..60 regardless of where the write cursor currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryWindow {
    /// Slots 0..60
    First,
    /// Slots 60..120
    Second,
}

impl HistoryWindow {
    /// Position of this window among the history pages
    pub const fn page(self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
        }
    }

    /// First slot index covered by this window
    pub const fn start(self) -> usize {
        self.page() * WINDOW_MINUTES
    }

    /// Slot range covered by this window
    pub const fn range(self) -> core::ops::Range<usize> {
        self.start()..self.start() + WINDOW_MINUTES
    }
}
