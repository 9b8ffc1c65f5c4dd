use crate::storage::{CommittedMinute, MinuteHistory};

/// Counts rotations per minute window and commits them to the history
///
/// The commit and the reset of both counters happen in the same call, so
/// anything that observes the aggregator between ticks sees either the old
/// window with its slot unwritten, or the new window with the slot written.
#[derive(Debug, Clone, Copy)]
pub struct MinuteAggregator {
    ticks_per_minute: u32,
    ticks_this_minute: u32,
    rotations_this_minute: u16,
    history: MinuteHistory,
}

impl MinuteAggregator {
    pub const fn new(ticks_per_minute: u32) -> Self {
        Self {
            ticks_per_minute,
            ticks_this_minute: 0,
            rotations_this_minute: 0,
            history: MinuteHistory::new(),
        }
    }

    /// Count one tick, and one rotation if `pulse` fired on it
    ///
    /// Returns the committed minute when this tick closes the window.
    pub fn on_tick(&mut self, pulse: bool) -> Option<CommittedMinute> {
        self.ticks_this_minute += 1;
        if pulse {
            self.rotations_this_minute = self.rotations_this_minute.saturating_add(1);
        }

        if self.ticks_this_minute < self.ticks_per_minute {
            return None;
        }

        let committed = self.history.commit(self.rotations_this_minute);
        self.ticks_this_minute = 0;
        self.rotations_this_minute = 0;
        Some(committed)
    }

    pub const fn ticks_this_minute(&self) -> u32 {
        self.ticks_this_minute
    }

    pub const fn rotations_this_minute(&self) -> u16 {
        self.rotations_this_minute
    }

    pub const fn history(&self) -> &MinuteHistory {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_after_exactly_ticks_per_minute() {
        let mut minutes = MinuteAggregator::new(100);

        for tick in 1..100 {
            assert_eq!(minutes.on_tick(tick % 25 == 0), None, "tick {}", tick);
        }
        // 25, 50, 75 were pulses; the closing tick is a pulse too
        let committed = minutes.on_tick(true);

        assert_eq!(committed, Some(CommittedMinute { index: 0, rotations: 4 }));
        assert_eq!(minutes.history().get(0), Some(4));
        assert_eq!(minutes.history().next_index(), 1);
        assert_eq!(minutes.ticks_this_minute(), 0);
        assert_eq!(minutes.rotations_this_minute(), 0);
    }

    #[test]
    fn test_quiet_minute_commits_zero() {
        let mut minutes = MinuteAggregator::new(10);
        minutes.history.commit(5);

        let committed = (0..10).filter_map(|_| minutes.on_tick(false)).last();

        assert_eq!(committed, Some(CommittedMinute { index: 1, rotations: 0 }));
    }

    #[test]
    fn test_120_minutes_wrap_cursor() {
        let mut minutes = MinuteAggregator::new(3);
        let mut indices = alloc::vec::Vec::new();

        for _ in 0..(3 * 120) {
            if let Some(c) = minutes.on_tick(false) {
                indices.push(c.index);
            }
        }

        assert_eq!(indices, (0..120).collect::<alloc::vec::Vec<_>>());
        assert_eq!(minutes.history().next_index(), 0);
    }

    #[test]
    fn test_single_tick_minute() {
        let mut minutes = MinuteAggregator::new(1);
        assert_eq!(
            minutes.on_tick(true),
            Some(CommittedMinute { index: 0, rotations: 1 })
        );
        assert_eq!(
            minutes.on_tick(false),
            Some(CommittedMinute { index: 1, rotations: 0 })
        );
    }
}
