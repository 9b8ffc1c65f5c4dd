//! Circular per-minute rotation history
//!
//! Retention is a fixed two hours: slot `i` holds the rotations counted in
//! the `i`-th minute since the cursor last wrapped. Slots are overwritten in
//! place, one per minute boundary, and are never cleared.

use core::ops::Range;

use super::{HISTORY_MINUTES, HistoryWindow, WINDOW_MINUTES};

/// Result of closing one minute window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommittedMinute {
    /// Slot the count was written to
    pub index: usize,
    /// Rotations counted during the minute
    pub rotations: u16,
}

/// Fixed-size ring of per-minute rotation counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinuteHistory {
    slots: [u16; HISTORY_MINUTES],
    /// Slot receiving the next commit
    next: usize,
    /// Commits since boot, saturating
    commits: u32,
}

impl MinuteHistory {
    pub const fn new() -> Self {
        Self {
            slots: [0; HISTORY_MINUTES],
            next: 0,
            commits: 0,
        }
    }

    /// Write `rotations` into the current slot and advance the cursor
    pub fn commit(&mut self, rotations: u16) -> CommittedMinute {
        let index = self.next;
        self.slots[index] = rotations;
        self.next = (index + 1) % HISTORY_MINUTES;
        self.commits = self.commits.saturating_add(1);

        CommittedMinute { index, rotations }
    }

    /// Slot that will receive the next commit
    pub const fn next_index(&self) -> usize {
        self.next
    }

    /// Number of minutes committed since boot
    pub const fn commits(&self) -> u32 {
        self.commits
    }

    /// Rotation count stored in `index`, if it is a valid slot
    pub fn get(&self, index: usize) -> Option<u16> {
        self.slots.get(index).copied()
    }

    /// All slots in index order
    pub const fn slots(&self) -> &[u16; HISTORY_MINUTES] {
        &self.slots
    }

    /// Slots in `range`, in index order. `None` if the range leaves the buffer.
    pub fn range(&self, range: Range<usize>) -> Option<&[u16]> {
        self.slots.get(range)
    }

    /// The sixty slots of one history page
    pub fn window(&self, window: HistoryWindow) -> &[u16; WINDOW_MINUTES] {
        let (pages, _) = self.slots.as_chunks::<WINDOW_MINUTES>();
        &pages[window.page()]
    }

    /// Committed minutes, oldest first, as `(slot, rotations)`
    ///
    /// Before the first wrap only the written slots are yielded; afterwards
    /// all 120, starting at the cursor.
    pub fn chronological(&self) -> impl Iterator<Item = (usize, u16)> + '_ {
        let (start, len) = if (self.commits as usize) < HISTORY_MINUTES {
            (0, self.commits as usize)
        } else {
            (self.next, HISTORY_MINUTES)
        };

        (0..len).map(move |offset| {
            let index = (start + offset) % HISTORY_MINUTES;
            (index, self.slots[index])
        })
    }

    /// The most recently committed minute, if any
    pub fn latest(&self) -> Option<CommittedMinute> {
        if self.commits == 0 {
            return None;
        }
        let index = (self.next + HISTORY_MINUTES - 1) % HISTORY_MINUTES;
        Some(CommittedMinute {
            index,
            rotations: self.slots[index],
        })
    }
}

impl Default for MinuteHistory {
    fn default() -> Self {
        Self::new()
    }
}
