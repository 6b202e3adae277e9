use std::collections::VecDeque;
use std::time::Duration;

use crate::hands::gesture_classifier::Gesture;
use crate::hands::HandSide;
use crate::shared::constants::GESTURE_HISTORY_LEN;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HistoryEntry {
    pub gesture: Gesture,
    pub side: HandSide,
    pub position: (f64, f64),
    pub timestamp: Duration,
}

/// Bounded log of the primary hand's recent gestures, oldest evicted first.
#[derive(Clone, Debug)]
pub struct GestureHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl Default for GestureHistory {
    fn default() -> Self {
        Self::with_capacity(GESTURE_HISTORY_LEN)
    }
}

impl GestureHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Most frequent gesture; ties go to the most recent.
    pub fn dominant(&self) -> Option<Gesture> {
        let mut best: Option<(Gesture, usize)> = None;
        for entry in self.entries.iter().rev() {
            let count = self
                .entries
                .iter()
                .filter(|e| e.gesture == entry.gesture)
                .count();
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((entry.gesture, count));
            }
        }
        best.map(|(g, _)| g)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
