//! Processing-mode selection and bounded mode history

use crate::core::types::{ProcessingMode, Tick};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One mode decision, kept for trend analysis and the cognitive context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeHistoryEntry {
    pub mode: ProcessingMode,
    pub complexity: f64,
    pub tick: Tick,
}

/// Mode selection is a pure function of complexity and the two thresholds
pub fn select_mode(
    complexity: f64,
    reflexive_threshold: f64,
    cognitive_threshold: f64,
) -> ProcessingMode {
    if complexity < reflexive_threshold {
        ProcessingMode::Reflexive
    } else if complexity > cognitive_threshold {
        ProcessingMode::Cognitive
    } else {
        ProcessingMode::Mixed
    }
}

/// Bounded ring buffer of mode decisions
#[derive(Debug)]
pub struct ModeHistory {
    capacity: usize,
    entries: VecDeque<ModeHistoryEntry>,
}

impl ModeHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::with_capacity(capacity.max(1)),
        }
    }

    pub fn push(&mut self, entry: ModeHistoryEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// The most recent `n` entries, oldest first
    pub fn recent(&self, n: usize) -> Vec<ModeHistoryEntry> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_selection_boundaries() {
        // Defaults from the controller config: 0.3 / 0.7
        assert_eq!(select_mode(0.1, 0.3, 0.7), ProcessingMode::Reflexive);
        assert_eq!(select_mode(0.5, 0.3, 0.7), ProcessingMode::Mixed);
        assert_eq!(select_mode(0.9, 0.3, 0.7), ProcessingMode::Cognitive);
        // Exactly at a boundary stays mixed
        assert_eq!(select_mode(0.3, 0.3, 0.7), ProcessingMode::Mixed);
        assert_eq!(select_mode(0.7, 0.3, 0.7), ProcessingMode::Mixed);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut history = ModeHistory::new(3);
        for tick in 0..10 {
            history.push(ModeHistoryEntry {
                mode: ProcessingMode::Reflexive,
                complexity: 0.1,
                tick,
            });
            assert!(history.len() <= 3);
        }
        let recent = history.recent(3);
        assert_eq!(recent[0].tick, 7);
        assert_eq!(recent[2].tick, 9);
    }

    #[test]
    fn test_recent_window() {
        let mut history = ModeHistory::new(10);
        for tick in 0..5 {
            history.push(ModeHistoryEntry {
                mode: ProcessingMode::Mixed,
                complexity: 0.5,
                tick,
            });
        }
        assert_eq!(history.recent(2).len(), 2);
        assert_eq!(history.recent(2)[0].tick, 3);
        assert_eq!(history.recent(100).len(), 5);
    }
}
