// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Session history of classification batches, for "undo last"
//!
//! Lives only as long as the server process. Oldest batches are dropped once
//! the configured capacity is reached.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

use crate::mover::MoveRecord;

/// One classification batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub moved_files: Vec<MoveRecord>,
    pub undone: bool,
}

/// Bounded in-memory list of recent batches
#[derive(Debug)]
pub struct SessionHistory {
    entries: VecDeque<BatchEntry>,
    capacity: usize,
}

impl SessionHistory {
    /// Create a history holding at most `capacity` batches
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Record a batch. Empty batches are not worth undoing and are ignored.
    pub fn record(&mut self, moved_files: Vec<MoveRecord>) -> Option<&BatchEntry> {
        if moved_files.is_empty() {
            return None;
        }

        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(BatchEntry {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            moved_files,
            undone: false,
        });
        self.entries.back()
    }

    /// Get the most recent N entries (newest first)
    pub fn get_recent(&self, count: usize) -> Vec<BatchEntry> {
        self.entries.iter().rev().take(count).cloned().collect()
    }

    /// Newest batch that has not been undone yet
    pub fn last_undoable(&self) -> Option<&BatchEntry> {
        self.entries.iter().rev().find(|e| !e.undone)
    }

    /// Mark an entry as undone
    pub fn mark_undone(&mut self, id: &str) -> bool {
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(entry) => {
                entry.undone = true;
                true
            }
            None => false,
        }
    }

    /// Number of batches held
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> MoveRecord {
        MoveRecord {
            source: format!("/in/{}", name),
            destination: format!("/out/L/{}", name),
        }
    }

    #[test]
    fn test_empty_batches_are_ignored() {
        let mut history = SessionHistory::new(5);
        assert!(history.record(Vec::new()).is_none());
        assert_eq!(history.len(), 0);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut history = SessionHistory::new(2);
        history.record(vec![record("1.jpg")]);
        history.record(vec![record("2.jpg")]);
        history.record(vec![record("3.jpg")]);

        assert_eq!(history.len(), 2);
        let recent = history.get_recent(10);
        assert_eq!(recent[0].moved_files[0], record("3.jpg"));
        assert_eq!(recent[1].moved_files[0], record("2.jpg"));
    }

    #[test]
    fn test_last_undoable_skips_undone() {
        let mut history = SessionHistory::new(5);
        let first = history.record(vec![record("1.jpg")]).unwrap().id.clone();
        let second = history.record(vec![record("2.jpg")]).unwrap().id.clone();

        assert_eq!(history.last_undoable().unwrap().id, second);
        assert!(history.mark_undone(&second));
        assert_eq!(history.last_undoable().unwrap().id, first);
        assert!(history.mark_undone(&first));
        assert!(history.last_undoable().is_none());
        assert!(!history.mark_undone("no-such-id"));
    }
}
