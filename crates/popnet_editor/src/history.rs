// SPDX-License-Identifier: MIT OR Apache-2.0
//! Undo/redo history of POP documents.
//!
//! Each entry stores the whole document before and after an edit as a
//! bincode snapshot. POP documents are small, so whole-document snapshots
//! stay cheap and make undo trivially exact.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Default maximum undo history depth
pub const MAX_HISTORY: usize = 100;

/// History errors
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Nothing to undo
    #[error("Nothing to undo")]
    NothingToUndo,

    /// Nothing to redo
    #[error("Nothing to redo")]
    NothingToRedo,

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

/// Result type for history operations
pub type Result<T> = std::result::Result<T, HistoryError>;

/// Unique entry ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(u64);

impl EntryId {
    /// Get the raw ID value
    pub fn value(&self) -> u64 {
        self.0
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Serialized document state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Bincode bytes
    pub data: Vec<u8>,
}

impl StateSnapshot {
    /// Create from serializable value
    pub fn from_value<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Self {
            data: bincode::serialize(value)?,
        })
    }

    /// Deserialize to value
    pub fn to_value<T: for<'de> Deserialize<'de>>(&self) -> Result<T> {
        Ok(bincode::deserialize(&self.data)?)
    }

    /// Size in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// One undoable edit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Unique entry ID
    pub id: EntryId,
    /// Human-readable description
    pub description: String,
    /// State before the edit (for undo)
    pub before: StateSnapshot,
    /// State after the edit (for redo)
    pub after: StateSnapshot,
    /// Unix timestamp in seconds
    pub timestamp: u64,
}

impl HistoryEntry {
    /// Get memory size of this entry
    pub fn memory_size(&self) -> usize {
        self.before.size() + self.after.size()
    }
}

/// History statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryStats {
    /// Entries in the undo stack
    pub undo_count: usize,
    /// Entries in the redo stack
    pub redo_count: usize,
    /// Total memory used by history (bytes)
    pub memory_used: usize,
    /// Maximum history depth
    pub max_depth: usize,
}

/// Undo/redo history manager
#[derive(Debug)]
pub struct History {
    undo_stack: VecDeque<HistoryEntry>,
    redo_stack: VecDeque<HistoryEntry>,
    next_id: u64,
    max_depth: usize,
    memory_used: usize,
}

impl History {
    /// Create a new history manager
    pub fn new() -> Self {
        Self::with_max_depth(MAX_HISTORY)
    }

    /// Create with custom maximum depth
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            next_id: 1,
            max_depth: max_depth.max(1),
            memory_used: 0,
        }
    }

    /// Record an edit. Identical snapshots are not recorded.
    pub fn commit(
        &mut self,
        description: impl Into<String>,
        before: StateSnapshot,
        after: StateSnapshot,
    ) -> Option<EntryId> {
        if before == after {
            return None;
        }

        let id = EntryId(self.next_id);
        self.next_id += 1;
        let entry = HistoryEntry {
            id,
            description: description.into(),
            before,
            after,
            timestamp: now_secs(),
        };

        self.redo_stack.clear();
        self.memory_used += entry.memory_size();
        self.undo_stack.push_back(entry);

        while self.undo_stack.len() > self.max_depth {
            if let Some(old) = self.undo_stack.pop_front() {
                self.memory_used = self.memory_used.saturating_sub(old.memory_size());
            }
        }

        Some(id)
    }

    /// Undo the last edit, returning it
    pub fn undo(&mut self) -> Result<HistoryEntry> {
        let entry = self
            .undo_stack
            .pop_back()
            .ok_or(HistoryError::NothingToUndo)?;

        self.memory_used = self.memory_used.saturating_sub(entry.memory_size());
        self.redo_stack.push_back(entry.clone());

        Ok(entry)
    }

    /// Redo the last undone edit, returning it
    pub fn redo(&mut self) -> Result<HistoryEntry> {
        let entry = self
            .redo_stack
            .pop_back()
            .ok_or(HistoryError::NothingToRedo)?;

        self.memory_used += entry.memory_size();
        self.undo_stack.push_back(entry.clone());

        Ok(entry)
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.memory_used = 0;
    }

    /// Get history statistics
    pub fn stats(&self) -> HistoryStats {
        HistoryStats {
            undo_count: self.undo_stack.len(),
            redo_count: self.redo_stack.len(),
            memory_used: self.memory_used,
            max_depth: self.max_depth,
        }
    }

    /// Get description of next undo
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(|e| e.description.as_str())
    }

    /// Get description of next redo
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.back().map(|e| e.description.as_str())
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(value: u32) -> StateSnapshot {
        StateSnapshot::from_value(&value).unwrap()
    }

    #[test]
    fn test_undo_redo_order() {
        let mut history = History::new();
        history.commit("first", snap(0), snap(1));
        history.commit("second", snap(1), snap(2));

        assert_eq!(history.undo_description(), Some("second"));
        let entry = history.undo().unwrap();
        assert_eq!(entry.before.to_value::<u32>().unwrap(), 1);
        assert_eq!(history.redo_description(), Some("second"));

        let entry = history.redo().unwrap();
        assert_eq!(entry.after.to_value::<u32>().unwrap(), 2);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_no_op_edits_are_skipped() {
        let mut history = History::new();
        assert!(history.commit("nothing", snap(3), snap(3)).is_none());
        assert!(!history.can_undo());
    }

    #[test]
    fn test_commit_clears_redo() {
        let mut history = History::new();
        history.commit("a", snap(0), snap(1));
        history.undo().unwrap();
        history.commit("b", snap(0), snap(5));
        assert!(!history.can_redo());
        assert!(matches!(history.redo(), Err(HistoryError::NothingToRedo)));
    }

    #[test]
    fn test_depth_limit() {
        let mut history = History::with_max_depth(3);
        for i in 0..10 {
            history.commit(format!("edit {i}"), snap(i), snap(i + 1));
        }
        let stats = history.stats();
        assert_eq!(stats.undo_count, 3);
        assert_eq!(stats.memory_used, 3 * 2 * std::mem::size_of::<u32>());
        assert_eq!(history.undo_description(), Some("edit 9"));
    }
}
