// SPDX-License-Identifier: MIT OR Apache-2.0
//! Undo/redo history of document snapshots.
//!
//! Every edit records the document before and after as bincode snapshots.
//! Undo hands back the `before` state, redo the `after` state.

use chill_graph::ProcessingGraph;
use std::collections::VecDeque;
use thiserror::Error;

/// Maximum undo history depth
const MAX_HISTORY: usize = 100;

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

/// Serialized document state
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// bincode bytes
    pub data: Vec<u8>,
}

impl Snapshot {
    /// Capture a graph
    pub fn capture(graph: &ProcessingGraph) -> Result<Self> {
        Ok(Self {
            data: bincode::serialize(graph)?,
        })
    }

    /// Rebuild the graph
    pub fn restore(&self) -> Result<ProcessingGraph> {
        Ok(bincode::deserialize(&self.data)?)
    }

    /// Size in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// One undoable edit
#[derive(Debug, Clone)]
pub struct Edit {
    /// Human-readable description
    pub description: String,
    /// Document before the edit
    pub before: Snapshot,
    /// Document after the edit
    pub after: Snapshot,
}

impl Edit {
    fn memory_size(&self) -> usize {
        self.before.size() + self.after.size()
    }
}

/// History statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryStats {
    /// Edits that can be undone
    pub undo_count: usize,
    /// Edits that can be redone
    pub redo_count: usize,
    /// Bytes held by snapshots
    pub memory_used: usize,
    /// Maximum history depth
    pub max_depth: usize,
}

/// Undo/redo history manager
#[derive(Debug)]
pub struct History {
    undo_stack: VecDeque<Edit>,
    redo_stack: VecDeque<Edit>,
    max_depth: usize,
    memory_used: usize,
}

impl History {
    /// Create with custom maximum depth
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            max_depth: max_depth.max(1),
            memory_used: 0,
        }
    }

    /// Record an edit; clears the redo stack
    pub fn record(&mut self, description: impl Into<String>, before: Snapshot, after: Snapshot) {
        let edit = Edit {
            description: description.into(),
            before,
            after,
        };
        self.redo_stack.clear();
        self.memory_used += edit.memory_size();
        self.undo_stack.push_back(edit);

        while self.undo_stack.len() > self.max_depth {
            if let Some(old) = self.undo_stack.pop_front() {
                self.memory_used = self.memory_used.saturating_sub(old.memory_size());
            }
        }
    }

    /// Step back; returns the document as it was before the last edit
    pub fn undo(&mut self) -> Result<ProcessingGraph> {
        let edit = self.undo_stack.back().ok_or(HistoryError::NothingToUndo)?;
        let graph = edit.before.restore()?;
        if let Some(edit) = self.undo_stack.pop_back() {
            self.memory_used = self.memory_used.saturating_sub(edit.memory_size());
            self.redo_stack.push_back(edit);
        }
        Ok(graph)
    }

    /// Step forward; returns the document as it was after the undone edit
    pub fn redo(&mut self) -> Result<ProcessingGraph> {
        let edit = self.redo_stack.back().ok_or(HistoryError::NothingToRedo)?;
        let graph = edit.after.restore()?;
        if let Some(edit) = self.redo_stack.pop_back() {
            self.memory_used += edit.memory_size();
            self.undo_stack.push_back(edit);
        }
        Ok(graph)
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

    /// Get description of next undo operation
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(|e| e.description.as_str())
    }

    /// Get description of next redo operation
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.back().map(|e| e.description.as_str())
    }
}

impl Default for History {
    fn default() -> Self {
        Self::with_max_depth(MAX_HISTORY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chill_graph::Processor;

    fn graph_with(names: &[&str]) -> ProcessingGraph {
        let mut g = ProcessingGraph::new();
        for name in names {
            g.add_processor(Processor::new(*name));
        }
        g
    }

    fn edit(history: &mut History, label: &str, before: &ProcessingGraph, after: &ProcessingGraph) {
        history.record(
            label,
            Snapshot::capture(before).unwrap(),
            Snapshot::capture(after).unwrap(),
        );
    }

    #[test]
    fn test_undo_redo_cycle() {
        let mut history = History::default();
        let empty = graph_with(&[]);
        let one = graph_with(&["A"]);
        edit(&mut history, "add A", &empty, &one);

        assert_eq!(history.undo_description(), Some("add A"));
        assert_eq!(history.undo().unwrap().processor_count(), 0);
        assert!(!history.can_undo());
        assert_eq!(history.redo_description(), Some("add A"));
        assert_eq!(history.redo().unwrap().processor_count(), 1);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_empty_history_errors() {
        let mut history = History::default();
        assert!(matches!(history.undo(), Err(HistoryError::NothingToUndo)));
        assert!(matches!(history.redo(), Err(HistoryError::NothingToRedo)));
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let mut history = History::default();
        let g = graph_with(&["A"]);
        edit(&mut history, "first", &g, &g);
        history.undo().unwrap();
        edit(&mut history, "second", &g, &g);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_depth_limit() {
        let mut history = History::with_max_depth(2);
        let g = graph_with(&["A"]);
        for label in ["one", "two", "three"] {
            edit(&mut history, label, &g, &g);
        }
        let stats = history.stats();
        assert_eq!(stats.undo_count, 2);
        assert!(stats.memory_used > 0);
        assert_eq!(history.undo_description(), Some("three"));
    }

    #[test]
    fn test_snapshot_keeps_ids() {
        let g = graph_with(&["A", "B"]);
        let restored = Snapshot::capture(&g).unwrap().restore().unwrap();
        let ids: Vec<_> = restored.processor_ids().collect();
        assert_eq!(ids, g.processor_ids().collect::<Vec<_>>());
    }
}
