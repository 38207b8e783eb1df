//! Undo/redo manager with nested transactions.
//!
//! Records arrive one at a time from the document. Inside a transaction they
//! accumulate into a pending list; the outermost `finish` commits them as a
//! single [`CompoundEdit`]. Outside a transaction each record is committed
//! on its own. Applying records is the document's job; this type only owns
//! the stacks and the transaction bookkeeping.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use diagramkit_core::{constants, HistoryError};

use crate::change::ChangeRecord;

/// A named group of records undone and redone as one unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompoundEdit {
    pub name: String,
    pub records: Vec<ChangeRecord>,
}

/// Serializable copy of both stacks.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HistorySnapshot {
    pub undo: Vec<CompoundEdit>,
    pub redo: Vec<CompoundEdit>,
}

/// Manages undo/redo stacks for document edits
#[derive(Debug)]
pub struct UndoManager {
    undo_stack: VecDeque<CompoundEdit>,
    redo_stack: Vec<CompoundEdit>,
    max_depth: usize,
    /// Start offset into `pending` for each open transaction level.
    levels: Vec<usize>,
    pending: Vec<ChangeRecord>,
    replaying: Option<String>,
}

impl UndoManager {
    /// Create a new undo manager with the default depth
    pub fn new() -> Self {
        Self::with_depth(constants::MAX_UNDO_DEPTH)
    }

    /// Create with custom maximum undo depth (0 = unlimited)
    pub fn with_depth(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_depth,
            levels: Vec::new(),
            pending: Vec::new(),
            replaying: None,
        }
    }

    /// Record a change that has just been applied
    pub fn record(&mut self, record: ChangeRecord) -> Result<(), HistoryError> {
        if let Some(change) = &self.replaying {
            tracing::error!("Mutation {} while replaying {}", record, change);
            return Err(HistoryError::ReentrantMutation {
                change: change.clone(),
            });
        }
        if self.levels.is_empty() {
            let name = record.change.hint().to_string();
            self.push_undo(CompoundEdit {
                name,
                records: vec![record],
            });
        } else {
            self.pending.push(record);
        }
        Ok(())
    }

    fn push_undo(&mut self, edit: CompoundEdit) {
        // A new edit invalidates everything that was undone.
        self.redo_stack.clear();
        self.undo_stack.push_back(edit);
        if self.max_depth > 0 && self.undo_stack.len() > self.max_depth {
            self.undo_stack.pop_front();
        }
    }

    /// Open a transaction level
    pub fn start(&mut self) {
        self.levels.push(self.pending.len());
    }

    /// Close the innermost level. Closing the outermost commits the pending
    /// records as one edit named `name`; returns whether anything was
    /// committed. An empty transaction leaves no entry.
    pub fn finish(&mut self, name: &str) -> Result<bool, HistoryError> {
        self.levels.pop().ok_or(HistoryError::NoTransaction)?;
        if !self.levels.is_empty() || self.pending.is_empty() {
            return Ok(false);
        }
        let records = std::mem::take(&mut self.pending);
        tracing::info!("Committed '{}' ({} changes)", name, records.len());
        self.push_undo(CompoundEdit {
            name: name.to_string(),
            records,
        });
        Ok(true)
    }

    /// Close the innermost level, returning its records in recorded order.
    /// The caller reverts them last-first.
    pub fn abort(&mut self) -> Result<Vec<ChangeRecord>, HistoryError> {
        let mark = self.levels.pop().ok_or(HistoryError::NoTransaction)?;
        Ok(self.pending.split_off(mark))
    }

    pub fn in_transaction(&self) -> bool {
        !self.levels.is_empty()
    }

    pub fn transaction_depth(&self) -> usize {
        self.levels.len()
    }

    /// Records collected by the open transaction so far
    pub fn pending(&self) -> &[ChangeRecord] {
        &self.pending
    }

    /// Next edit to undo, without removing it
    pub fn peek_undo(&self) -> Result<Option<&CompoundEdit>, HistoryError> {
        self.check_closed()?;
        Ok(self.undo_stack.back())
    }

    /// Next edit to redo, without removing it
    pub fn peek_redo(&self) -> Result<Option<&CompoundEdit>, HistoryError> {
        self.check_closed()?;
        Ok(self.redo_stack.last())
    }

    /// Move the top undo edit to the redo stack after it was reverted
    pub(crate) fn complete_undo(&mut self) {
        if let Some(edit) = self.undo_stack.pop_back() {
            self.redo_stack.push(edit);
        }
    }

    /// Move the top redo edit back to the undo stack after it was reapplied
    pub(crate) fn complete_redo(&mut self) {
        if let Some(edit) = self.redo_stack.pop() {
            self.undo_stack.push_back(edit);
        }
    }

    /// Mark that stored records are being applied; any `record` call until
    /// `end_replay` is a re-entrant mutation.
    pub(crate) fn begin_replay(&mut self, what: &str) {
        self.replaying = Some(what.to_string());
    }

    pub(crate) fn end_replay(&mut self) {
        self.replaying = None;
    }

    pub fn is_replaying(&self) -> bool {
        self.replaying.is_some()
    }

    fn check_closed(&self) -> Result<(), HistoryError> {
        if self.levels.is_empty() {
            Ok(())
        } else {
            Err(HistoryError::TransactionOpen {
                name: format!("level {}", self.levels.len()),
            })
        }
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn undo_name(&self) -> Option<&str> {
        self.undo_stack.back().map(|e| e.name.as_str())
    }

    pub fn redo_name(&self) -> Option<&str> {
        self.redo_stack.last().map(|e| e.name.as_str())
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Clear all undo/redo history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot {
            undo: self.undo_stack.iter().cloned().collect(),
            redo: self.redo_stack.clone(),
        }
    }

    /// Replace both stacks. Open transactions must be closed first.
    pub fn restore(&mut self, snapshot: HistorySnapshot) -> Result<(), HistoryError> {
        self.check_closed()?;
        self.undo_stack = snapshot.undo.into();
        self.redo_stack = snapshot.redo;
        Ok(())
    }
}

impl Default for UndoManager {
    fn default() -> Self {
        Self::new()
    }
}
