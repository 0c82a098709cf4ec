//! Undo recording.
//!
//! Primitive edits append entries to the open group; [`Buffer::undo_boundary`]
//! closes it. [`Buffer::undo`] reverts the newest closed group and files the
//! inverse for [`Buffer::redo`]. Swapping in [`UndoList::Disabled`] turns
//! recording off for the duration of an operation.

use crate::buffer::Buffer;
use crate::error::Result;
use crate::text::Text;

/// Default maximum number of undo groups to retain.
const DEFAULT_MAX_HISTORY_DEPTH: usize = 1000;

/// One recorded primitive change.
#[derive(Clone, Debug, PartialEq)]
pub enum UndoEntry {
    /// Text was inserted over `[start, end)`.
    Insert { start: usize, end: usize },
    /// `text` was deleted from `pos`.
    Delete { pos: usize, text: Text },
    /// First change after the buffer was last unmodified.
    FirstChange,
}

impl UndoEntry {
    fn merge_insert(&mut self, start: usize, len: usize) -> bool {
        match self {
            Self::Insert { end, .. } if *end == start => {
                *end += len;
                true
            }
            _ => false,
        }
    }
}

/// Recorded history with bounded depth.
#[derive(Clone, Debug)]
pub struct UndoLog {
    undo_stack: Vec<Vec<UndoEntry>>,
    redo_stack: Vec<Vec<UndoEntry>>,
    current_group: Vec<UndoEntry>,
    max_depth: usize,
}

impl Default for UndoLog {
    fn default() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            current_group: Vec::new(),
            max_depth: DEFAULT_MAX_HISTORY_DEPTH,
        }
    }
}

impl UndoLog {
    #[must_use]
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            max_depth,
            ..Self::default()
        }
    }

    fn push(&mut self, entry: UndoEntry) {
        self.current_group.push(entry);
        self.redo_stack.clear();
    }

    fn commit(&mut self) {
        if !self.current_group.is_empty() {
            self.undo_stack.push(std::mem::take(&mut self.current_group));
            if self.undo_stack.len() > self.max_depth {
                let excess = self.undo_stack.len() - self.max_depth;
                self.undo_stack.drain(..excess);
            }
        }
    }

    fn pop_undo(&mut self) -> Option<Vec<UndoEntry>> {
        self.commit();
        self.undo_stack.pop()
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty() || !self.current_group.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Entries of the open group, oldest first.
    #[must_use]
    pub fn pending(&self) -> &[UndoEntry] {
        &self.current_group
    }

    /// Number of closed groups.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.undo_stack.len()
    }
}

/// The undo log slot of a buffer.
#[derive(Clone, Debug)]
pub enum UndoList {
    /// Recording is off.
    Disabled,
    Enabled(UndoLog),
}

impl Default for UndoList {
    fn default() -> Self {
        Self::Enabled(UndoLog::default())
    }
}

impl UndoList {
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::Disabled)
    }

    fn log_mut(&mut self) -> Option<&mut UndoLog> {
        match self {
            Self::Disabled => None,
            Self::Enabled(log) => Some(log),
        }
    }
}

impl Buffer {
    #[must_use]
    pub fn undo_list(&self) -> &UndoList {
        &self.undo
    }

    /// Replace the undo slot, returning the old one.
    pub fn set_undo_list(&mut self, list: UndoList) -> UndoList {
        std::mem::replace(&mut self.undo, list)
    }

    /// Turn recording off and drop history.
    pub fn buffer_disable_undo(&mut self) {
        self.undo = UndoList::Disabled;
    }

    /// Turn recording back on with fresh history.
    pub fn buffer_enable_undo(&mut self) {
        if self.undo.is_disabled() {
            self.undo = UndoList::Enabled(UndoLog::with_max_depth(self.options.undo_max_depth));
        }
    }

    /// Close the open undo group.
    pub fn undo_boundary(&mut self) {
        if let Some(log) = self.undo.log_mut() {
            log.commit();
        }
    }

    pub(crate) fn record_first_change_if_needed(&mut self) {
        if self.modiff == self.save_modiff {
            if let Some(log) = self.undo.log_mut() {
                log.push(UndoEntry::FirstChange);
            }
        }
    }

    pub(crate) fn record_insert(&mut self, start: usize, len: usize) {
        if len == 0 || self.undo.is_disabled() {
            return;
        }
        self.record_first_change_if_needed();
        if let Some(log) = self.undo.log_mut() {
            if let Some(last) = log.current_group.last_mut() {
                if last.merge_insert(start, len) {
                    log.redo_stack.clear();
                    return;
                }
            }
            log.push(UndoEntry::Insert {
                start,
                end: start + len,
            });
        }
    }

    pub(crate) fn record_delete(&mut self, pos: usize, text: Text) {
        if text.is_empty() || self.undo.is_disabled() {
            return;
        }
        self.record_first_change_if_needed();
        if let Some(log) = self.undo.log_mut() {
            log.push(UndoEntry::Delete { pos, text });
        }
    }

    /// Record that `[start, start + len)` is about to be rewritten in place.
    pub(crate) fn record_change(&mut self, start: usize, len: usize) {
        if len == 0 || self.undo.is_disabled() {
            return;
        }
        let old = self.substring_with_props(start, start + len);
        self.record_delete(start, old);
        self.record_insert(start, len);
    }

    /// Revert the newest undo group. Returns false if there was nothing to undo.
    pub fn undo(&mut self) -> Result<bool> {
        let Some(group) = self.undo.log_mut().and_then(UndoLog::pop_undo) else {
            return Ok(false);
        };
        let inverse = self.apply_undo_group(group)?;
        if let Some(log) = self.undo.log_mut() {
            log.redo_stack.push(inverse);
        }
        Ok(true)
    }

    /// Re-apply the newest undone group.
    pub fn redo(&mut self) -> Result<bool> {
        let Some(group) = self.undo.log_mut().and_then(|log| log.redo_stack.pop()) else {
            return Ok(false);
        };
        let inverse = self.apply_undo_group(group)?;
        if let Some(log) = self.undo.log_mut() {
            log.undo_stack.push(inverse);
        }
        Ok(true)
    }

    /// Apply entries newest first with recording off; returns the group
    /// that would revert what was just done, in the order it was done.
    fn apply_undo_group(&mut self, group: Vec<UndoEntry>) -> Result<Vec<UndoEntry>> {
        let saved = self.set_undo_list(UndoList::Disabled);
        let result = self.apply_undo_entries(group);
        self.undo = saved;
        result
    }

    fn apply_undo_entries(&mut self, group: Vec<UndoEntry>) -> Result<Vec<UndoEntry>> {
        let mut inverse = Vec::with_capacity(group.len());
        for entry in group.into_iter().rev() {
            match entry {
                UndoEntry::Insert { start, end } => {
                    let start = start.clamp(self.begv, self.zv);
                    let end = end.clamp(start, self.zv);
                    let text = self.substring_with_props(start, end);
                    self.del_range(start, end)?;
                    inverse.push(UndoEntry::Delete { pos: start, text });
                }
                UndoEntry::Delete { pos, text } => {
                    let pos = pos.clamp(self.begv, self.zv);
                    let len = text.chars_len();
                    self.insert_text_at(pos, &text, false, false)?;
                    self.set_point(pos + len);
                    inverse.push(UndoEntry::Insert {
                        start: pos,
                        end: pos + len,
                    });
                }
                UndoEntry::FirstChange => {
                    self.save_modiff = self.modiff;
                }
            }
        }
        Ok(inverse)
    }
}
