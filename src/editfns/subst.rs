//! In-place character substitution.

use std::ops::{Deref, DerefMut};

use crate::buffer::{Buffer, CompositionCheck, UndoList};
use crate::error::Result;
use crate::text::coding::encode_char;
use crate::text::Text;

/// Turns undo recording and file bookkeeping off for its lifetime.
///
/// The buffer's undo log and file name are swapped out on creation and put
/// back on drop, whichever way the scope is left.
pub(crate) struct NoUndoGuard<'a> {
    buffer: &'a mut Buffer,
    saved: Option<(UndoList, Option<String>)>,
}

impl<'a> NoUndoGuard<'a> {
    pub(crate) fn new(buffer: &'a mut Buffer, active: bool) -> Self {
        let saved = active.then(|| {
            let undo = std::mem::replace(&mut buffer.undo, UndoList::Disabled);
            (undo, buffer.filename.take())
        });
        Self { buffer, saved }
    }

    fn active(&self) -> bool {
        self.saved.is_some()
    }
}

impl Deref for NoUndoGuard<'_> {
    type Target = Buffer;

    fn deref(&self) -> &Buffer {
        self.buffer
    }
}

impl DerefMut for NoUndoGuard<'_> {
    fn deref_mut(&mut self) -> &mut Buffer {
        self.buffer
    }
}

impl Drop for NoUndoGuard<'_> {
    fn drop(&mut self) {
        if let Some((undo, filename)) = self.saved.take() {
            self.buffer.undo = undo;
            self.buffer.filename = filename;
        }
    }
}

impl Buffer {
    /// Replace every `from` in `[start, end)` with `to`.
    ///
    /// Characters whose encodings have the same length are overwritten in
    /// place; otherwise each occurrence goes through a full replacement,
    /// keeping its text properties. With `noundo`, nothing is recorded for
    /// undo and the buffer's modified state is left alone.
    pub fn subst_char_in_region(
        &mut self,
        start: usize,
        end: usize,
        from: char,
        to: char,
        noundo: bool,
    ) -> Result<()> {
        let (start, end) = self.validate_region(start, end)?;
        let multibyte = self.is_multibyte();
        let mut from_bytes = Vec::with_capacity(4);
        let mut to_bytes = Vec::with_capacity(4);
        encode_char(from, multibyte, &mut from_bytes);
        encode_char(to, multibyte, &mut to_bytes);

        let mut buf = NoUndoGuard::new(self, noundo);
        let mut changed: Option<usize> = None;
        let mut last_changed = 0;
        let mut pos = start;
        let mut end = end;
        let mut pos_byte = buf.pos_byte(pos);

        while pos < end {
            let Some((_, len)) = buf.char_at_byte(pos_byte) else {
                break;
            };
            if buf.gap().bytes_range(pos_byte - 1, pos_byte - 1 + len) != from_bytes {
                pos += 1;
                pos_byte += len;
                continue;
            }
            if changed.is_none() {
                changed = Some(pos);
                let (_, new_end) = buf.modify_text(pos, end)?;
                end = new_end;
                let modiff = buf.modiff;
                if buf.active() && buf.save_modiff + 1 == modiff {
                    buf.save_modiff = modiff;
                }
                // The hooks may have edited the text; look again.
                pos_byte = buf.pos_byte(pos);
                continue;
            }
            if to_bytes.len() == len {
                buf.record_change(pos, 1);
                buf.gap_mut()
                    .contiguous_mut(pos_byte - 1, pos_byte - 1 + len)
                    .copy_from_slice(&to_bytes);
                pos_byte += len;
            } else {
                let props = buf.intervals.slice(pos, pos + 1);
                let replacement = Text::from_parts(to.to_string(), multibyte, props);
                buf.replace_range(pos, pos + 1, &replacement, false, false)?;
                pos_byte = buf.pos_byte(pos + 1);
            }
            last_changed = pos + 1;
            pos += 1;
        }

        if let Some(changed) = changed {
            if last_changed > changed {
                buf.signal_after_change(changed, last_changed - changed, last_changed - changed)?;
                buf.update_compositions(changed, last_changed, CompositionCheck::All);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{ChangeHooks, InsertionType};
    use crate::value::Value;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct AfterLog(Rc<RefCell<Vec<(usize, usize, usize)>>>);

    impl ChangeHooks for AfterLog {
        fn after_change(&mut self, _: &mut Buffer, start: usize, old_end: usize, new_end: usize) -> Result<()> {
            self.0.borrow_mut().push((start, old_end, new_end));
            Ok(())
        }
    }

    #[test]
    fn test_subst_in_place() {
        let mut buf = Buffer::with_text("t", "hello world");
        let m = buf.create_marker(9, InsertionType::Before);
        buf.subst_char_in_region(1, 12, 'o', '0', false).unwrap();
        assert_eq!(buf.text_string(), "hell0 w0rld");
        assert_eq!(buf.marker_position(m), Some(9));
        assert!(buf.modified_p());
        assert!(buf.undo().unwrap());
        assert_eq!(buf.text_string(), "hello world");
    }

    #[test]
    fn test_subst_only_inside_region() {
        let mut buf = Buffer::with_text("t", "aaaa");
        buf.subst_char_in_region(2, 4, 'a', 'b', false).unwrap();
        assert_eq!(buf.text_string(), "abba");
    }

    #[test]
    fn test_subst_signals_once() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut buf = Buffer::with_text("t", "hello world");
        buf.set_change_hooks(Box::new(AfterLog(log.clone())));
        buf.subst_char_in_region(1, 12, 'o', '0', false).unwrap();
        assert_eq!(*log.borrow(), vec![(5, 9, 9)]);
    }

    #[test]
    fn test_subst_noundo_leaves_state() {
        let mut buf = Buffer::with_text("t", "banana");
        buf.set_filename(Some("/tmp/banana.txt"));
        buf.subst_char_in_region(1, 7, 'a', 'o', true).unwrap();
        assert_eq!(buf.text_string(), "bonono");
        assert!(!buf.modified_p());
        assert_eq!(buf.filename(), Some("/tmp/banana.txt"));
        assert!(!buf.undo_list().is_disabled());
        assert!(!buf.undo().unwrap());
    }

    #[test]
    fn test_subst_length_mismatch_keeps_props_and_markers() {
        let mut buf = Buffer::with_text("t", "a-b-c");
        buf.put_text_property(2, 3, "face", Value::sym("dash")).unwrap();
        let m = buf.create_marker(5, InsertionType::Before);
        buf.subst_char_in_region(1, 6, '-', '—', false).unwrap();
        assert_eq!(buf.text_string(), "a—b—c");
        assert_eq!(buf.get_text_property(2, "face"), Some(&Value::sym("dash")));
        assert_eq!(buf.marker_position(m), Some(5));
        assert_eq!(buf.char_to_byte(5), Ok(9));
    }

    #[test]
    fn test_shrinking_subst_moves_point_byte() {
        let mut buf = Buffer::with_text("t", "aébc");
        buf.goto_char(4);
        buf.subst_char_in_region(1, 3, 'é', 'e', false).unwrap();
        assert_eq!(buf.point(), 4);
        assert_eq!(buf.point_byte(), 4);
        assert_eq!(buf.char_to_byte(4), Ok(4));
        buf.insert("X").unwrap();
        assert_eq!(buf.text_string(), "aebXc");
    }

    #[test]
    fn test_no_match_is_not_a_modification() {
        let mut buf = Buffer::with_text("t", "xyz");
        buf.subst_char_in_region(1, 4, 'q', 'r', false).unwrap();
        assert!(!buf.modified_p());
    }
}
