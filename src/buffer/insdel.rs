//! Insertion and deletion primitives.
//!
//! Every text change funnels through here so that the gap, markers, point,
//! text properties, the undo log and the change hooks stay in step.

use crate::buffer::hooks::CompositionCheck;
use crate::buffer::marker::InsertionType;
use crate::buffer::{Buffer, MAX_BUFFER_SIZE};
use crate::error::{Error, Result};
use crate::event::{BufferEvent, debug_log, emit_buffer_event};
use crate::text::coding;
use crate::text::{Text, TextProps};

impl Buffer {
    /// Insert `s` at point; point ends up after it.
    pub fn insert(&mut self, s: &str) -> Result<()> {
        self.insert_text(&Text::from(s))
    }

    /// Insert `text` with its properties at point.
    pub fn insert_text(&mut self, text: &Text) -> Result<()> {
        self.insert_at_point(text, false, false)
    }

    /// Insert at point, inheriting sticky properties from the neighbours.
    pub fn insert_and_inherit(&mut self, s: &str) -> Result<()> {
        self.insert_at_point(&Text::from(s), true, false)
    }

    /// Insert at point, relocating every marker at point after the text.
    pub fn insert_before_markers(&mut self, s: &str) -> Result<()> {
        self.insert_at_point(&Text::from(s), false, true)
    }

    pub fn insert_before_markers_and_inherit(&mut self, s: &str) -> Result<()> {
        self.insert_at_point(&Text::from(s), true, true)
    }

    fn insert_at_point(&mut self, text: &Text, inherit: bool, before_markers: bool) -> Result<()> {
        let n = text.chars_len();
        if n == 0 {
            return Ok(());
        }
        // Track the insertion spot through whatever the hooks do.
        let mark = self.create_marker(self.pt, InsertionType::Before);
        let result = self.insert_text_at(self.pt, text, inherit, before_markers);
        if result.is_ok() && !before_markers {
            if let Some(start) = self.markers.charpos(mark) {
                if self.pt == start {
                    self.set_point(start + n);
                }
            }
        }
        self.markers.remove(mark);
        result
    }

    /// Check `[start, end)` may change and run the before-change hooks.
    ///
    /// Hooks may edit the buffer, so the range comes back re-read from
    /// markers placed at its ends.
    pub(crate) fn prepare_to_modify(&mut self, start: usize, end: usize) -> Result<(usize, usize)> {
        self.check_writable(start, end)?;
        if !self.has_change_hooks() {
            return Ok((start, end));
        }
        let sm = self.create_marker(start, InsertionType::Before);
        let em = self.create_marker(end, InsertionType::After);
        let result = self.run_before_change(start, end);
        let s = self.markers.charpos(sm).unwrap_or(start);
        let e = self.markers.charpos(em).unwrap_or(end);
        self.markers.remove(sm);
        self.markers.remove(em);
        result?;
        let (s, e) = if s > e { (e, s) } else { (s, e) };
        Ok((s.clamp(self.begv, self.zv), e.clamp(self.begv, self.zv)))
    }

    /// Mark `[start, end)` as about to be rewritten in place. Returns the
    /// range as it stands after the before-change hooks.
    pub(crate) fn modify_text(&mut self, start: usize, end: usize) -> Result<(usize, usize)> {
        let range = self.prepare_to_modify(start, end)?;
        self.record_first_change_if_needed();
        self.bump_modiff();
        Ok(range)
    }

    pub(crate) fn bump_modiff(&mut self) {
        self.modiff += 1;
        self.chars_modiff = self.modiff;
    }

    /// Report that `lendel` characters at `start` became `lenins` characters.
    pub(crate) fn signal_after_change(&mut self, start: usize, lendel: usize, lenins: usize) -> Result<()> {
        self.run_after_change(start, start + lendel, start + lenins)
    }

    fn check_grow(&self, n_chars: usize, n_bytes: usize) -> Result<()> {
        if self.z.saturating_add(n_chars) > MAX_BUFFER_SIZE
            || self.z_byte.saturating_add(n_bytes) > MAX_BUFFER_SIZE
        {
            return Err(Error::Overflow("Maximum buffer size exceeded"));
        }
        Ok(())
    }

    /// Properties `text` gets when inserted at `pos`.
    fn props_for_insertion(&self, text: &Text, pos: usize, inherit: bool) -> TextProps {
        if !inherit {
            return text.props().clone();
        }
        let n = text.chars_len();
        let mut props = TextProps::new();
        props.set(0, n, &self.inheritable_properties(pos));
        for run in text.props().runs() {
            props.add(run.start, run.end, &run.plist);
        }
        props
    }

    /// Insert `text` at `pos` without moving point when point sits at `pos`.
    pub(crate) fn insert_text_at(
        &mut self,
        pos: usize,
        text: &Text,
        inherit: bool,
        before_markers: bool,
    ) -> Result<()> {
        let n = text.chars_len();
        if n == 0 {
            return Ok(());
        }
        self.check_accessible(pos)?;
        let bytes = coding::encode_str(text.as_str(), self.is_multibyte());
        self.check_grow(n, bytes.len())?;
        let (pos, _) = self.prepare_to_modify(pos, pos)?;
        let props = self.props_for_insertion(text, pos, inherit);
        let nbytes = bytes.len();
        let pos_byte = self.pos_byte(pos);

        self.record_insert(pos, n);
        self.gap_mut().insert_bytes(pos_byte - 1, &bytes);
        self.invalidate_positions(pos);
        self.markers
            .adjust_for_insert(pos, pos_byte, n, nbytes, before_markers);
        self.intervals.shift_for_insert(pos, n);
        self.intervals.graft(&props, pos);

        self.z += n;
        self.z_byte += nbytes;
        self.zv += n;
        self.zv_byte += nbytes;
        if self.pt > pos || (self.pt == pos && before_markers) {
            self.pt += n;
            self.pt_byte += nbytes;
        }
        self.bump_modiff();
        self.resort_overlays();
        debug_log(|| format!("insert {n} chars at {pos} in {}", self.name()));

        self.signal_after_change(pos, 0, n)?;
        self.update_compositions(pos, pos + n, CompositionCheck::Border);
        emit_buffer_event(BufferEvent::SizeChanged, self.name());
        Ok(())
    }

    /// Delete `[start, end)`, in either order, clamped to the accessible
    /// portion.
    pub fn del_range(&mut self, start: usize, end: usize) -> Result<()> {
        self.del_range_1(start, end, true).map(drop)
    }

    /// Delete and return the removed text with its properties.
    pub(crate) fn del_range_1(&mut self, start: usize, end: usize, prepare: bool) -> Result<Text> {
        let (start, end) = if start > end { (end, start) } else { (start, end) };
        let mut start = start.clamp(self.begv, self.zv);
        let mut end = end.clamp(self.begv, self.zv);
        if start == end {
            return Ok(Text::from_parts(String::new(), self.is_multibyte(), TextProps::new()));
        }
        if prepare {
            (start, end) = self.prepare_to_modify(start, end)?;
        }
        let from_byte = self.pos_byte(start);
        let to_byte = self.pos_byte(end);
        let n = end - start;
        let nbytes = to_byte - from_byte;

        let deleted = self.substring_with_props(start, end);
        self.record_delete(start, deleted.clone());
        self.gap_mut().delete_range(from_byte - 1, to_byte - 1);
        self.invalidate_positions(start);
        self.markers.adjust_for_delete(start, from_byte, end, to_byte);
        self.intervals.shift_for_delete(start, end);

        if self.pt > end {
            self.pt -= n;
            self.pt_byte -= nbytes;
        } else if self.pt > start {
            self.set_point_both(start, from_byte);
        }
        self.z -= n;
        self.z_byte -= nbytes;
        self.zv -= n;
        self.zv_byte -= nbytes;
        self.bump_modiff();
        self.evaporate_overlays(start);
        self.resort_overlays();
        debug_log(|| format!("delete {start}..{end} in {}", self.name()));

        self.signal_after_change(start, n, 0)?;
        self.update_compositions(start, start, CompositionCheck::Border);
        emit_buffer_event(BufferEvent::SizeChanged, self.name());
        Ok(deleted)
    }

    /// Replace `[from, to)` with `new`.
    ///
    /// Markers inside the old text collapse to `from`; markers at or past
    /// its end keep their distance from the end. Point inside the old text
    /// moves to the end of the new text; point after it keeps its distance
    /// from the end.
    pub(crate) fn replace_range(
        &mut self,
        from: usize,
        to: usize,
        new: &Text,
        prepare: bool,
        inherit: bool,
    ) -> Result<()> {
        let (mut from, mut to) = self.validate_region(from, to)?;
        if prepare {
            (from, to) = self.prepare_to_modify(from, to)?;
        }
        let bytes = coding::encode_str(new.as_str(), self.is_multibyte());
        let inschars = new.chars_len();
        let insbytes = bytes.len();
        let from_byte = self.pos_byte(from);
        let to_byte = self.pos_byte(to);
        let delchars = to - from;
        let delbytes = to_byte - from_byte;
        self.check_grow(inschars.saturating_sub(delchars), insbytes.saturating_sub(delbytes))?;
        let props = self.props_for_insertion(new, from, inherit);

        let old = self.substring_with_props(from, to);
        self.record_delete(from, old);
        self.record_insert(from, inschars);

        self.gap_mut().delete_range(from_byte - 1, to_byte - 1);
        self.gap_mut().insert_bytes(from_byte - 1, &bytes);
        self.invalidate_positions(from);
        self.markers
            .adjust_for_replace(from, from_byte, delchars, delbytes, inschars, insbytes);
        self.intervals.shift_for_delete(from, to);
        self.intervals.shift_for_insert(from, inschars);
        self.intervals.graft(&props, from);

        self.z = self.z + inschars - delchars;
        self.z_byte = self.z_byte + insbytes - delbytes;
        self.zv = self.zv + inschars - delchars;
        self.zv_byte = self.zv_byte + insbytes - delbytes;
        // Point moves arithmetically; the translator would read the stale pair.
        if from < self.pt {
            if self.pt >= to {
                let pt = self.pt + inschars - delchars;
                let pt_byte = self.pt_byte + insbytes - delbytes;
                self.set_point_both(pt, pt_byte);
            } else {
                self.set_point_both(from + inschars, from_byte + insbytes);
            }
        }
        self.bump_modiff();
        if inschars == 0 {
            self.evaporate_overlays(from);
        }
        self.resort_overlays();

        self.signal_after_change(from, delchars, inschars)?;
        self.update_compositions(from, from + inschars, CompositionCheck::Border);
        if inschars != delchars {
            emit_buffer_event(BufferEvent::SizeChanged, self.name());
        }
        Ok(())
    }
}
