//! Fields: runs of text sharing a `field` property value.
//!
//! A field is never stored. It is recomputed from the `field` char-property
//! (overlays first, then text properties) each time it is needed. The value
//! `boundary` separates fields and can be merged across.

use crate::buffer::Buffer;
use crate::error::Result;
use crate::text::Text;
use crate::value::{Plist, Value};

const FIELD: &str = "field";
const BOUNDARY: &str = "boundary";

static NIL: Value = Value::Nil;

/// Which neighbour a character inserted at a position takes a text
/// property from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stickiness {
    /// From the character before (rear-sticky).
    Before,
    /// From the character after (front-sticky).
    After,
    /// From neither.
    Neither,
}

fn or_nil(v: Option<&Value>) -> &Value {
    v.unwrap_or(&NIL)
}

fn lists_or_non_nil(v: Option<&Value>, prop: &str) -> bool {
    match v {
        Some(Value::List(items)) => items.iter().any(|x| x.is_symbol(prop)),
        Some(other) => !other.is_nil(),
        None => false,
    }
}

impl Buffer {
    /// Value of `prop` for the character at `pos`: the highest-priority
    /// overlay covering it that has the property, else the text property.
    #[must_use]
    pub fn get_char_property(&self, pos: usize, prop: &str) -> Option<&Value> {
        for id in self.overlays_at(pos, true) {
            if let Some(v) = self.overlay_get(id, prop).filter(|v| !v.is_nil()) {
                return Some(v);
            }
        }
        self.get_text_property(pos, prop)
    }

    /// Stickiness of `prop` for an insertion at `pos`.
    ///
    /// Properties are rear-sticky unless named by `rear-nonsticky` on the
    /// preceding character or marked in the default-nonsticky option, and
    /// front-sticky only when named by `front-sticky` on the following
    /// character. When both apply the preceding character wins unless its
    /// value is nil.
    #[must_use]
    pub fn text_property_stickiness(&self, prop: &str, pos: usize) -> Stickiness {
        let ignore_previous = pos <= self.begv;
        let default_nonsticky = self
            .options
            .text_property_default_nonsticky
            .iter()
            .any(|(name, nonsticky)| name == prop && *nonsticky);
        let rear_sticky = !ignore_previous
            && !default_nonsticky
            && !lists_or_non_nil(self.get_text_property(pos - 1, "rear-nonsticky"), prop);
        let front_sticky = self
            .get_text_property(pos, "front-sticky")
            .is_some_and(|v| v.is_t_or_lists(prop));

        match (rear_sticky, front_sticky) {
            (true, false) => Stickiness::Before,
            (false, true) => Stickiness::After,
            (false, false) => Stickiness::Neither,
            (true, true) => {
                if or_nil(self.get_text_property(pos - 1, prop)).is_nil() {
                    Stickiness::After
                } else {
                    Stickiness::Before
                }
            }
        }
    }

    /// Text property `prop` a character inserted at `pos` would inherit.
    pub(crate) fn inherited_text_property(&self, pos: usize, prop: &str) -> Option<&Value> {
        match self.text_property_stickiness(prop, pos) {
            Stickiness::After => self.get_text_property(pos, prop),
            Stickiness::Before if pos > self.begv => self.get_text_property(pos - 1, prop),
            _ => None,
        }
    }

    /// Every text property inherited by an insertion at `pos`.
    pub(crate) fn inheritable_properties(&self, pos: usize) -> Plist {
        let mut names: Vec<&str> = Vec::new();
        for plist in [
            pos.checked_sub(1).and_then(|p| self.text_properties_at(p)),
            self.text_properties_at(pos),
        ]
        .into_iter()
        .flatten()
        {
            for (name, _) in plist.iter() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        let mut out = Plist::new();
        for name in names {
            if let Some(v) = self.inherited_text_property(pos, name).filter(|v| !v.is_nil()) {
                out.put(name, v.clone());
            }
        }
        out
    }

    /// Value of `prop` a character inserted at `pos` would get, from
    /// overlays that would cover it or else from sticky text properties.
    #[must_use]
    pub fn get_pos_property(&self, pos: usize, prop: &str) -> Option<&Value> {
        let mut ids = self.overlays_touching(pos);
        self.sort_overlays(&mut ids);
        for id in ids {
            if let Some(v) = self.overlay_get(id, prop).filter(|v| !v.is_nil()) {
                return Some(v);
            }
        }
        self.inherited_text_property(pos, prop)
    }

    /// Next position after `pos` where a text property or overlay boundary
    /// occurs, capped at `limit` (ZV by default).
    #[must_use]
    pub fn next_char_property_change(&self, pos: usize, limit: Option<usize>) -> usize {
        let limit = limit.unwrap_or(self.zv);
        let overlay = self.next_overlay_change(pos);
        let text = self.next_property_change(pos, Some(limit)).unwrap_or(limit);
        overlay.min(text).min(limit.max(pos))
    }

    /// Previous position before `pos` where a text property or overlay
    /// boundary occurs, floored at `limit` (BEGV by default).
    #[must_use]
    pub fn previous_char_property_change(&self, pos: usize, limit: Option<usize>) -> usize {
        let limit = limit.unwrap_or(self.begv);
        let overlay = self.previous_overlay_change(pos);
        let text = self
            .intervals
            .previous_change(pos)
            .filter(|&p| p > limit)
            .unwrap_or(limit);
        overlay.max(text).max(limit.min(pos))
    }

    /// First position after `pos` where the char-property `prop` changes,
    /// or `limit` (ZV by default) if it is constant up to there.
    #[must_use]
    pub fn next_single_char_property_change(&self, pos: usize, prop: &str, limit: Option<usize>) -> usize {
        let limit = limit.unwrap_or(self.zv).min(self.zv);
        if pos >= limit {
            return limit;
        }
        let initial = or_nil(self.get_char_property(pos, prop));
        let mut pos = pos;
        loop {
            pos = self.next_char_property_change(pos, Some(limit));
            if pos >= limit {
                return limit;
            }
            if or_nil(self.get_char_property(pos, prop)) != initial || pos >= self.zv {
                return pos;
            }
        }
    }

    /// Last position before `pos` where the char-property `prop` of the
    /// preceding character changes, or `limit` (BEGV by default).
    #[must_use]
    pub fn previous_single_char_property_change(
        &self,
        pos: usize,
        prop: &str,
        limit: Option<usize>,
    ) -> usize {
        let limit = limit.unwrap_or(self.begv).max(self.begv);
        if pos <= limit {
            return limit;
        }
        let initial = or_nil(self.get_char_property(pos - 1, prop));
        let mut pos = pos;
        loop {
            pos = self.previous_char_property_change(pos, Some(limit));
            if pos <= limit {
                return limit;
            }
            if or_nil(self.get_char_property(pos - 1, prop)) != initial {
                return pos;
            }
        }
    }

    /// Bounds of the field around `pos` (point when `None`).
    ///
    /// With `merge_at_boundary`, a `boundary` field adjoining `pos` is
    /// fused with the fields on either side of it. Without it, `pos` may
    /// itself be a field edge, depending on which field a character
    /// inserted there would join.
    pub fn find_field(
        &self,
        pos: Option<usize>,
        merge_at_boundary: bool,
        beg_limit: Option<usize>,
        end_limit: Option<usize>,
    ) -> Result<(usize, usize)> {
        let pos = self.check_accessible(pos.unwrap_or(self.pt))?;
        let after_field = or_nil(self.get_char_property(pos, FIELD));
        let before_field = if pos > self.begv {
            or_nil(self.get_char_property(pos - 1, FIELD))
        } else {
            after_field
        };

        let mut at_field_start = false;
        let mut at_field_end = false;
        if !merge_at_boundary {
            let field = or_nil(self.get_pos_property(pos, FIELD));
            at_field_end = field != after_field;
            at_field_start = field != before_field;
            if field.is_nil() && at_field_start && at_field_end {
                // Probably a non-editable field such as a prompt rather
                // than an empty field between two others.
                at_field_start = false;
                at_field_end = false;
            }
        }

        let beg = if at_field_start {
            pos
        } else {
            let mut p = pos;
            if merge_at_boundary && before_field.is_symbol(BOUNDARY) {
                p = self.previous_single_char_property_change(p, FIELD, beg_limit);
            }
            self.previous_single_char_property_change(p, FIELD, beg_limit)
        };

        let end = if at_field_end {
            pos
        } else {
            let mut p = pos;
            if merge_at_boundary && after_field.is_symbol(BOUNDARY) {
                p = self.next_single_char_property_change(p, FIELD, end_limit);
            }
            self.next_single_char_property_change(p, FIELD, end_limit)
        };

        Ok((beg, end))
    }

    /// Start of the field at `pos`. With `escape_from_edge`, a position at
    /// the start of a field belongs to the previous one. Never returns less
    /// than `limit`.
    pub fn field_beginning(&self, pos: Option<usize>, escape_from_edge: bool, limit: Option<usize>) -> Result<usize> {
        self.find_field(pos, escape_from_edge, limit, None)
            .map(|(beg, _)| beg)
    }

    /// End of the field at `pos`. Never returns more than `limit`.
    pub fn field_end(&self, pos: Option<usize>, escape_from_edge: bool, limit: Option<usize>) -> Result<usize> {
        self.find_field(pos, escape_from_edge, None, limit)
            .map(|(_, end)| end)
    }

    /// Contents of the field at `pos`, with properties.
    pub fn field_string(&mut self, pos: Option<usize>) -> Result<Text> {
        let (beg, end) = self.find_field(pos, false, None, None)?;
        self.buffer_substring(beg, end)
    }

    pub fn field_string_no_properties(&self, pos: Option<usize>) -> Result<String> {
        let (beg, end) = self.find_field(pos, false, None, None)?;
        self.buffer_substring_no_properties(beg, end)
    }

    /// Delete the field at `pos`.
    pub fn delete_field(&mut self, pos: Option<usize>) -> Result<()> {
        let (beg, end) = self.find_field(pos, false, None, None)?;
        if beg < end {
            self.del_range(beg, end)?;
        }
        Ok(())
    }

    /// Return the position closest to `new_pos` that is in the same field
    /// as `old_pos`.
    ///
    /// With `new_pos` of `None`, point is used and moved to the result.
    /// With `only_in_line`, a constraint that would cross a newline is not
    /// applied. No constraint applies when `inhibit_capture_property` is
    /// set on `old_pos`, or field motion is inhibited.
    pub fn constrain_to_field(
        &mut self,
        new_pos: Option<usize>,
        old_pos: usize,
        escape_from_edge: bool,
        only_in_line: bool,
        inhibit_capture_property: Option<&str>,
    ) -> usize {
        let orig_point = new_pos.is_none().then_some(self.pt);
        let mut new_pos = new_pos.unwrap_or(self.pt);
        let fwd = new_pos > old_pos;

        if self.field_constraint_applies(new_pos, old_pos, inhibit_capture_property) {
            let bound = if fwd {
                self.field_end(Some(old_pos), escape_from_edge, Some(new_pos))
            } else {
                self.field_beginning(Some(old_pos), escape_from_edge, Some(new_pos))
            };
            if let Ok(bound) = bound {
                let crosses_new = if bound < new_pos { fwd } else { !fwd };
                if crosses_new && (!only_in_line || !self.newline_between(new_pos, bound)) {
                    new_pos = bound;
                }
            }
            if orig_point.is_some_and(|pt| pt != new_pos) {
                self.set_point(new_pos);
            }
        }
        new_pos
    }

    fn field_constraint_applies(&self, new_pos: usize, old_pos: usize, inhibit: Option<&str>) -> bool {
        if self.options.inhibit_field_text_motion || new_pos == old_pos {
            return false;
        }
        let has_field = |pos: usize| !or_nil(self.get_char_property(pos, FIELD)).is_nil();
        let near_field = has_field(new_pos)
            || has_field(old_pos)
            || (new_pos > self.begv && has_field(new_pos - 1))
            || (old_pos > self.begv && has_field(old_pos - 1));
        if !near_field {
            return false;
        }
        let Some(prop) = inhibit else {
            return true;
        };
        or_nil(self.get_pos_property(old_pos, prop)).is_nil()
            && (old_pos <= self.begv
                || or_nil(self.get_char_property(old_pos, prop)).is_nil()
                || or_nil(self.get_char_property(old_pos - 1, prop)).is_nil())
    }
}
