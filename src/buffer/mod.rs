//! Buffers: gap-buffer text plus everything that tracks positions in it.
//!
//! A [`Buffer`] holds its text in a [`GapBuffer`] and keeps, in both
//! character and byte form, the absolute bounds `BEG`/`Z`, the narrowing
//! window `BEGV`/`ZV` and point. Positions are 1-based and the invariant
//! `BEG <= BEGV <= PT <= ZV <= Z` holds after every public call.
//!
//! Alongside the text live the marker arena, the overlay chains, the
//! text-property runs, the undo log and optional change hooks.
//!
//! # Examples
//!
//! ```
//! use textcore::Buffer;
//!
//! let mut buf = Buffer::with_text("notes", "héllo world");
//! assert_eq!(buf.point_max(), 12);
//! assert_eq!(buf.char_to_byte(3).unwrap(), 4);
//!
//! buf.goto_char(6);
//! buf.insert(",").unwrap();
//! assert_eq!(buf.buffer_string_no_properties(), "héllo, world");
//! ```

// Region primitives carry both coordinate spaces
#![allow(clippy::too_many_arguments)]

mod hooks;
mod insdel;
pub mod marker;
pub mod overlay;
pub mod undo;

pub use hooks::{ChangeHooks, CompositionCheck};
pub use marker::{InsertionType, MarkerEntry, MarkerId, MarkerTable, Transposition};
pub use overlay::{OverlayId, OverlayTable};
pub use undo::{UndoEntry, UndoList, UndoLog};

use std::fmt;

use crate::error::{Error, Result};
use crate::event::{BufferEvent, emit_buffer_event};
use crate::text::coding::{self, bytes_by_char_head, decode_char};
use crate::text::{GapBuffer, PositionCache, Text, TextProps, Translator};
use crate::value::{Plist, Value};

/// First position of every buffer.
pub const BEG: usize = 1;

/// Largest buffer size in characters or bytes.
pub const MAX_BUFFER_SIZE: usize = (1 << 61) - 1;

/// Per-buffer settings.
#[derive(Clone, Debug)]
pub struct BufferOptions {
    /// Store UTF-8 (true) or one byte per character (false).
    pub multibyte: bool,
    /// Refuse modifications.
    pub read_only: bool,
    /// Ignore both `read_only` and `read-only` text properties.
    pub inhibit_read_only: bool,
    /// Fold case in comparisons.
    pub case_fold_search: bool,
    /// Disable field constraints on motion.
    pub inhibit_field_text_motion: bool,
    /// Properties that are rear-nonsticky unless stated otherwise.
    pub text_property_default_nonsticky: Vec<(String, bool)>,
    /// Property marking text the fontify hook has already processed.
    pub fontified_property: Option<String>,
    /// Maximum number of undo groups kept.
    pub undo_max_depth: usize,
}

impl Default for BufferOptions {
    fn default() -> Self {
        Self {
            multibyte: true,
            read_only: false,
            inhibit_read_only: false,
            case_fold_search: true,
            inhibit_field_text_motion: false,
            text_property_default_nonsticky: ["syntax-table", "display", "composition", "cursor"]
                .into_iter()
                .map(|name| (name.to_string(), true))
                .collect(),
            fontified_property: None,
            undo_max_depth: 1000,
        }
    }
}

/// A text buffer.
pub struct Buffer {
    name: String,
    text: GapBuffer,
    multibyte: bool,
    pub(crate) z: usize,
    pub(crate) z_byte: usize,
    pub(crate) begv: usize,
    pub(crate) begv_byte: usize,
    pub(crate) zv: usize,
    pub(crate) zv_byte: usize,
    pub(crate) pt: usize,
    pub(crate) pt_byte: usize,
    pub(crate) markers: MarkerTable,
    pub(crate) overlays: OverlayTable,
    pub(crate) intervals: TextProps,
    cache: PositionCache,
    pub(crate) undo: UndoList,
    pub(crate) hooks: Option<Box<dyn ChangeHooks>>,
    pub(crate) options: BufferOptions,
    pub(crate) filename: Option<String>,
    clip_changed: bool,
    pub(crate) modiff: u64,
    pub(crate) save_modiff: u64,
    pub(crate) chars_modiff: u64,
}

impl Buffer {
    /// Empty buffer with default options.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self::with_options(name, BufferOptions::default())
    }

    /// Empty buffer with the given options.
    #[must_use]
    pub fn with_options(name: &str, options: BufferOptions) -> Self {
        Self {
            name: name.to_string(),
            text: GapBuffer::new(),
            multibyte: options.multibyte,
            z: BEG,
            z_byte: BEG,
            begv: BEG,
            begv_byte: BEG,
            zv: BEG,
            zv_byte: BEG,
            pt: BEG,
            pt_byte: BEG,
            markers: MarkerTable::new(),
            overlays: OverlayTable::new(),
            intervals: TextProps::new(),
            cache: PositionCache::new(),
            undo: UndoList::Enabled(UndoLog::with_max_depth(options.undo_max_depth)),
            hooks: None,
            options,
            filename: None,
            clip_changed: false,
            modiff: 1,
            save_modiff: 1,
            chars_modiff: 1,
        }
    }

    /// Multibyte buffer preloaded with `contents`, point at the start.
    #[must_use]
    pub fn with_text(name: &str, contents: &str) -> Self {
        let mut buf = Self::new(name);
        buf.load_text(contents);
        buf
    }

    /// Replace all text without recording undo or running hooks.
    fn load_text(&mut self, contents: &str) {
        let bytes = coding::encode_str(contents, self.multibyte);
        let nchars = contents.chars().count();
        self.text = GapBuffer::from_bytes(&bytes);
        self.z = BEG + nchars;
        self.z_byte = BEG + bytes.len();
        self.begv = BEG;
        self.begv_byte = BEG;
        self.zv = self.z;
        self.zv_byte = self.z_byte;
        self.pt = BEG;
        self.pt_byte = BEG;
        self.cache.clear();
        self.intervals = TextProps::new();
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    #[must_use]
    pub fn is_multibyte(&self) -> bool {
        self.multibyte
    }

    #[must_use]
    pub fn options(&self) -> &BufferOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut BufferOptions {
        &mut self.options
    }

    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn set_filename(&mut self, filename: Option<&str>) {
        self.filename = filename.map(str::to_string);
    }

    // ============================================
    // Bounds
    // ============================================

    #[must_use]
    pub fn point(&self) -> usize {
        self.pt
    }

    #[must_use]
    pub fn point_byte(&self) -> usize {
        self.pt_byte
    }

    /// BEGV.
    #[must_use]
    pub fn point_min(&self) -> usize {
        self.begv
    }

    /// ZV.
    #[must_use]
    pub fn point_max(&self) -> usize {
        self.zv
    }

    #[must_use]
    pub fn point_min_byte(&self) -> usize {
        self.begv_byte
    }

    #[must_use]
    pub fn point_max_byte(&self) -> usize {
        self.zv_byte
    }

    /// Z, one past the last character.
    #[must_use]
    pub fn z(&self) -> usize {
        self.z
    }

    #[must_use]
    pub fn z_byte(&self) -> usize {
        self.z_byte
    }

    /// Number of characters in the accessible portion.
    #[must_use]
    pub fn buffer_size(&self) -> usize {
        self.zv - self.begv
    }

    /// Number of characters in the whole buffer.
    #[must_use]
    pub fn total_size(&self) -> usize {
        self.z - BEG
    }

    /// True if narrowing hides some text.
    #[must_use]
    pub fn is_narrowed(&self) -> bool {
        self.begv != BEG || self.zv != self.z
    }

    /// Display-invalidation flag: narrowing changed since last cleared.
    #[must_use]
    pub fn clip_changed(&self) -> bool {
        self.clip_changed
    }

    pub fn clear_clip_changed(&mut self) {
        self.clip_changed = false;
    }

    pub(crate) fn mark_clip_changed(&mut self) {
        self.clip_changed = true;
        emit_buffer_event(BufferEvent::ClipChanged, &self.name);
    }

    #[must_use]
    pub fn modified_p(&self) -> bool {
        self.modiff > self.save_modiff
    }

    /// Mark the buffer modified or unmodified.
    pub fn set_modified(&mut self, flag: bool) {
        if flag {
            if self.modiff <= self.save_modiff {
                self.modiff = self.save_modiff + 1;
            }
        } else {
            self.save_modiff = self.modiff;
        }
    }

    /// Modification tick; increases on every change.
    #[must_use]
    pub fn modiff(&self) -> u64 {
        self.modiff
    }

    /// Tick of the last change to characters (not properties).
    #[must_use]
    pub fn chars_modiff(&self) -> u64 {
        self.chars_modiff
    }

    // ============================================
    // Coordinates
    // ============================================

    fn translator(&self) -> Translator<'_, impl Iterator<Item = (usize, usize)> + '_> {
        let anchors = [(self.pt, self.pt_byte), (self.begv, self.begv_byte), (self.zv, self.zv_byte)]
            .into_iter()
            .chain(self.markers.anchors());
        Translator {
            text: &self.text,
            z: (self.z, self.z_byte),
            anchors,
            cache: &self.cache,
        }
    }

    /// Byte position of `charpos`, which must be in `[BEG, Z]`.
    pub fn char_to_byte(&self, charpos: usize) -> Result<usize> {
        if charpos < BEG || charpos > self.z {
            return Err(Error::out_of_range(charpos));
        }
        Ok(self.pos_byte(charpos))
    }

    /// Character position of `bytepos`, which must be in `[BEG, Z_BYTE]`.
    pub fn byte_to_char(&self, bytepos: usize) -> Result<usize> {
        if bytepos < BEG || bytepos > self.z_byte {
            return Err(Error::out_of_range(bytepos));
        }
        if !self.multibyte {
            return Ok(bytepos);
        }
        Ok(self.translator().byte_to_char(bytepos))
    }

    /// Like [`char_to_byte`](Self::char_to_byte) but `None` when out of range.
    #[must_use]
    pub fn position_bytes(&self, charpos: usize) -> Option<usize> {
        self.char_to_byte(charpos).ok()
    }

    /// Like [`byte_to_char`](Self::byte_to_char) but `None` when out of range.
    #[must_use]
    pub fn byte_to_position(&self, bytepos: usize) -> Option<usize> {
        self.byte_to_char(bytepos).ok()
    }

    /// Byte position of an in-range `charpos`.
    pub(crate) fn pos_byte(&self, charpos: usize) -> usize {
        let charpos = charpos.clamp(BEG, self.z);
        if !self.multibyte {
            return charpos;
        }
        self.translator().char_to_byte(charpos)
    }

    pub(crate) fn invalidate_positions(&self, from: usize) {
        self.cache.invalidate_from(from);
    }

    // ============================================
    // Raw Text Access
    // ============================================

    pub(crate) fn gap(&self) -> &GapBuffer {
        &self.text
    }

    pub(crate) fn gap_mut(&mut self) -> &mut GapBuffer {
        &mut self.text
    }

    /// Character starting at `bytepos`, with its encoded length.
    pub(crate) fn char_at_byte(&self, bytepos: usize) -> Option<(char, usize)> {
        if bytepos < BEG || bytepos >= self.z_byte {
            return None;
        }
        let head = self.text.byte_at(bytepos - 1)?;
        if !self.multibyte {
            return Some((char::from(head), 1));
        }
        let len = bytes_by_char_head(head);
        let bytes = self.text.bytes_range(bytepos - 1, bytepos - 1 + len);
        decode_char(&bytes, true)
    }

    /// Character at `pos` anywhere in the buffer, ignoring narrowing.
    pub(crate) fn fetch_char(&self, pos: usize) -> Option<char> {
        if pos < BEG || pos >= self.z {
            return None;
        }
        self.char_at_byte(self.pos_byte(pos)).map(|(c, _)| c)
    }

    /// Character after `pos`, or `None` outside `[BEGV, ZV)`.
    #[must_use]
    pub fn char_after(&self, pos: usize) -> Option<char> {
        if pos < self.begv || pos >= self.zv {
            return None;
        }
        self.fetch_char(pos)
    }

    /// Character before `pos`, or `None` outside `(BEGV, ZV]`.
    #[must_use]
    pub fn char_before(&self, pos: usize) -> Option<char> {
        if pos <= self.begv || pos > self.zv {
            return None;
        }
        self.fetch_char(pos - 1)
    }

    /// Character after point.
    #[must_use]
    pub fn following_char(&self) -> Option<char> {
        self.char_after(self.pt)
    }

    /// Character before point.
    #[must_use]
    pub fn preceding_char(&self) -> Option<char> {
        self.char_before(self.pt)
    }

    /// Plain text of `[start, end)` with no bounds checks beyond clamping.
    pub(crate) fn substring_raw(&self, start: usize, end: usize) -> String {
        let start = start.clamp(BEG, self.z);
        let end = end.clamp(start, self.z);
        let bytes = self
            .text
            .bytes_range(self.pos_byte(start) - 1, self.pos_byte(end) - 1);
        coding::decode_bytes(&bytes, self.multibyte)
    }

    /// `[start, end)` with properties, without running the fontify hook.
    pub(crate) fn substring_with_props(&self, start: usize, end: usize) -> Text {
        let start = start.clamp(BEG, self.z);
        let end = end.clamp(start, self.z);
        Text::from_parts(
            self.substring_raw(start, end),
            self.multibyte,
            self.intervals.slice(start, end),
        )
    }

    /// Entire text, ignoring narrowing.
    #[must_use]
    pub fn text_string(&self) -> String {
        self.substring_raw(BEG, self.z)
    }

    // ============================================
    // Validation
    // ============================================

    /// Order `start`/`end` and check both lie in `[BEGV, ZV]`.
    pub fn validate_region(&self, start: usize, end: usize) -> Result<(usize, usize)> {
        let (start, end) = if start > end { (end, start) } else { (start, end) };
        if start < self.begv || end > self.zv {
            return Err(Error::region_out_of_range(start, end));
        }
        Ok((start, end))
    }

    /// Check a single position lies in `[BEGV, ZV]`.
    pub fn check_accessible(&self, pos: usize) -> Result<usize> {
        if pos < self.begv || pos > self.zv {
            return Err(Error::out_of_range(pos));
        }
        Ok(pos)
    }

    /// Refuse edits of a read-only buffer or read-only text.
    pub(crate) fn check_writable(&self, start: usize, end: usize) -> Result<()> {
        if self.options.inhibit_read_only {
            return Ok(());
        }
        if self.options.read_only {
            return Err(Error::BufferReadOnly(self.name.clone()));
        }
        if start < end {
            if let Some(pos) = self.intervals.any_non_nil(start, end, "read-only") {
                return Err(Error::TextReadOnly(pos));
            }
        } else if self
            .inherited_text_property(start, "read-only")
            .is_some_and(|v| !v.is_nil())
        {
            return Err(Error::TextReadOnly(start));
        }
        Ok(())
    }

    // ============================================
    // Point
    // ============================================

    /// Move point to `pos`, clamped to the accessible portion.
    pub(crate) fn set_point(&mut self, pos: usize) {
        let pos = pos.clamp(self.begv, self.zv);
        self.pt_byte = self.pos_byte(pos);
        self.pt = pos;
    }

    pub(crate) fn set_point_both(&mut self, pos: usize, pos_byte: usize) {
        self.pt = pos;
        self.pt_byte = pos_byte;
    }

    pub(crate) fn set_begv_both(&mut self, pos: usize, pos_byte: usize) {
        self.begv = pos;
        self.begv_byte = pos_byte;
    }

    pub(crate) fn set_zv_both(&mut self, pos: usize, pos_byte: usize) {
        self.zv = pos;
        self.zv_byte = pos_byte;
    }

    // ============================================
    // Text Properties
    // ============================================

    /// Value of `prop` on the character at `pos`.
    #[must_use]
    pub fn get_text_property(&self, pos: usize, prop: &str) -> Option<&Value> {
        if pos < BEG || pos >= self.z {
            return None;
        }
        self.intervals.get(pos, prop)
    }

    /// Property list of the character at `pos`.
    #[must_use]
    pub fn text_properties_at(&self, pos: usize) -> Option<&Plist> {
        if pos < BEG || pos >= self.z {
            return None;
        }
        self.intervals.plist_at(pos)
    }

    fn check_property_range(&self, start: usize, end: usize) -> Result<(usize, usize)> {
        let (start, end) = if start > end { (end, start) } else { (start, end) };
        if start < BEG || end > self.z {
            return Err(Error::region_out_of_range(start, end));
        }
        Ok((start, end))
    }

    fn note_property_change(&mut self, changed: bool) -> bool {
        if changed {
            self.modiff += 1;
        }
        changed
    }

    /// Set `prop` to `value` over `[start, end)`. Returns true if anything changed.
    pub fn put_text_property(&mut self, start: usize, end: usize, prop: &str, value: Value) -> Result<bool> {
        let (start, end) = self.check_property_range(start, end)?;
        let changed = self.intervals.put(start, end, prop, &value);
        Ok(self.note_property_change(changed))
    }

    /// Add every property in `props` over `[start, end)`.
    pub fn add_text_properties(&mut self, start: usize, end: usize, props: &Plist) -> Result<bool> {
        let (start, end) = self.check_property_range(start, end)?;
        let changed = self.intervals.add(start, end, props);
        Ok(self.note_property_change(changed))
    }

    /// Replace all properties over `[start, end)` with `props`.
    pub fn set_text_properties(&mut self, start: usize, end: usize, props: &Plist) -> Result<bool> {
        let (start, end) = self.check_property_range(start, end)?;
        let changed = self.intervals.set(start, end, props);
        Ok(self.note_property_change(changed))
    }

    /// Remove the named properties over `[start, end)`.
    pub fn remove_text_properties(&mut self, start: usize, end: usize, props: &[&str]) -> Result<bool> {
        let (start, end) = self.check_property_range(start, end)?;
        let changed = self.intervals.remove(start, end, props);
        Ok(self.note_property_change(changed))
    }

    /// Next position after `pos` where any text property changes.
    #[must_use]
    pub fn next_property_change(&self, pos: usize, limit: Option<usize>) -> Option<usize> {
        let lim = limit.unwrap_or(self.z);
        match self.intervals.next_change(pos) {
            Some(p) if p < lim => Some(p),
            _ => limit,
        }
    }

    /// Next position after `pos` where `prop` changes; `limit` (or `None`
    /// when no limit was given) if it does not change before it.
    #[must_use]
    pub fn next_single_property_change(&self, pos: usize, prop: &str, limit: Option<usize>) -> Option<usize> {
        let lim = limit.unwrap_or(self.z);
        let p = self.intervals.next_single_change(pos, prop, lim);
        if p >= lim { limit } else { Some(p) }
    }

    /// Previous position before `pos` where `prop` changes.
    #[must_use]
    pub fn previous_single_property_change(
        &self,
        pos: usize,
        prop: &str,
        limit: Option<usize>,
    ) -> Option<usize> {
        let lim = limit.unwrap_or(BEG);
        let p = self.intervals.previous_single_change(pos, prop, lim);
        if p <= lim { limit } else { Some(p) }
    }

    /// Text-property runs of the whole buffer.
    #[must_use]
    pub fn intervals(&self) -> &TextProps {
        &self.intervals
    }

    // ============================================
    // Markers
    // ============================================

    /// Add a marker at `charpos`, clamped to `[BEG, Z]`.
    pub fn create_marker(&mut self, charpos: usize, insertion_type: InsertionType) -> MarkerId {
        let charpos = charpos.clamp(BEG, self.z);
        let bytepos = self.pos_byte(charpos);
        self.markers.insert(charpos, bytepos, insertion_type)
    }

    /// Move a marker, clamping to `[BEG, Z]`. Returns false if it is gone.
    pub fn set_marker_position(&mut self, id: MarkerId, charpos: usize) -> bool {
        let charpos = charpos.clamp(BEG, self.z);
        let bytepos = self.pos_byte(charpos);
        self.markers.set(id, charpos, bytepos)
    }

    #[must_use]
    pub fn marker_position(&self, id: MarkerId) -> Option<usize> {
        self.markers.charpos(id)
    }

    #[must_use]
    pub fn marker_byte_position(&self, id: MarkerId) -> Option<usize> {
        self.markers.get(id).map(|m| m.bytepos)
    }

    #[must_use]
    pub fn marker_insertion_type(&self, id: MarkerId) -> Option<InsertionType> {
        self.markers.get(id).map(|m| m.insertion_type)
    }

    pub fn set_marker_insertion_type(&mut self, id: MarkerId, insertion_type: InsertionType) -> bool {
        match self.markers.get_mut(id) {
            Some(m) => {
                m.insertion_type = insertion_type;
                true
            }
            None => false,
        }
    }

    /// Unchain a marker; returns false if it was already gone.
    pub fn free_marker(&mut self, id: MarkerId) -> bool {
        self.markers.remove(id)
    }

    #[must_use]
    pub fn markers(&self) -> &MarkerTable {
        &self.markers
    }

    /// Drop every marker and overlay; used when the buffer is killed.
    pub(crate) fn release_positions(&mut self) {
        self.markers.clear();
        self.overlays = OverlayTable::new();
        self.hooks = None;
        emit_buffer_event(BufferEvent::Killed, &self.name);
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("name", &self.name)
            .field("multibyte", &self.multibyte)
            .field("pt", &(self.pt, self.pt_byte))
            .field("begv", &(self.begv, self.begv_byte))
            .field("zv", &(self.zv, self.zv_byte))
            .field("z", &(self.z, self.z_byte))
            .field("markers", &self.markers.len())
            .field("overlays", &self.overlays.len())
            .field("hooks", &self.hooks.is_some())
            .finish_non_exhaustive()
    }
}
