//! Narrowing and its dynamic save/restore.
//!
//! A restriction snapshot is either [`SavedRestriction::Unrestricted`] or a
//! pair of markers bracketing the saved bounds. The end marker advances on
//! insertion, so text inserted at the old end stays visible after restore.

use std::ops::{Deref, DerefMut};

use crate::buffer::{BEG, Buffer, InsertionType, MarkerId};
use crate::error::{Error, Result};
use crate::event::debug_log;

/// Saved narrowing state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SavedRestriction {
    /// The buffer was not narrowed.
    Unrestricted,
    /// Markers at the saved start and end of the accessible portion.
    Markers(MarkerId, MarkerId),
}

impl Buffer {
    /// Make the whole buffer accessible.
    pub fn widen(&mut self) {
        if self.begv != BEG || self.zv != self.z {
            self.mark_clip_changed();
        }
        self.set_begv_both(BEG, BEG);
        self.set_zv_both(self.z, self.z_byte);
    }

    /// Restrict editing to `[start, end)`; the bounds may come in either
    /// order. Point is moved inside the new bounds if needed.
    pub fn narrow_to_region(&mut self, start: usize, end: usize) -> Result<()> {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        if start < BEG || end > self.z {
            return Err(Error::region_out_of_range(start, end));
        }
        if self.begv != start || self.zv != end {
            self.mark_clip_changed();
        }
        let start_byte = self.pos_byte(start);
        let end_byte = self.pos_byte(end);
        self.set_begv_both(start, start_byte);
        self.set_zv_both(end, end_byte);
        if self.pt < start {
            self.set_point_both(start, start_byte);
        } else if self.pt > end {
            self.set_point_both(end, end_byte);
        }
        Ok(())
    }

    /// Snapshot the current restriction.
    #[must_use]
    pub fn save_restriction_save(&mut self) -> SavedRestriction {
        if !self.is_narrowed() {
            return SavedRestriction::Unrestricted;
        }
        let beg = self.create_marker(self.begv, InsertionType::Before);
        let end = self.create_marker(self.zv, InsertionType::After);
        SavedRestriction::Markers(beg, end)
    }

    /// Reinstate a snapshot taken by [`Buffer::save_restriction_save`],
    /// releasing its markers.
    pub fn save_restriction_restore(&mut self, saved: SavedRestriction) {
        match saved {
            SavedRestriction::Markers(beg, end) => {
                let bounds = self.markers.get(beg).copied().zip(self.markers.get(end).copied());
                if let Some((beg_entry, end_entry)) = bounds {
                    if beg_entry.charpos != self.begv || end_entry.charpos != self.zv {
                        debug_log(|| {
                            format!(
                                "restore restriction {}..{} in {}",
                                beg_entry.charpos,
                                end_entry.charpos,
                                self.name()
                            )
                        });
                        self.set_begv_both(beg_entry.charpos, beg_entry.bytepos);
                        self.set_zv_both(end_entry.charpos, end_entry.bytepos);
                        if self.pt < beg_entry.charpos {
                            self.set_point_both(beg_entry.charpos, beg_entry.bytepos);
                        } else if self.pt > end_entry.charpos {
                            self.set_point_both(end_entry.charpos, end_entry.bytepos);
                        }
                        self.mark_clip_changed();
                    }
                }
                self.free_marker(beg);
                self.free_marker(end);
            }
            SavedRestriction::Unrestricted => {
                if self.is_narrowed() {
                    debug_log(|| format!("restore full restriction in {}", self.name()));
                    self.set_begv_both(BEG, BEG);
                    self.set_zv_both(self.z, self.z_byte);
                    self.mark_clip_changed();
                }
            }
        }
    }

    /// Run `f` and put the restriction back afterwards, however `f` exits.
    pub fn save_restriction<R>(&mut self, f: impl FnOnce(&mut Buffer) -> R) -> R {
        let mut guard = RestrictionGuard::new(self);
        f(&mut guard)
    }

    /// Run `f` and put point back afterwards. Point is tracked by a marker,
    /// so edits made by `f` move the restored position along with the text.
    pub fn save_excursion<R>(&mut self, f: impl FnOnce(&mut Buffer) -> R) -> R {
        let mut guard = ExcursionGuard::new(self);
        f(&mut guard)
    }
}

/// Restores the buffer's restriction when dropped.
pub struct RestrictionGuard<'a> {
    buffer: &'a mut Buffer,
    saved: SavedRestriction,
}

impl<'a> RestrictionGuard<'a> {
    pub fn new(buffer: &'a mut Buffer) -> Self {
        let saved = buffer.save_restriction_save();
        Self { buffer, saved }
    }
}

impl Deref for RestrictionGuard<'_> {
    type Target = Buffer;

    fn deref(&self) -> &Buffer {
        self.buffer
    }
}

impl DerefMut for RestrictionGuard<'_> {
    fn deref_mut(&mut self) -> &mut Buffer {
        self.buffer
    }
}

impl Drop for RestrictionGuard<'_> {
    fn drop(&mut self) {
        self.buffer.save_restriction_restore(self.saved);
    }
}

struct ExcursionGuard<'a> {
    buffer: &'a mut Buffer,
    point: MarkerId,
}

impl<'a> ExcursionGuard<'a> {
    fn new(buffer: &'a mut Buffer) -> Self {
        let point = buffer.create_marker(buffer.point(), InsertionType::Before);
        Self { buffer, point }
    }
}

impl Deref for ExcursionGuard<'_> {
    type Target = Buffer;

    fn deref(&self) -> &Buffer {
        self.buffer
    }
}

impl DerefMut for ExcursionGuard<'_> {
    fn deref_mut(&mut self) -> &mut Buffer {
        self.buffer
    }
}

impl Drop for ExcursionGuard<'_> {
    fn drop(&mut self) {
        if let Some(pos) = self.buffer.marker_position(self.point) {
            self.buffer.set_point(pos);
        }
        self.buffer.free_marker(self.point);
    }
}
