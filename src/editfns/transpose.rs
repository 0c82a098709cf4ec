//! Swapping two regions of text.

use crate::buffer::{Buffer, Transposition};
use crate::error::{Error, Result};
use crate::event::debug_log;
use crate::value::Plist;

/// How the bytes of a transposition are shuffled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Geometry {
    Adjacent,
    EqualLength,
    Unequal,
}

/// Swap `[s1, s1 + len1)` with the `len2` bytes ending the span, with `mid`
/// untouched bytes between them. `span` holds exactly the three pieces.
fn shuffle(span: &mut [u8], len1: usize, mid: usize, len2: usize, geometry: Geometry) {
    match geometry {
        Geometry::Adjacent => {
            if len1 >= len2 {
                let tmp = span[len1..].to_vec();
                span.copy_within(0..len1, len2);
                span[..len2].copy_from_slice(&tmp);
            } else {
                let tmp = span[..len1].to_vec();
                span.copy_within(len1.., 0);
                span[len2..].copy_from_slice(&tmp);
            }
        }
        Geometry::EqualLength => {
            let start2 = len1 + mid;
            let tmp = span[..len1].to_vec();
            span.copy_within(start2.., 0);
            span[start2..].copy_from_slice(&tmp);
        }
        Geometry::Unequal => {
            let start2 = len1 + mid;
            if len1 > len2 {
                let tmp = span[..len1].to_vec();
                span.copy_within(start2.., 0);
                span.copy_within(len1..start2, len2);
                span[len2 + mid..].copy_from_slice(&tmp);
            } else {
                let tmp = span[start2..].to_vec();
                span.copy_within(len1..start2, len2);
                span.copy_within(0..len1, len2 + mid);
                span[..len2].copy_from_slice(&tmp);
            }
        }
    }
}

impl Buffer {
    /// Byte position of every character boundary in `[start, end]`, found by
    /// walking the text from `start_byte`.
    fn boundary_bytes(&self, start: usize, start_byte: usize, end: usize) -> Vec<usize> {
        let mut table = Vec::with_capacity(end - start + 1);
        let mut bytepos = start_byte;
        for _ in start..end {
            table.push(bytepos);
            bytepos += self.char_at_byte(bytepos).map_or(1, |(_, len)| len);
        }
        table.push(bytepos);
        table
    }

    /// Swap the text of `[start1, end1)` and `[start2, end2)`.
    ///
    /// The regions may be given in either order but must not overlap. Text
    /// properties travel with their text. Markers, overlays and point move
    /// with the text too, unless `leave_markers` is set, in which case they
    /// keep their character positions.
    pub fn transpose_regions(
        &mut self,
        start1: usize,
        end1: usize,
        start2: usize,
        end2: usize,
        leave_markers: bool,
    ) -> Result<()> {
        let (mut start1, mut end1) = self.validate_region(start1, end1)?;
        let (mut start2, mut end2) = self.validate_region(start2, end2)?;
        if start2 < end1 {
            (start1, end1, start2, end2) = (start2, end2, start1, end1);
        }
        if start2 < end1 {
            return Err(Error::TransposedRegionsOverlap);
        }
        if start1 == end1 || start2 == end2 || (start1 == start2 && end1 == end2) {
            return Ok(());
        }

        let (new_start, new_end) = self.modify_text(start1, end2)?;
        if new_end - new_start != end2 - start1 {
            return Err(Error::region_out_of_range(new_start, new_end));
        }
        if new_start != start1 {
            // The hooks moved the text; the regions move with it.
            let delta = new_start as isize - start1 as isize;
            start1 = start1.saturating_add_signed(delta);
            end1 = end1.saturating_add_signed(delta);
            start2 = start2.saturating_add_signed(delta);
            end2 = end2.saturating_add_signed(delta);
        }
        self.record_change(start1, end2 - start1);

        let t = Transposition {
            start1,
            end1,
            start2,
            end2,
            start1_byte: self.pos_byte(start1),
            end1_byte: self.pos_byte(end1),
            start2_byte: self.pos_byte(start2),
            end2_byte: self.pos_byte(end2),
        };
        let len1_byte = t.end1_byte - t.start1_byte;
        let len2_byte = t.end2_byte - t.start2_byte;
        let mid_byte = t.start2_byte - t.end1_byte;
        let geometry = if end1 == start2 {
            Geometry::Adjacent
        } else if len1_byte == len2_byte {
            Geometry::EqualLength
        } else {
            Geometry::Unequal
        };
        debug_log(|| {
            format!(
                "transpose {start1}..{end1} with {start2}..{end2} in {} ({geometry:?})",
                self.name()
            )
        });

        let props1 = self.intervals.slice(start1, end1);
        let props_mid = self.intervals.slice(end1, start2);
        let props2 = self.intervals.slice(start2, end2);

        // Put the gap outside the span, on whichever side is closer.
        let lo = t.start1_byte - 1;
        let hi = t.end2_byte - 1;
        let gap = self.gap().gap_position();
        if lo < gap && gap < hi {
            let target = if gap - lo <= hi - gap { lo } else { hi };
            self.gap_mut().move_gap_to(target);
        }
        let span = self.gap_mut().contiguous_mut(lo, hi);
        shuffle(span, len1_byte, mid_byte, len2_byte, geometry);
        self.invalidate_positions(start1);

        let len2 = end2 - start2;
        let mid = start2 - end1;
        self.intervals.set(start1, end2, &Plist::new());
        self.intervals.graft(&props2, start1);
        self.intervals.graft(&props_mid, start1 + len2);
        self.intervals.graft(&props1, start1 + len2 + mid);

        if leave_markers {
            let table = self.boundary_bytes(start1, t.start1_byte, end2);
            self.markers.refresh_bytepos(start1, end2, |c| table[c - start1]);
            if (start1..=end2).contains(&self.pt) {
                self.pt_byte = table[self.pt - start1];
            }
        } else {
            self.markers.adjust_for_transpose(&t);
            (self.pt, self.pt_byte) = t.remap(self.pt, self.pt_byte);
            self.fix_start_end_in_overlays(start1, end2);
        }
        self.signal_after_change(start1, end2 - start1, end2 - start1)
    }
}
