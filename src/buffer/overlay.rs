//! Overlays: marker-bounded intervals with property lists.
//!
//! Overlays live in two chains split at the overlay center. The before
//! chain holds overlays ending at or before the center, sorted by
//! decreasing end; the after chain holds the rest, sorted by increasing
//! start. Scans around a position walk outward from the center and stop as
//! soon as the sort order rules out further hits.

use std::cmp::{Ordering, Reverse};

use crate::buffer::Buffer;
use crate::buffer::marker::{InsertionType, MarkerId, MarkerTable};
use crate::error::{Error, Result};
use crate::value::{Plist, Value};

/// Stable handle to an overlay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OverlayId {
    index: u32,
    generation: u32,
}

#[derive(Clone, Debug)]
struct OverlayEntry {
    start: MarkerId,
    end: MarkerId,
    plist: Plist,
    seq: u64,
}

#[derive(Clone, Debug)]
struct Slot {
    generation: u32,
    entry: Option<OverlayEntry>,
}

/// The overlays of one buffer.
#[derive(Clone, Debug)]
pub struct OverlayTable {
    slots: Vec<Slot>,
    free: Vec<u32>,
    before: Vec<OverlayId>,
    after: Vec<OverlayId>,
    center: usize,
    next_seq: u64,
}

impl Default for OverlayTable {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            before: Vec::new(),
            after: Vec::new(),
            center: 1,
            next_seq: 0,
        }
    }
}

impl OverlayTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.before.len() + self.after.len()
    }

    #[must_use]
    pub fn center(&self) -> usize {
        self.center
    }

    fn entry(&self, id: OverlayId) -> Option<&OverlayEntry> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_ref())
    }

    fn entry_mut(&mut self, id: OverlayId) -> Option<&mut OverlayEntry> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_mut())
    }

    /// Markers bounding a live overlay.
    #[must_use]
    pub fn markers_of(&self, id: OverlayId) -> Option<(MarkerId, MarkerId)> {
        self.entry(id).map(|e| (e.start, e.end))
    }

    #[must_use]
    pub fn plist(&self, id: OverlayId) -> Option<&Plist> {
        self.entry(id).map(|e| &e.plist)
    }

    pub fn plist_mut(&mut self, id: OverlayId) -> Option<&mut Plist> {
        self.entry_mut(id).map(|e| &mut e.plist)
    }

    /// Current `(start, end)` character positions.
    #[must_use]
    pub fn bounds(&self, id: OverlayId, markers: &MarkerTable) -> Option<(usize, usize)> {
        let e = self.entry(id)?;
        Some((markers.charpos(e.start)?, markers.charpos(e.end)?))
    }

    fn insert(&mut self, start: MarkerId, end: MarkerId, markers: &MarkerTable) -> OverlayId {
        let entry = OverlayEntry {
            start,
            end,
            plist: Plist::new(),
            seq: self.next_seq,
        };
        self.next_seq += 1;
        let id = if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(entry);
            OverlayId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
            self.slots.push(Slot {
                generation: 0,
                entry: Some(entry),
            });
            OverlayId {
                index,
                generation: 0,
            }
        };
        self.after.push(id);
        self.fix_chains(self.center, markers);
        id
    }

    fn remove(&mut self, id: OverlayId) -> Option<(MarkerId, MarkerId)> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let entry = slot.entry.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.before.retain(|&o| o != id);
        self.after.retain(|&o| o != id);
        Some((entry.start, entry.end))
    }

    /// Every live overlay.
    pub fn ids(&self) -> impl Iterator<Item = OverlayId> + '_ {
        self.before.iter().chain(self.after.iter()).copied()
    }

    /// Re-split and re-sort the chains around `pos`.
    pub fn recenter(&mut self, pos: usize, markers: &MarkerTable) {
        let mut all: Vec<(OverlayId, usize, usize)> = self
            .ids()
            .filter_map(|id| self.bounds(id, markers).map(|(s, e)| (id, s, e)))
            .collect();
        all.sort_by_key(|&(_, s, e)| (s, e));
        let (mut before, after): (Vec<_>, Vec<_>) = all.into_iter().partition(|&(_, _, e)| e <= pos);
        before.sort_by(|a, b| b.2.cmp(&a.2));
        self.before = before.into_iter().map(|(id, _, _)| id).collect();
        self.after = after.into_iter().map(|(id, _, _)| id).collect();
        self.center = pos;
    }

    /// Restore chain order around `center` after marker positions moved.
    ///
    /// Only overlays whose end crossed the center change chains; they are
    /// placed by binary search. Marker adjustment keeps the remaining order
    /// nearly intact, so the stable sorts run in close to linear time.
    pub fn fix_chains(&mut self, center: usize, markers: &MarkerTable) {
        let before = std::mem::take(&mut self.before);
        let after = std::mem::take(&mut self.after);
        let bounds = |id| self.bounds(id, markers).unwrap_or((0, 0));

        let (mut before, mut to_after): (Vec<_>, Vec<_>) =
            before.into_iter().partition(|&id| bounds(id).1 <= center);
        let (mut to_before, mut after): (Vec<_>, Vec<_>) =
            after.into_iter().partition(|&id| bounds(id).1 <= center);

        let before_key = |id| {
            let (s, e) = bounds(id);
            (Reverse(e), s)
        };
        before.sort_by_key(|&id| before_key(id));
        after.sort_by_key(|&id| bounds(id));

        to_before.sort_by_key(|&id| before_key(id));
        for id in to_before {
            let key = before_key(id);
            let at = before.partition_point(|&o| before_key(o) <= key);
            before.insert(at, id);
        }
        to_after.sort_by_key(|&id| bounds(id));
        for id in to_after {
            let key = bounds(id);
            let at = after.partition_point(|&o| bounds(o) <= key);
            after.insert(at, id);
        }

        self.before = before;
        self.after = after;
        self.center = center;
    }

    /// The before and after chains, in scan order.
    #[must_use]
    pub fn chains(&self) -> (&[OverlayId], &[OverlayId]) {
        (&self.before, &self.after)
    }

    /// Overlays whose span `[start, end]` contains `pos`, found by walking
    /// both chains and stopping once their order excludes further matches.
    #[must_use]
    pub fn spanning(&self, pos: usize, markers: &MarkerTable) -> Vec<(OverlayId, usize, usize)> {
        let mut found = Vec::new();
        for &id in &self.before {
            let Some((start, end)) = self.bounds(id, markers) else {
                continue;
            };
            if end < pos {
                break;
            }
            if start <= pos {
                found.push((id, start, end));
            }
        }
        for &id in &self.after {
            let Some((start, end)) = self.bounds(id, markers) else {
                continue;
            };
            if start > pos {
                break;
            }
            if end >= pos {
                found.push((id, start, end));
            }
        }
        found
    }

    fn priority(&self, id: OverlayId) -> i64 {
        match self.plist(id).and_then(|p| p.get("priority")) {
            Some(Value::Int(n)) => *n,
            _ => 0,
        }
    }

    /// Order two overlays; `Greater` means `a` takes precedence.
    #[must_use]
    pub fn compare(&self, a: OverlayId, b: OverlayId, markers: &MarkerTable) -> Ordering {
        let start = |id| self.bounds(id, markers).map_or(0, |(s, _)| s);
        let seq = |id| self.entry(id).map_or(0, |e| e.seq);
        self.priority(a)
            .cmp(&self.priority(b))
            .then_with(|| start(a).cmp(&start(b)))
            .then_with(|| seq(a).cmp(&seq(b)))
    }
}

impl Buffer {
    fn check_overlay_pos(&self, pos: usize) -> Result<usize> {
        if pos < 1 || pos > self.z {
            return Err(Error::out_of_range(pos));
        }
        Ok(pos)
    }

    /// Create an overlay over `[start, end)`. `front_advance` and
    /// `rear_advance` are the insertion types of its two ends.
    pub fn make_overlay(
        &mut self,
        start: usize,
        end: usize,
        front_advance: bool,
        rear_advance: bool,
    ) -> Result<OverlayId> {
        let (start, end) = if start > end { (end, start) } else { (start, end) };
        self.check_overlay_pos(start)?;
        self.check_overlay_pos(end)?;
        let (sb, eb) = (self.pos_byte(start), self.pos_byte(end));
        let sm = self
            .markers
            .insert(start, sb, InsertionType::from_advance(front_advance));
        let em = self
            .markers
            .insert(end, eb, InsertionType::from_advance(rear_advance));
        Ok(self.overlays.insert(sm, em, &self.markers))
    }

    /// Create an overlay over `[start, end)` that insertions at either end
    /// leave outside: its start advances and its end stays.
    pub fn make_overlay_excluding_ends(&mut self, start: usize, end: usize) -> Result<OverlayId> {
        self.make_overlay(start, end, true, false)
    }

    /// Delete an overlay; returns false if it was already gone.
    pub fn delete_overlay(&mut self, id: OverlayId) -> bool {
        match self.overlays.remove(id) {
            Some((s, e)) => {
                self.markers.remove(s);
                self.markers.remove(e);
                true
            }
            None => false,
        }
    }

    /// Move an overlay to `[start, end)`, clamped to the whole buffer.
    pub fn move_overlay(&mut self, id: OverlayId, start: usize, end: usize) -> Result<()> {
        let (sm, em) = self.overlays.markers_of(id).ok_or(Error::DetachedMarker)?;
        let (start, end) = if start > end { (end, start) } else { (start, end) };
        let start = start.clamp(1, self.z);
        let end = end.clamp(1, self.z);
        let (sb, eb) = (self.pos_byte(start), self.pos_byte(end));
        self.markers.set(sm, start, sb);
        self.markers.set(em, end, eb);
        self.overlays.recenter(self.overlays.center(), &self.markers);
        if start == end {
            self.evaporate_overlays(start);
        }
        Ok(())
    }

    #[must_use]
    pub fn overlay_start(&self, id: OverlayId) -> Option<usize> {
        self.overlays.bounds(id, &self.markers).map(|(s, _)| s)
    }

    #[must_use]
    pub fn overlay_end(&self, id: OverlayId) -> Option<usize> {
        self.overlays.bounds(id, &self.markers).map(|(_, e)| e)
    }

    #[must_use]
    pub fn overlay_get(&self, id: OverlayId, prop: &str) -> Option<&Value> {
        self.overlays.plist(id).and_then(|p| p.get(prop))
    }

    /// Set a property; returns false if the overlay is gone.
    ///
    /// Setting a non-nil `evaporate` on an empty overlay deletes it.
    pub fn overlay_put(&mut self, id: OverlayId, prop: &str, value: Value) -> bool {
        let evaporates = prop == "evaporate" && !value.is_nil();
        let Some(plist) = self.overlays.plist_mut(id) else {
            return false;
        };
        plist.put(prop, value);
        if evaporates {
            if let Some((s, e)) = self.overlays.bounds(id, &self.markers) {
                if s == e {
                    self.delete_overlay(id);
                }
            }
        }
        true
    }

    #[must_use]
    pub fn overlay_properties(&self, id: OverlayId) -> Option<&Plist> {
        self.overlays.plist(id)
    }

    #[must_use]
    pub fn overlay_live_p(&self, id: OverlayId) -> bool {
        self.overlays.markers_of(id).is_some()
    }

    /// Sort overlays so the one taking precedence comes first.
    pub fn sort_overlays(&self, ids: &mut [OverlayId]) {
        ids.sort_by(|&a, &b| self.overlays.compare(b, a, &self.markers));
    }

    /// Non-empty overlays covering the character at `pos`.
    #[must_use]
    pub fn overlays_at(&self, pos: usize, sorted: bool) -> Vec<OverlayId> {
        let mut ids: Vec<_> = self
            .overlays
            .spanning(pos, &self.markers)
            .into_iter()
            .filter(|&(_, s, e)| s <= pos && pos < e)
            .map(|(id, _, _)| id)
            .collect();
        if sorted {
            self.sort_overlays(&mut ids);
        }
        ids
    }

    /// Overlays overlapping `[beg, end)`. Empty overlays count when they sit
    /// at `beg`, strictly inside, or at `end` when `end` is the buffer end.
    #[must_use]
    pub fn overlays_in(&self, beg: usize, end: usize) -> Vec<OverlayId> {
        let (beg, end) = if beg > end { (end, beg) } else { (beg, end) };
        self.overlays
            .ids()
            .filter(|&id| {
                let Some((s, e)) = self.overlays.bounds(id, &self.markers) else {
                    return false;
                };
                if s == e {
                    s == beg || (beg < s && s < end) || (s == end && end == self.z)
                } else {
                    s < end && e > beg
                }
            })
            .collect()
    }

    /// Overlays that would cover a character inserted at `pos`.
    ///
    /// Candidates span `pos`; one is dropped if its start sits at `pos` and
    /// advances on insertion, or its end sits at `pos` and does not.
    #[must_use]
    pub fn overlays_touching(&self, pos: usize) -> Vec<OverlayId> {
        self.overlays
            .spanning(pos, &self.markers)
            .into_iter()
            .filter(|&(id, start, end)| {
                let Some((sm, em)) = self.overlays.markers_of(id) else {
                    return false;
                };
                let front_advance = self
                    .markers
                    .get(sm)
                    .is_some_and(|m| m.insertion_type.advances());
                let rear_advance = self
                    .markers
                    .get(em)
                    .is_some_and(|m| m.insertion_type.advances());
                !((start == pos && front_advance) || (end == pos && !rear_advance))
            })
            .map(|(id, _, _)| id)
            .collect()
    }

    /// Next position after `pos` where an overlay starts or ends, or ZV.
    #[must_use]
    pub fn next_overlay_change(&self, pos: usize) -> usize {
        self.overlays
            .ids()
            .filter_map(|id| self.overlays.bounds(id, &self.markers))
            .flat_map(|(s, e)| [s, e])
            .filter(|&p| p > pos)
            .fold(self.zv, usize::min)
    }

    /// Last position before `pos` where an overlay starts or ends, or BEGV.
    #[must_use]
    pub fn previous_overlay_change(&self, pos: usize) -> usize {
        self.overlays
            .ids()
            .filter_map(|id| self.overlays.bounds(id, &self.markers))
            .flat_map(|(s, e)| [s, e])
            .filter(|&p| p < pos)
            .fold(self.begv, usize::max)
    }

    /// Move the overlay center to `pos`.
    pub fn overlay_recenter(&mut self, pos: usize) {
        let pos = pos.clamp(1, self.z);
        self.overlays.recenter(pos, &self.markers);
    }

    /// The two chains as `(before, after)`.
    #[must_use]
    pub fn overlay_lists(&self) -> (Vec<OverlayId>, Vec<OverlayId>) {
        let (before, after) = self.overlays.chains();
        (before.to_vec(), after.to_vec())
    }

    /// Delete empty overlays at `pos` that carry a non-nil `evaporate`.
    pub(crate) fn evaporate_overlays(&mut self, pos: usize) {
        let doomed: Vec<_> = self
            .overlays
            .spanning(pos, &self.markers)
            .into_iter()
            .filter(|&(id, s, e)| {
                s == pos && e == pos && self.overlay_get(id, "evaporate").is_some_and(|v| !v.is_nil())
            })
            .map(|(id, _, _)| id)
            .collect();
        for id in doomed {
            self.delete_overlay(id);
        }
    }

    /// Swap the ends of overlays left backwards by a transposition.
    pub(crate) fn fix_start_end_in_overlays(&mut self, from: usize, to: usize) {
        let ids: Vec<_> = self.overlays.ids().collect();
        for id in ids {
            let Some((sm, em)) = self.overlays.markers_of(id) else {
                continue;
            };
            let (Some(s), Some(e)) = (self.markers.get(sm).copied(), self.markers.get(em).copied())
            else {
                continue;
            };
            if s.charpos > e.charpos && s.charpos <= to && e.charpos >= from {
                self.markers.set(sm, e.charpos, e.bytepos);
                self.markers.set(em, s.charpos, s.bytepos);
            }
        }
        self.overlays.recenter(self.overlays.center(), &self.markers);
    }

    /// Keep chain order valid after marker positions moved.
    pub(crate) fn resort_overlays(&mut self) {
        if !self.overlays.is_empty() {
            let center = self.overlays.center().min(self.z);
            self.overlays.fix_chains(center, &self.markers);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlay(
        table: &mut OverlayTable,
        markers: &mut MarkerTable,
        start: usize,
        end: usize,
    ) -> OverlayId {
        let s = markers.insert(start, start, InsertionType::Before);
        let e = markers.insert(end, end, InsertionType::Before);
        table.insert(s, e, markers)
    }

    #[test]
    fn test_fix_chains_moves_only_crossing_overlays() {
        let mut markers = MarkerTable::new();
        let mut table = OverlayTable::default();
        let a = overlay(&mut table, &mut markers, 2, 4);
        let b = overlay(&mut table, &mut markers, 3, 9);
        let c = overlay(&mut table, &mut markers, 6, 8);
        table.recenter(5, &markers);
        assert_eq!(table.chains(), (&[a][..], &[b, c][..]));

        let (_, a_end) = table.markers_of(a).unwrap();
        let (c_start, c_end) = table.markers_of(c).unwrap();
        markers.set(a_end, 7, 7);
        markers.set(c_start, 2, 2);
        markers.set(c_end, 3, 3);

        table.fix_chains(5, &markers);
        assert_eq!(table.chains(), (&[c][..], &[a, b][..]));

        let mut rebuilt = table.clone();
        rebuilt.recenter(5, &markers);
        assert_eq!(rebuilt.chains(), table.chains());
    }

    #[test]
    fn test_fix_chains_keeps_spanning_results() {
        let mut markers = MarkerTable::new();
        let mut table = OverlayTable::default();
        let ids: Vec<_> = [(1, 3), (2, 6), (4, 4), (5, 9), (7, 8)]
            .into_iter()
            .map(|(s, e)| overlay(&mut table, &mut markers, s, e))
            .collect();
        table.recenter(6, &markers);
        markers.adjust_for_insert(3, 3, 2, 2, false);
        table.fix_chains(6, &markers);
        for pos in 1..=11 {
            let mut found: Vec<_> = table
                .spanning(pos, &markers)
                .into_iter()
                .map(|(id, _, _)| id)
                .collect();
            let mut expected: Vec<_> = ids
                .iter()
                .copied()
                .filter(|&id| table.bounds(id, &markers).is_some_and(|(s, e)| s <= pos && pos <= e))
                .collect();
            found.sort_by_key(|id| ids.iter().position(|o| o == id));
            expected.sort_by_key(|id| ids.iter().position(|o| o == id));
            assert_eq!(found, expected, "pos {pos}");
        }
    }
}
