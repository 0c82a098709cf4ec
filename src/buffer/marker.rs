//! Marker arena.
//!
//! Every live position reference in a buffer (user markers, overlay ends,
//! restriction snapshots, temporaries used around change hooks) is an entry
//! here. Entries are addressed by a generational [`MarkerId`], so a freed
//! slot can be reused without an old handle aliasing the new occupant.

/// What a marker does when text is inserted exactly at its position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum InsertionType {
    /// Stays before the inserted text.
    #[default]
    Before,
    /// Advances past the inserted text.
    After,
}

impl InsertionType {
    #[must_use]
    pub const fn from_advance(advance: bool) -> Self {
        if advance { Self::After } else { Self::Before }
    }

    #[must_use]
    pub const fn advances(self) -> bool {
        matches!(self, Self::After)
    }
}

/// Stable handle to a marker slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MarkerId {
    index: u32,
    generation: u32,
}

/// Position data of one marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MarkerEntry {
    pub charpos: usize,
    pub bytepos: usize,
    pub insertion_type: InsertionType,
}

#[derive(Clone, Debug)]
struct Slot {
    generation: u32,
    entry: Option<MarkerEntry>,
}

/// The markers of one buffer.
#[derive(Clone, Debug, Default)]
pub struct MarkerTable {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

/// Geometry of a region swap: `[start1, end1)` and `[start2, end2)`,
/// `end1 <= start2`, in both coordinate spaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transposition {
    pub start1: usize,
    pub end1: usize,
    pub start2: usize,
    pub end2: usize,
    pub start1_byte: usize,
    pub end1_byte: usize,
    pub start2_byte: usize,
    pub end2_byte: usize,
}

impl Transposition {
    /// Where a position in `[start1, end2)` lands after the swap; returns
    /// `(charpos, bytepos)`. Positions outside the span are unchanged.
    #[must_use]
    pub fn remap(&self, charpos: usize, bytepos: usize) -> (usize, usize) {
        if charpos < self.start1 || charpos >= self.end2 {
            return (charpos, bytepos);
        }
        let len1 = self.end1 - self.start1;
        let len2 = self.end2 - self.start2;
        let mid = self.start2 - self.end1;
        let len1_byte = self.end1_byte - self.start1_byte;
        let len2_byte = self.end2_byte - self.start2_byte;
        let mid_byte = self.start2_byte - self.end1_byte;

        if charpos < self.end1 {
            (charpos + len2 + mid, bytepos + len2_byte + mid_byte)
        } else if charpos < self.start2 {
            (
                (charpos + len2) - len1,
                (bytepos + len2_byte) - len1_byte,
            )
        } else {
            (charpos - (len1 + mid), bytepos - (len1_byte + mid_byte))
        }
    }
}

impl MarkerTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live markers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Add a marker.
    pub fn insert(&mut self, charpos: usize, bytepos: usize, insertion_type: InsertionType) -> MarkerId {
        let entry = MarkerEntry {
            charpos,
            bytepos,
            insertion_type,
        };
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(entry);
            MarkerId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
            self.slots.push(Slot {
                generation: 0,
                entry: Some(entry),
            });
            MarkerId {
                index,
                generation: 0,
            }
        }
    }

    /// Remove a marker; returns false if the handle was already dead.
    pub fn remove(&mut self, id: MarkerId) -> bool {
        let Some(slot) = self.slots.get_mut(id.index as usize) else {
            return false;
        };
        if slot.generation != id.generation || slot.entry.is_none() {
            return false;
        }
        slot.entry = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        true
    }

    #[must_use]
    pub fn get(&self, id: MarkerId) -> Option<&MarkerEntry> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_ref())
    }

    pub fn get_mut(&mut self, id: MarkerId) -> Option<&mut MarkerEntry> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_mut())
    }

    #[must_use]
    pub fn contains(&self, id: MarkerId) -> bool {
        self.get(id).is_some()
    }

    /// Character position of a live marker.
    #[must_use]
    pub fn charpos(&self, id: MarkerId) -> Option<usize> {
        self.get(id).map(|m| m.charpos)
    }

    /// Move a live marker; returns false if the handle is dead.
    pub fn set(&mut self, id: MarkerId, charpos: usize, bytepos: usize) -> bool {
        match self.get_mut(id) {
            Some(m) => {
                m.charpos = charpos;
                m.bytepos = bytepos;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (MarkerId, &MarkerEntry)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.entry.as_ref().map(|entry| {
                (
                    MarkerId {
                        index: i as u32,
                        generation: slot.generation,
                    },
                    entry,
                )
            })
        })
    }

    fn entries_mut(&mut self) -> impl Iterator<Item = &mut MarkerEntry> {
        self.slots.iter_mut().filter_map(|slot| slot.entry.as_mut())
    }

    /// `(charpos, bytepos)` of every live marker.
    pub fn anchors(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.iter().map(|(_, m)| (m.charpos, m.bytepos))
    }

    /// Text of `n_chars`/`n_bytes` went in at `from`.
    ///
    /// Markers past `from` shift. Markers exactly at `from` shift if they
    /// advance on insertion, or if `before_markers` is set.
    pub fn adjust_for_insert(
        &mut self,
        from: usize,
        from_byte: usize,
        n_chars: usize,
        n_bytes: usize,
        before_markers: bool,
    ) {
        if n_chars == 0 && n_bytes == 0 {
            return;
        }
        for m in self.entries_mut() {
            let at = m.bytepos == from_byte;
            if m.bytepos > from_byte
                || (at && (before_markers || m.insertion_type == InsertionType::After))
            {
                debug_assert!(m.charpos >= from);
                m.charpos += n_chars;
                m.bytepos += n_bytes;
            }
        }
    }

    /// `[from, to)` was deleted. Markers inside collapse to `from`, later
    /// markers shift back.
    pub fn adjust_for_delete(&mut self, from: usize, from_byte: usize, to: usize, to_byte: usize) {
        let n_chars = to - from;
        let n_bytes = to_byte - from_byte;
        for m in self.entries_mut() {
            if m.charpos > to {
                m.charpos -= n_chars;
                m.bytepos -= n_bytes;
            } else if m.charpos > from {
                m.charpos = from;
                m.bytepos = from_byte;
            }
        }
    }

    /// `[from, from + old_chars)` was replaced by `new_chars` characters.
    /// Markers strictly inside collapse to `from`; markers at or past the old
    /// end shift by the length difference.
    pub fn adjust_for_replace(
        &mut self,
        from: usize,
        from_byte: usize,
        old_chars: usize,
        old_bytes: usize,
        new_chars: usize,
        new_bytes: usize,
    ) {
        let prev_to_byte = from_byte + old_bytes;
        for m in self.entries_mut() {
            if m.bytepos >= prev_to_byte {
                m.charpos = (m.charpos + new_chars) - old_chars;
                m.bytepos = (m.bytepos + new_bytes) - old_bytes;
            } else if m.bytepos > from_byte {
                m.charpos = from;
                m.bytepos = from_byte;
            }
        }
    }

    /// Remap every marker for a region swap.
    pub fn adjust_for_transpose(&mut self, t: &Transposition) {
        for m in self.entries_mut() {
            (m.charpos, m.bytepos) = t.remap(m.charpos, m.bytepos);
        }
    }

    /// Recompute byte positions of markers in `[from, to]` with `f`, keeping
    /// their character positions.
    pub fn refresh_bytepos(&mut self, from: usize, to: usize, mut f: impl FnMut(usize) -> usize) {
        for m in self.entries_mut() {
            if m.charpos >= from && m.charpos <= to {
                m.bytepos = f(m.charpos);
            }
        }
    }

    /// Remove every marker.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.live = 0;
    }
}
