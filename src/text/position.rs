//! Character/byte position translation.
//!
//! Lookups start from the nearest known `(charpos, bytepos)` pair among the
//! buffer bounds, point, live markers and a small ring of cached pairs, then
//! scan the shorter distance. When the bracketing pairs show equal character
//! and byte spans the text between them is single-byte, and the answer is
//! plain arithmetic.

use std::cell::Cell;

use crate::text::coding::{bytes_by_char_head, char_head_p};
use crate::text::gap::GapBuffer;

const CACHE_SLOTS: usize = 4;

/// Scans longer than this many characters leave a cache entry behind.
const CACHE_THRESHOLD: usize = 64;

/// Upper bound on anchors consulted per lookup.
const MAX_ANCHORS: usize = 50;

/// Recently computed position pairs.
#[derive(Debug, Default)]
pub struct PositionCache {
    slots: Cell<[Option<(usize, usize)>; CACHE_SLOTS]>,
    next: Cell<usize>,
}

impl Clone for PositionCache {
    fn clone(&self) -> Self {
        Self {
            slots: Cell::new(self.slots.get()),
            next: Cell::new(self.next.get()),
        }
    }
}

impl PositionCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached pairs, in no particular order.
    pub fn anchors(&self) -> impl Iterator<Item = (usize, usize)> {
        self.slots.get().into_iter().flatten()
    }

    fn record(&self, charpos: usize, bytepos: usize) {
        let mut slots = self.slots.get();
        if slots.contains(&Some((charpos, bytepos))) {
            return;
        }
        let i = self.next.get();
        slots[i] = Some((charpos, bytepos));
        self.slots.set(slots);
        self.next.set((i + 1) % CACHE_SLOTS);
    }

    /// Drop every pair past `charpos`; called after an edit starting there.
    pub fn invalidate_from(&self, charpos: usize) {
        let mut slots = self.slots.get();
        for slot in &mut slots {
            if matches!(slot, Some((c, _)) if *c > charpos) {
                *slot = None;
            }
        }
        self.slots.set(slots);
    }

    pub fn clear(&self) {
        self.slots.set([None; CACHE_SLOTS]);
        self.next.set(0);
    }
}

/// Where a lookup runs: the text, its end pair, and extra anchors.
pub struct Translator<'a, I> {
    pub text: &'a GapBuffer,
    pub z: (usize, usize),
    pub anchors: I,
    pub cache: &'a PositionCache,
}

fn byte(text: &GapBuffer, bytepos: usize) -> u8 {
    text.byte_at(bytepos - 1).unwrap_or(0)
}

impl<I> Translator<'_, I>
where
    I: Iterator<Item = (usize, usize)>,
{
    /// Byte position of `charpos`, which must lie in `[1, z]`.
    pub fn char_to_byte(self, charpos: usize) -> usize {
        let Self { text, z, anchors, cache } = self;
        let mut below = (1, 1);
        let mut above = z;
        if charpos <= below.0 {
            return below.1;
        }
        if charpos >= above.0 {
            return above.1;
        }
        let cached = cache.anchors();
        for (c, b) in anchors.take(MAX_ANCHORS).chain(cached) {
            if c == charpos {
                return b;
            }
            if c < charpos && c > below.0 {
                below = (c, b);
            } else if c > charpos && c < above.0 {
                above = (c, b);
            }
            if above.0 - below.0 == above.1 - below.1 {
                return below.1 + (charpos - below.0);
            }
        }
        if above.0 - below.0 == above.1 - below.1 {
            return below.1 + (charpos - below.0);
        }

        let (mut c, mut b);
        let distance;
        if charpos - below.0 <= above.0 - charpos {
            (c, b) = below;
            distance = charpos - c;
            while c < charpos {
                b += bytes_by_char_head(byte(text, b));
                c += 1;
            }
        } else {
            (c, b) = above;
            distance = c - charpos;
            while c > charpos {
                b -= 1;
                while b > 1 && !char_head_p(byte(text, b)) {
                    b -= 1;
                }
                c -= 1;
            }
        }
        if distance > CACHE_THRESHOLD {
            cache.record(c, b);
        }
        b
    }

    /// Character position of `bytepos`, which must lie in `[1, z_byte]`.
    ///
    /// A position inside a multibyte sequence counts as its character's head.
    pub fn byte_to_char(self, bytepos: usize) -> usize {
        let Self { text, z, anchors, cache } = self;
        let mut below = (1, 1);
        let mut above = z;
        if bytepos <= below.1 {
            return below.0;
        }
        if bytepos >= above.1 {
            return above.0;
        }
        let mut bytepos = bytepos;
        while bytepos > 1 && !char_head_p(byte(text, bytepos)) {
            bytepos -= 1;
        }
        let cached = cache.anchors();
        for (c, b) in anchors.take(MAX_ANCHORS).chain(cached) {
            if b == bytepos {
                return c;
            }
            if b < bytepos && b > below.1 {
                below = (c, b);
            } else if b > bytepos && b < above.1 {
                above = (c, b);
            }
            if above.0 - below.0 == above.1 - below.1 {
                return below.0 + (bytepos - below.1);
            }
        }
        if above.0 - below.0 == above.1 - below.1 {
            return below.0 + (bytepos - below.1);
        }

        let (mut c, mut b);
        if bytepos - below.1 <= above.1 - bytepos {
            (c, b) = below;
            while b < bytepos {
                b += bytes_by_char_head(byte(text, b));
                c += 1;
            }
        } else {
            (c, b) = above;
            while b > bytepos {
                b -= 1;
                while b > 1 && !char_head_p(byte(text, b)) {
                    b -= 1;
                }
                c -= 1;
            }
        }
        if c.abs_diff(below.0).min(c.abs_diff(above.0)) > CACHE_THRESHOLD {
            cache.record(c, b);
        }
        c
    }
}
