//! Byte gap buffer.
//!
//! ```text
//!  [ text before gap | gap (unused) | text after gap ]
//!    0..gap_start      gap_start..gap_end   gap_end..buf.len()
//! ```
//!
//! Offsets here are 0-based logical byte offsets with the gap removed. The
//! buffer layer converts its 1-based byte positions before calling in.

/// Initial gap size in bytes.
const DEFAULT_GAP_SIZE: usize = 64;

/// Smallest amount the gap grows by when it runs out.
const MIN_GAP_GROW: usize = 256;

/// Raw text storage with a movable gap.
#[derive(Clone)]
pub struct GapBuffer {
    buf: Vec<u8>,
    gap_start: usize,
    gap_end: usize,
}

impl Default for GapBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl GapBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: vec![0; DEFAULT_GAP_SIZE],
            gap_start: 0,
            gap_end: DEFAULT_GAP_SIZE,
        }
    }

    /// Buffer holding `bytes`, gap at the end.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut buf = Vec::with_capacity(bytes.len() + DEFAULT_GAP_SIZE);
        buf.extend_from_slice(bytes);
        buf.resize(bytes.len() + DEFAULT_GAP_SIZE, 0);
        Self {
            buf,
            gap_start: bytes.len(),
            gap_end: bytes.len() + DEFAULT_GAP_SIZE,
        }
    }

    /// Logical length in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len() - self.gap_size()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    #[must_use]
    pub fn gap_size(&self) -> usize {
        self.gap_end - self.gap_start
    }

    /// Logical offset where the gap sits.
    #[inline]
    #[must_use]
    pub fn gap_position(&self) -> usize {
        self.gap_start
    }

    /// Byte at logical offset `pos`, or `None` past the end.
    #[inline]
    #[must_use]
    pub fn byte_at(&self, pos: usize) -> Option<u8> {
        if pos < self.gap_start {
            Some(self.buf[pos])
        } else {
            self.buf.get(pos + self.gap_size()).copied()
        }
    }

    /// Copy of the bytes in `[start, end)`.
    #[must_use]
    pub fn bytes_range(&self, start: usize, end: usize) -> Vec<u8> {
        let end = end.min(self.len());
        let start = start.min(end);
        let mut out = Vec::with_capacity(end - start);
        if start < self.gap_start {
            out.extend_from_slice(&self.buf[start..end.min(self.gap_start)]);
        }
        if end > self.gap_start {
            let seg_start = start.max(self.gap_start) + self.gap_size();
            out.extend_from_slice(&self.buf[seg_start..end + self.gap_size()]);
        }
        out
    }

    /// The two text segments on either side of the gap.
    #[must_use]
    pub fn segments(&self) -> (&[u8], &[u8]) {
        (&self.buf[..self.gap_start], &self.buf[self.gap_end..])
    }

    /// Insert `bytes` at `pos`; the gap ends up right after them.
    pub fn insert_bytes(&mut self, pos: usize, bytes: &[u8]) {
        debug_assert!(pos <= self.len(), "insert past end: {pos}");
        if bytes.is_empty() {
            return;
        }
        self.move_gap_to(pos);
        self.ensure_gap(bytes.len());
        self.buf[self.gap_start..self.gap_start + bytes.len()].copy_from_slice(bytes);
        self.gap_start += bytes.len();
    }

    /// Delete `[start, end)` by widening the gap over it.
    pub fn delete_range(&mut self, start: usize, end: usize) {
        debug_assert!(start <= end && end <= self.len(), "bad delete {start}..{end}");
        if start >= end {
            return;
        }
        self.move_gap_to(start);
        self.gap_end += end - start;
    }

    /// Move the gap so that it starts at `pos`.
    pub fn move_gap_to(&mut self, pos: usize) {
        let pos = pos.min(self.len());
        if pos == self.gap_start {
            return;
        }
        let gap = self.gap_size();
        if pos < self.gap_start {
            let count = self.gap_start - pos;
            self.buf.copy_within(pos..pos + count, pos + gap);
        } else {
            let count = pos - self.gap_start;
            self.buf
                .copy_within(self.gap_end..self.gap_end + count, self.gap_start);
        }
        self.gap_start = pos;
        self.gap_end = pos + gap;
    }

    /// Grow the gap to at least `min_size` bytes.
    pub fn ensure_gap(&mut self, min_size: usize) {
        if self.gap_size() >= min_size {
            return;
        }
        let grow = (min_size - self.gap_size()).max(MIN_GAP_GROW);
        let old_gap_end = self.gap_end;
        let tail = self.buf.len() - old_gap_end;
        self.buf.resize(self.buf.len() + grow, 0);
        if tail > 0 {
            self.buf
                .copy_within(old_gap_end..old_gap_end + tail, old_gap_end + grow);
        }
        self.gap_end += grow;
    }

    /// Mutable contiguous view of `[start, end)`.
    ///
    /// If the range straddles the gap, the gap is first moved to whichever
    /// end of the range is nearer to it.
    pub fn contiguous_mut(&mut self, start: usize, end: usize) -> &mut [u8] {
        let end = end.min(self.len());
        let start = start.min(end);
        if start < self.gap_start && self.gap_start < end {
            if self.gap_start - start <= end - self.gap_start {
                self.move_gap_to(start);
            } else {
                self.move_gap_to(end);
            }
        }
        if end <= self.gap_start {
            &mut self.buf[start..end]
        } else {
            let gap = self.gap_size();
            &mut self.buf[start + gap..end + gap]
        }
    }

    /// Whole logical text as bytes.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.bytes_range(0, self.len())
    }
}

impl std::fmt::Debug for GapBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GapBuffer")
            .field("len", &self.len())
            .field("gap_start", &self.gap_start)
            .field("gap_size", &self.gap_size())
            .finish()
    }
}
