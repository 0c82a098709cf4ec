//! Point motion and line positions.

use crate::buffer::Buffer;
use crate::error::{Error, Result};
use crate::text::coding::char_head_p;

impl Buffer {
    /// Set point to `pos`, clamped to the accessible portion. Returns the
    /// new point.
    pub fn goto_char(&mut self, pos: usize) -> usize {
        self.set_point(pos);
        self.pt
    }

    /// Move point `n` characters forward (backward if negative).
    ///
    /// Stops at the narrowing bound and signals when it had to.
    pub fn forward_char(&mut self, n: i64) -> Result<()> {
        let target = i64::try_from(self.pt).unwrap_or(i64::MAX).saturating_add(n);
        if target < self.begv as i64 {
            self.set_point(self.begv);
            return Err(Error::BeginningOfBuffer);
        }
        if target > self.zv as i64 {
            self.set_point(self.zv);
            return Err(Error::EndOfBuffer);
        }
        self.set_point(target as usize);
        Ok(())
    }

    pub fn backward_char(&mut self, n: i64) -> Result<()> {
        self.forward_char(n.saturating_neg())
    }

    /// Point is at the start of the accessible portion.
    #[must_use]
    pub fn bobp(&self) -> bool {
        self.pt == self.begv
    }

    /// Point is at the end of the accessible portion.
    #[must_use]
    pub fn eobp(&self) -> bool {
        self.pt == self.zv
    }

    /// Point is at the beginning of a line.
    #[must_use]
    pub fn bolp(&self) -> bool {
        self.pt == self.begv || self.char_before(self.pt) == Some('\n')
    }

    /// Point is at the end of a line.
    #[must_use]
    pub fn eolp(&self) -> bool {
        self.pt == self.zv || self.char_after(self.pt) == Some('\n')
    }

    /// Scan from `start` toward `limit` for `count` newlines (backward when
    /// `count` is negative).
    ///
    /// Returns the position just after the last newline found, or `limit`
    /// when fewer were found, together with the number found (negative when
    /// scanning backward). Newline bytes never occur inside a multibyte
    /// character, so the scan works on raw bytes.
    pub(crate) fn find_newline(&self, start: usize, limit: usize, count: i64) -> (usize, i64) {
        let gap = self.gap();
        let mut counted = 0;
        if count > 0 {
            let limit = limit.max(start);
            let limit_byte = self.pos_byte(limit);
            let mut pos = start;
            let mut b = self.pos_byte(start);
            while b < limit_byte {
                let byte = gap.byte_at(b - 1).unwrap_or(0);
                b += 1;
                if char_head_p(byte) {
                    pos += 1;
                }
                if byte == b'\n' {
                    counted += 1;
                    if counted == count {
                        return (pos, counted);
                    }
                }
            }
            (limit, counted)
        } else if count < 0 {
            let limit = limit.min(start);
            let limit_byte = self.pos_byte(limit);
            let mut pos = start;
            let mut b = self.pos_byte(start);
            while b > limit_byte {
                b -= 1;
                let byte = gap.byte_at(b - 1).unwrap_or(0);
                if char_head_p(byte) {
                    pos -= 1;
                }
                if byte == b'\n' {
                    counted -= 1;
                    if counted == count {
                        return (pos + 1, counted);
                    }
                }
            }
            (limit, counted)
        } else {
            (start, 0)
        }
    }

    /// True if a newline lies between `a` and `b`.
    pub(crate) fn newline_between(&self, a: usize, b: usize) -> bool {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        self.find_newline(lo, hi, 1).1 != 0
    }

    /// Start of line `n` relative to point (1 is the current line), ignoring
    /// fields.
    #[must_use]
    pub fn pos_bol(&self, n: i64) -> usize {
        let count = n.saturating_sub(1);
        if count <= 0 {
            self.find_newline(self.pt, self.begv, count - 1).0
        } else {
            self.find_newline(self.pt, self.zv, count).0
        }
    }

    /// End of line `n` relative to point, ignoring fields.
    #[must_use]
    pub fn pos_eol(&self, n: i64) -> usize {
        let count = if n <= 0 { n.saturating_sub(1) } else { n };
        let limit = if count > 0 { self.zv } else { self.begv };
        let (pos, counted) = self.find_newline(self.pt, limit, count);
        if counted == count { pos - 1 } else { pos }
    }

    /// Start of line `n`, constrained to the field at point.
    pub fn line_beginning_position(&mut self, n: i64) -> usize {
        let bol = self.pos_bol(n);
        self.constrain_to_field(Some(bol), self.pt, n != 1, true, None)
    }

    /// End of line `n`, constrained to the field at point.
    pub fn line_end_position(&mut self, n: i64) -> usize {
        let eol = self.pos_eol(n);
        self.constrain_to_field(Some(eol), self.pt, false, true, None)
    }
}
