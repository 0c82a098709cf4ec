//! Growable output buffer for one formatting pass.

use crate::error::{Error, Result};

pub const STRING_OVERFLOW: &str = "Maximum string size exceeded";

/// Output of a pass, sized in the bytes the final string will take.
///
/// In a unibyte pass every character is one byte; in a multibyte pass it
/// is its UTF-8 length. The logical capacity doubles on demand, up to
/// `max_bytes`; a write that would pass that limit fails with
/// [`Error::Overflow`] and nothing is written.
#[derive(Debug)]
pub struct OutBuf {
    text: String,
    nbytes: usize,
    nchars: usize,
    capacity: usize,
    max_bytes: usize,
    multibyte: bool,
}

impl OutBuf {
    #[must_use]
    pub fn new(initial: usize, max_bytes: usize, multibyte: bool) -> Self {
        let capacity = initial.clamp(1, max_bytes.max(1));
        Self {
            text: String::with_capacity(capacity),
            nbytes: 0,
            nchars: 0,
            capacity,
            max_bytes,
            multibyte,
        }
    }

    fn char_bytes(&self, c: char) -> usize {
        if self.multibyte { c.len_utf8() } else { 1 }
    }

    /// Make room for `n` more bytes.
    fn reserve(&mut self, n: usize) -> Result<()> {
        let needed = self
            .nbytes
            .checked_add(n)
            .filter(|&needed| needed <= self.max_bytes)
            .ok_or(Error::Overflow(STRING_OVERFLOW))?;
        if needed > self.capacity {
            while self.capacity < needed {
                self.capacity = if self.capacity <= self.max_bytes / 2 {
                    self.capacity * 2
                } else {
                    self.max_bytes
                };
            }
            self.text.reserve(self.capacity.saturating_sub(self.text.len()));
        }
        Ok(())
    }

    pub fn push_char(&mut self, c: char) -> Result<()> {
        self.reserve(self.char_bytes(c))?;
        self.text.push(c);
        self.nbytes += self.char_bytes(c);
        self.nchars += 1;
        Ok(())
    }

    pub fn push_str(&mut self, s: &str) -> Result<()> {
        let (nchars, nbytes) = if self.multibyte {
            (s.chars().count(), s.len())
        } else {
            let n = s.chars().count();
            (n, n)
        };
        self.reserve(nbytes)?;
        self.text.push_str(s);
        self.nbytes += nbytes;
        self.nchars += nchars;
        Ok(())
    }

    /// Append `n` copies of the ASCII character `c`.
    pub fn push_repeat(&mut self, c: char, n: usize) -> Result<()> {
        if n == 0 {
            return Ok(());
        }
        self.reserve(n)?;
        self.text.extend(std::iter::repeat_n(c, n));
        self.nbytes += n;
        self.nchars += n;
        Ok(())
    }

    #[must_use]
    pub const fn nchars(&self) -> usize {
        self.nchars
    }

    #[must_use]
    pub const fn nbytes(&self) -> usize {
        self.nbytes
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.text
    }
}
