//! Region extraction and deletion.

use crate::buffer::{BEG, Buffer, MAX_BUFFER_SIZE};
use crate::error::{Error, Result};
use crate::text::{Text, TextProps};
use crate::text::coding::char_bytes;

impl Buffer {
    /// Run the fontify hook over `[start, end)` unless the fontified
    /// property already covers every character there.
    fn update_buffer_properties(&mut self, start: usize, end: usize) -> Result<()> {
        if start >= end {
            return Ok(());
        }
        if let Some(prop) = &self.options.fontified_property {
            if self.intervals.all_non_nil(start, end, prop) {
                return Ok(());
            }
        }
        self.run_fontify(start, end)
    }

    /// Text of `[start, end)` with its properties.
    pub fn buffer_substring(&mut self, start: usize, end: usize) -> Result<Text> {
        let (start, end) = self.validate_region(start, end)?;
        self.update_buffer_properties(start, end)?;
        let (start, end) = self.validate_region(start, end)?;
        Ok(self.substring_with_props(start, end))
    }

    /// Text of `[start, end)` without properties.
    pub fn buffer_substring_no_properties(&self, start: usize, end: usize) -> Result<String> {
        let (start, end) = self.validate_region(start, end)?;
        Ok(self.substring_raw(start, end))
    }

    /// The accessible portion with properties.
    pub fn buffer_string(&mut self) -> Result<Text> {
        self.buffer_substring(self.begv, self.zv)
    }

    /// The accessible portion as plain text.
    #[must_use]
    pub fn buffer_string_no_properties(&self) -> String {
        self.substring_raw(self.begv, self.zv)
    }

    /// Delete `[start, end)`; both ends must be accessible.
    pub fn delete_region(&mut self, start: usize, end: usize) -> Result<()> {
        let (start, end) = self.validate_region(start, end)?;
        self.del_range_1(start, end, true).map(drop)
    }

    /// Delete `[start, end)` and return what was there.
    pub fn delete_and_extract_region(&mut self, start: usize, end: usize) -> Result<Text> {
        let (start, end) = self.validate_region(start, end)?;
        if start == end {
            return Ok(Text::from_parts(String::new(), self.is_multibyte(), TextProps::new()));
        }
        self.del_range_1(start, end, true)
    }

    /// Insert `count` copies of `c` at point. A non-positive count is a no-op.
    pub fn insert_char(&mut self, c: char, count: i64, inherit: bool) -> Result<()> {
        if count <= 0 {
            return Ok(());
        }
        let len = char_bytes(c, self.is_multibyte());
        let count = usize::try_from(count).map_err(|_| Error::Overflow("Maximum buffer size exceeded"))?;
        if MAX_BUFFER_SIZE / len < count {
            return Err(Error::Overflow("Maximum buffer size exceeded"));
        }
        let s: String = std::iter::repeat_n(c, count).collect();
        if inherit {
            self.insert_and_inherit(&s)
        } else {
            self.insert(&s)
        }
    }

    /// Delete `n` characters after point (before point if negative).
    pub fn delete_char(&mut self, n: i64) -> Result<()> {
        let pt = self.pt as i64;
        let pos = pt.saturating_add(n);
        if n < 0 {
            if pos < self.begv as i64 {
                return Err(Error::BeginningOfBuffer);
            }
            self.del_range(pos as usize, self.pt)
        } else {
            if pos > self.zv as i64 {
                return Err(Error::EndOfBuffer);
            }
            self.del_range(self.pt, pos as usize)
        }
    }

    /// Erase the whole buffer, widening first.
    pub fn erase_buffer(&mut self) -> Result<()> {
        self.widen();
        self.del_range(BEG, self.z)
    }
}
