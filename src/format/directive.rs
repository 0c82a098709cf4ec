//! Parsing of `%` directives.

use bitflags::bitflags;

use crate::error::{Error, Result};

bitflags! {
    /// Flag characters of a directive.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
    pub struct Flags: u8 {
        /// `-`: pad on the right.
        const MINUS = 0x01;
        /// `+`: always print a sign.
        const PLUS  = 0x02;
        /// ` `: print a space where a `+` would go.
        const SPACE = 0x04;
        /// `#`: alternate form.
        const SHARP = 0x08;
        /// `0`: pad numbers with zeros.
        const ZERO  = 0x10;
    }
}

impl Flags {
    fn from_char(c: char) -> Option<Self> {
        match c {
            '-' => Some(Self::MINUS),
            '+' => Some(Self::PLUS),
            ' ' => Some(Self::SPACE),
            '#' => Some(Self::SHARP),
            '0' => Some(Self::ZERO),
            _ => None,
        }
    }

    /// Drop flags that are overridden by others.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.contains(Self::PLUS) {
            self.remove(Self::SPACE);
        }
        if self.contains(Self::MINUS) {
            self.remove(Self::ZERO);
        }
        self
    }
}

/// One parsed directive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Directive {
    /// Explicit 1-based argument number from `%N$`.
    pub field: Option<usize>,
    pub flags: Flags,
    pub width: usize,
    pub precision: Option<usize>,
    pub conversion: char,
    /// Characters the directive spans in the format string, `%` included.
    pub len: usize,
}

impl Directive {
    #[must_use]
    pub const fn is_literal_percent(&self) -> bool {
        self.conversion == '%'
    }
}

/// Saturating decimal number at the head of `chars[i..]`. Returns the value
/// and the index after the digits.
fn number(chars: &[char], mut i: usize) -> (usize, usize) {
    let mut n: usize = 0;
    while let Some(d) = chars.get(i).and_then(|c| c.to_digit(10)) {
        n = n.saturating_mul(10).saturating_add(d as usize);
        i += 1;
    }
    (n, i)
}

/// Parse the directive whose `%` is at `chars[start]`.
pub fn parse(chars: &[char], start: usize) -> Result<Directive> {
    let mut i = start + 1;
    let mut field = None;

    if chars.get(i).is_some_and(char::is_ascii_digit) {
        let (n, after) = number(chars, i);
        if chars.get(after) == Some(&'$') {
            if n == 0 {
                return Err(Error::Format("Invalid format field number 0".into()));
            }
            field = Some(n);
            i = after + 1;
        }
    }

    let mut flags = Flags::empty();
    while let Some(flag) = chars.get(i).copied().and_then(Flags::from_char) {
        flags |= flag;
        i += 1;
    }

    let (width, after) = number(chars, i);
    i = after;

    let mut precision = None;
    if chars.get(i) == Some(&'.') {
        let (p, after) = number(chars, i + 1);
        precision = Some(p);
        i = after;
    }

    let Some(&conversion) = chars.get(i) else {
        return Err(Error::Format(
            "Format string ends in middle of format specifier".into(),
        ));
    };
    if !matches!(conversion, 'd' | 'i' | 'o' | 'x' | 'X' | 'e' | 'f' | 'g' | 'c' | 's' | 'S' | '%') {
        return Err(Error::Format(format!("Invalid format operation %{conversion}")));
    }

    Ok(Directive {
        field,
        flags: flags.normalized(),
        width,
        precision,
        conversion,
        len: i + 1 - start,
    })
}
