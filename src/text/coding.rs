//! Byte-level character encoding for buffer text.
//!
//! A multibyte buffer stores UTF-8. A unibyte buffer stores one byte per
//! character, and byte `b` reads back as the character `U+00bb`.

/// Longest encoded character, in bytes.
pub const MAX_MULTIBYTE_LENGTH: usize = 4;

/// True if `byte` starts a character (is not a UTF-8 continuation byte).
#[inline]
#[must_use]
pub const fn char_head_p(byte: u8) -> bool {
    byte & 0xC0 != 0x80
}

/// Length of the character whose first byte is `head`.
#[inline]
#[must_use]
pub const fn bytes_by_char_head(head: u8) -> usize {
    if head < 0x80 {
        1
    } else if head & 0xE0 == 0xC0 {
        2
    } else if head & 0xF0 == 0xE0 {
        3
    } else if head & 0xF8 == 0xF0 {
        4
    } else {
        // Stray continuation byte; step over it alone.
        1
    }
}

/// Bytes needed for `c` in a buffer of the given kind.
#[inline]
#[must_use]
pub const fn char_bytes(c: char, multibyte: bool) -> usize {
    if multibyte { c.len_utf8() } else { 1 }
}

/// Append the encoding of `c` to `out`.
pub fn encode_char(c: char, multibyte: bool, out: &mut Vec<u8>) {
    if multibyte {
        let mut tmp = [0u8; MAX_MULTIBYTE_LENGTH];
        out.extend_from_slice(c.encode_utf8(&mut tmp).as_bytes());
    } else {
        out.push(unibyte_of(c));
    }
}

/// Encode a whole string.
#[must_use]
pub fn encode_str(s: &str, multibyte: bool) -> Vec<u8> {
    if multibyte {
        return s.as_bytes().to_vec();
    }
    s.chars().map(unibyte_of).collect()
}

/// Decode the character starting at `bytes[0]`; returns it with its length.
#[must_use]
pub fn decode_char(bytes: &[u8], multibyte: bool) -> Option<(char, usize)> {
    let head = *bytes.first()?;
    if !multibyte {
        return Some((char::from(head), 1));
    }
    let len = bytes_by_char_head(head).min(bytes.len());
    match std::str::from_utf8(&bytes[..len]) {
        Ok(s) => s.chars().next().map(|c| (c, len)),
        Err(_) => Some((char::REPLACEMENT_CHARACTER, 1)),
    }
}

/// Decode a byte run into a string.
#[must_use]
pub fn decode_bytes(bytes: &[u8], multibyte: bool) -> String {
    if multibyte {
        String::from_utf8_lossy(bytes).into_owned()
    } else {
        bytes.iter().map(|&b| char::from(b)).collect()
    }
}

/// Single byte used when storing `c` in a unibyte buffer.
#[inline]
#[must_use]
pub const fn unibyte_of(c: char) -> u8 {
    (c as u32 & 0xFF) as u8
}

/// True if every character fits one unibyte byte.
#[must_use]
pub fn fits_unibyte(s: &str) -> bool {
    s.chars().all(|c| u32::from(c) <= 0xFF)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_heads() {
        let s = "aé漢😀";
        let heads = s.bytes().filter(|&b| char_head_p(b)).count();
        assert_eq!(heads, 4);
        assert_eq!(bytes_by_char_head(b'a'), 1);
        assert_eq!(bytes_by_char_head("é".as_bytes()[0]), 2);
        assert_eq!(bytes_by_char_head("漢".as_bytes()[0]), 3);
        assert_eq!(bytes_by_char_head("😀".as_bytes()[0]), 4);
    }

    #[test]
    fn test_unibyte_roundtrip() {
        let bytes = encode_str("aé", false);
        assert_eq!(bytes, vec![b'a', 0xE9]);
        assert_eq!(decode_bytes(&bytes, false), "aé");
        assert_eq!(decode_char(&bytes[1..], false), Some(('é', 1)));
    }

    #[test]
    fn test_multibyte_decode() {
        let bytes = encode_str("漢x", true);
        assert_eq!(decode_char(&bytes, true), Some(('漢', 3)));
        assert_eq!(decode_char(&bytes[3..], true), Some(('x', 1)));
        assert_eq!(decode_char(&[], true), None);
        assert!(fits_unibyte("ÿ"));
        assert!(!fits_unibyte("漢"));
    }
}
