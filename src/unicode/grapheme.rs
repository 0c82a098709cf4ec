//! Width-bounded prefixes that never split a grapheme cluster.

use unicode_segmentation::UnicodeSegmentation;

use crate::unicode::width::display_width;

/// A prefix of a string cut at a grapheme boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Prefix {
    pub chars: usize,
    pub bytes: usize,
    pub width: usize,
}

/// Longest prefix of `s` whose display width does not exceed `max_width`.
///
/// Whole grapheme clusters are taken or left, so a base character is never
/// separated from its combining marks. `None` means no limit.
#[must_use]
pub fn width_prefix(s: &str, max_width: Option<usize>) -> Prefix {
    let Some(max_width) = max_width else {
        return Prefix {
            chars: s.chars().count(),
            bytes: s.len(),
            width: display_width(s),
        };
    };
    let mut prefix = Prefix {
        chars: 0,
        bytes: 0,
        width: 0,
    };
    for grapheme in s.graphemes(true) {
        let width = display_width(grapheme);
        if prefix.width + width > max_width {
            break;
        }
        prefix.chars += grapheme.chars().count();
        prefix.bytes += grapheme.len();
        prefix.width += width;
    }
    prefix
}
