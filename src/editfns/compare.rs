//! Character and substring comparison.

use std::cmp::Ordering;

use crate::buffer::Buffer;
use crate::error::Result;

/// Compare two characters, ignoring case when `case_fold` is set.
#[must_use]
pub fn char_equal(c1: char, c2: char, case_fold: bool) -> bool {
    c1 == c2 || (case_fold && c1.to_lowercase().eq(c2.to_lowercase()))
}

fn fold(c: char, case_fold: bool) -> char {
    if case_fold {
        let mut lower = c.to_lowercase();
        match (lower.next(), lower.next()) {
            (Some(l), None) => l,
            _ => c,
        }
    } else {
        c
    }
}

/// Compare `[start1, end1)` of `a` with `[start2, end2)` of `b`.
///
/// Returns 0 when equal. Otherwise the magnitude is one plus the index of
/// the first differing character (or of the end of the shorter range), and
/// the sign is negative when `a`'s text sorts first. Case folding follows
/// `a`'s options.
pub fn compare_buffer_substrings(
    a: &Buffer,
    start1: usize,
    end1: usize,
    b: &Buffer,
    start2: usize,
    end2: usize,
) -> Result<i64> {
    let (start1, end1) = a.validate_region(start1, end1)?;
    let (start2, end2) = b.validate_region(start2, end2)?;
    let case_fold = a.options().case_fold_search;
    let s1 = a.buffer_substring_no_properties(start1, end1)?;
    let s2 = b.buffer_substring_no_properties(start2, end2)?;

    let mut index: i64 = 0;
    let mut it1 = s1.chars();
    let mut it2 = s2.chars();
    loop {
        index += 1;
        match (it1.next(), it2.next()) {
            (None, None) => return Ok(0),
            (None, Some(_)) => return Ok(-index),
            (Some(_), None) => return Ok(index),
            (Some(c1), Some(c2)) => match fold(c1, case_fold).cmp(&fold(c2, case_fold)) {
                Ordering::Equal => {}
                Ordering::Less => return Ok(-index),
                Ordering::Greater => return Ok(index),
            },
        }
    }
}
