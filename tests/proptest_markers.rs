//! Property-based tests for the position model.
//!
//! Markers, the coordinate translator and the region mutators must agree
//! on every buffer, whatever mix of one- and multi-byte characters it holds.

mod common;

use proptest::prelude::*;
use textcore::{Buffer, InsertionType, TranslationTable};

// ============================================================================
// Strategies
// ============================================================================

/// Text mixing 1-, 2-, 3- and 4-byte characters.
fn mixed_text(max: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop::sample::select(vec!['a', 'b', ' ', '\n', 'é', 'ß', '漢', '字', '😀']),
        0..max,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

fn insertion_type() -> impl Strategy<Value = InsertionType> {
    prop::bool::ANY.prop_map(InsertionType::from_advance)
}

/// Buffer text plus four ordered positions in `[1, Z]`.
fn text_and_regions() -> impl Strategy<Value = (String, [usize; 4])> {
    mixed_text(40).prop_flat_map(|text| {
        let z = text.chars().count() + 1;
        (
            Just(text),
            prop::collection::vec(1..=z, 4).prop_map(|mut v| {
                v.sort_unstable();
                [v[0], v[1], v[2], v[3]]
            }),
        )
    })
}

// ============================================================================
// Coordinate Translation
// ============================================================================

proptest! {
    /// char_to_byte and byte_to_char are inverse over [BEG, Z].
    #[test]
    fn char_byte_round_trip(text in mixed_text(60)) {
        let buf = Buffer::with_text("p", &text);
        for c in 1..=buf.z() {
            let b = buf.char_to_byte(c).unwrap();
            prop_assert_eq!(buf.byte_to_char(b).unwrap(), c);
        }
        prop_assert_eq!(buf.char_to_byte(buf.z()).unwrap(), buf.z_byte());
        prop_assert!(buf.char_to_byte(buf.z() + 1).is_err());
    }

    /// The translation is monotonic: later characters have later bytes.
    #[test]
    fn char_to_byte_is_monotonic(text in mixed_text(60)) {
        let buf = Buffer::with_text("p", &text);
        let bytes: Vec<usize> = (1..=buf.z()).map(|c| buf.char_to_byte(c).unwrap()).collect();
        prop_assert!(bytes.windows(2).all(|w| w[0] < w[1]));
    }

    /// Answers stay right after edits invalidate cached anchors.
    #[test]
    fn translation_survives_edits(text in mixed_text(40), at in 0usize..40, ins in mixed_text(8)) {
        let mut buf = Buffer::with_text("p", &text);
        // Warm the cache at the far end.
        let _ = buf.char_to_byte(buf.z());
        buf.goto_char(1 + at % buf.z());
        buf.insert(&ins).unwrap();
        let expected = buf.text_string();
        for c in 1..=buf.z() {
            let prefix: String = expected.chars().take(c - 1).collect();
            prop_assert_eq!(buf.char_to_byte(c).unwrap(), prefix.len() + 1);
        }
    }
}

// ============================================================================
// Marker Adjustment
// ============================================================================

proptest! {
    /// A marker advances over an insertion at its position only when its
    /// insertion type says so; markers after the insertion always shift.
    #[test]
    fn marker_shift_on_insert(
        text in mixed_text(30),
        marks in prop::collection::vec((0usize..31, insertion_type()), 0..8),
        at in 0usize..31,
        ins in mixed_text(6),
    ) {
        let mut buf = Buffer::with_text("p", &text);
        let z = buf.z();
        let p = 1 + at % z;
        let ids: Vec<_> = marks
            .iter()
            .map(|&(m, t)| {
                let pos = 1 + m % z;
                (buf.create_marker(pos, t), pos, t)
            })
            .collect();

        buf.goto_char(p);
        buf.insert(&ins).unwrap();
        let n = ins.chars().count();

        for (id, before, t) in ids {
            let after = buf.marker_position(id).unwrap();
            let expected = if before > p || (before == p && t == InsertionType::After) {
                before + n
            } else {
                before
            };
            prop_assert_eq!(after, expected);
            prop_assert_eq!(buf.marker_byte_position(id).unwrap(), buf.char_to_byte(after).unwrap());
        }
    }

    /// Markers inside a deleted region collapse to its start.
    #[test]
    fn marker_collapse_on_delete((text, [s, inside, e, after]) in text_and_regions()) {
        let mut buf = Buffer::with_text("p", &text);
        let m1 = buf.create_marker(inside, InsertionType::After);
        let m2 = buf.create_marker(after, InsertionType::Before);
        buf.delete_region(s, e).unwrap();
        prop_assert_eq!(buf.marker_position(m1), Some(s));
        prop_assert_eq!(buf.marker_position(m2), Some(after - (e - s)));
        for id in [m1, m2] {
            let c = buf.marker_position(id).unwrap();
            prop_assert_eq!(buf.marker_byte_position(id).unwrap(), buf.char_to_byte(c).unwrap());
        }
    }
}

// ============================================================================
// Region Mutators
// ============================================================================

proptest! {
    /// Deleting a region and inserting it back restores the text.
    #[test]
    fn delete_then_insert_restores((text, [s, e, _, _]) in text_and_regions()) {
        common::init_logging();
        let mut buf = Buffer::with_text("p", &text);
        let removed = buf.delete_and_extract_region(s, e).unwrap();
        buf.goto_char(s);
        buf.insert_text(&removed).unwrap();
        prop_assert_eq!(buf.text_string(), text);
    }

    /// Transposing the swapped regions again restores the original text,
    /// and every step keeps the position invariants.
    #[test]
    fn transpose_twice_restores((text, [s1, e1, s2, e2]) in text_and_regions(), leave in prop::bool::ANY) {
        let mut buf = Buffer::with_text("p", &text);
        buf.transpose_regions(s1, e1, s2, e2, leave).unwrap();
        prop_assert!(buf.point_min() <= buf.point() && buf.point() <= buf.point_max());
        prop_assert_eq!(buf.text_string().chars().count(), text.chars().count());

        let len1 = e1 - s1;
        let len2 = e2 - s2;
        buf.transpose_regions(s1, s1 + len2, e2 - len1, e2, leave).unwrap();
        prop_assert_eq!(buf.text_string(), text);
        prop_assert_eq!(buf.char_to_byte(buf.z()).unwrap(), buf.z_byte());
    }

    /// Marker byte positions agree with the translator after a swap.
    #[test]
    fn transpose_keeps_marker_bytes(
        (text, [s1, e1, s2, e2]) in text_and_regions(),
        marks in prop::collection::vec(0usize..41, 1..6),
        leave in prop::bool::ANY,
    ) {
        let mut buf = Buffer::with_text("p", &text);
        let z = buf.z();
        let ids: Vec<_> = marks
            .iter()
            .map(|m| buf.create_marker(1 + m % z, InsertionType::Before))
            .collect();
        buf.transpose_regions(s1, e1, s2, e2, leave).unwrap();
        for id in ids {
            let c = buf.marker_position(id).unwrap();
            prop_assert_eq!(buf.marker_byte_position(id).unwrap(), buf.char_to_byte(c).unwrap());
        }
    }
}

// ============================================================================
// Point Across Length-Changing Replacements
// ============================================================================

/// Point's byte position agrees with the translator, and the next
/// insertion lands at point.
fn check_point_then_insert(buf: &mut Buffer) -> Result<(), TestCaseError> {
    prop_assert_eq!(buf.point_byte(), buf.char_to_byte(buf.point()).unwrap());
    let mut expected: Vec<char> = buf.text_string().chars().collect();
    expected.insert(buf.point() - 1, 'X');
    buf.insert("X").unwrap();
    prop_assert_eq!(buf.text_string(), expected.into_iter().collect::<String>());
    Ok(())
}

proptest! {
    #[test]
    fn subst_keeps_point_byte(text in mixed_text(30), at in 0usize..31, to_wide in prop::bool::ANY) {
        let mut buf = Buffer::with_text("p", &text);
        buf.goto_char(1 + at % buf.z());
        let (from, to) = if to_wide { ('a', '漢') } else { ('é', 'e') };
        buf.subst_char_in_region(1, buf.z(), from, to, false).unwrap();
        check_point_then_insert(&mut buf)?;
    }

    #[test]
    fn translate_keeps_point_byte(text in mixed_text(30), at in 0usize..31) {
        let mut buf = Buffer::with_text("p", &text);
        buf.goto_char(1 + at % buf.z());
        let table = TranslationTable::dense_with(256, &[('a', 'ä'), ('é', 'e')]);
        buf.translate_region(1, buf.z(), &table).unwrap();
        check_point_then_insert(&mut buf)?;
    }
}
