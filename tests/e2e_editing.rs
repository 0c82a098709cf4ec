//! End-to-end editing sessions: several mutators in a row, with hooks,
//! undo and read-only text in play.

mod common;

use common::{HookCall, RecordingHooks, show_point};
use textcore::{Buffer, CompositionCheck, Error, InsertionType, TranslationTable, Value};

// ============================================================================
// Hooks
// ============================================================================

#[test]
fn insert_and_delete_report_changes() {
    common::init_logging();
    let mut buf = Buffer::with_text("e2e", "hello");
    let calls = RecordingHooks::install(&mut buf);
    buf.goto_char(6);
    buf.insert(" world").unwrap();
    buf.delete_region(1, 7).unwrap();
    assert_eq!(buf.text_string(), "world");
    assert_eq!(
        *calls.borrow(),
        vec![
            HookCall::Before(6, 6),
            HookCall::After(6, 6, 12),
            HookCall::Compositions(6, 12, CompositionCheck::Border),
            HookCall::Before(1, 7),
            HookCall::After(1, 7, 1),
            HookCall::Compositions(1, 1, CompositionCheck::Border),
        ]
    );
}

#[test]
fn subst_in_place_reports_one_change() {
    let mut buf = Buffer::with_text("e2e", "a-b-c");
    let calls = RecordingHooks::install(&mut buf);
    buf.subst_char_in_region(1, 6, '-', '+', false).unwrap();
    assert_eq!(buf.text_string(), "a+b+c");
    let calls = calls.borrow();
    assert_eq!(calls.first(), Some(&HookCall::Before(2, 6)));
    assert!(calls.contains(&HookCall::After(2, 5, 5)));
}

// ============================================================================
// Mutator Sequences
// ============================================================================

#[test]
fn edit_session_keeps_markers_and_point() {
    let mut buf = Buffer::with_text("e2e", "fn main() {}");
    let brace = buf.create_marker(11, InsertionType::After);
    buf.goto_char(12);
    buf.insert("\n    body\n").unwrap();
    assert_eq!(buf.marker_position(brace), Some(11));

    buf.subst_char_in_region(1, buf.point_max(), ' ', '·', false).unwrap();
    assert_eq!(buf.text_string(), "fn·main()·{\n····body\n}");
    // Multibyte replacement shifted bytes but not characters.
    assert_eq!(buf.marker_byte_position(brace), Some(buf.char_to_byte(11).unwrap()));

    let table = TranslationTable::dense_with(256, &[('b', 'B'), ('o', 'O')]);
    assert_eq!(buf.translate_region(13, 21, &table), Ok(2));
    assert_eq!(buf.text_string(), "fn·main()·{\n····BOdy\n}");
    assert_eq!(show_point(&buf), "fn·main()·{\n····BOdy\n|}");
}

#[test]
fn transpose_words_with_properties() {
    let mut buf = Buffer::with_text("e2e", "alpha beta");
    buf.put_text_property(1, 6, "face", Value::sym("a")).unwrap();
    buf.put_text_property(7, 11, "face", Value::sym("b")).unwrap();
    buf.goto_char(11);
    buf.transpose_regions(1, 6, 7, 11, false).unwrap();
    assert_eq!(buf.text_string(), "beta alpha");
    assert_eq!(buf.get_text_property(1, "face"), Some(&Value::sym("b")));
    assert_eq!(buf.get_text_property(5, "face"), None);
    assert_eq!(buf.get_text_property(6, "face"), Some(&Value::sym("a")));
    assert_eq!(buf.point(), 11);
}

#[test]
fn insert_char_counts_and_overflow() {
    let mut buf = Buffer::new("e2e");
    buf.insert_char('é', 3, false).unwrap();
    assert_eq!(buf.text_string(), "ééé");
    assert_eq!(buf.z_byte(), 7);
    buf.insert_char('x', 0, false).unwrap();
    buf.insert_char('x', -4, false).unwrap();
    assert_eq!(buf.z(), 4);
    assert_eq!(
        buf.insert_char('x', i64::MAX, false),
        Err(Error::Overflow("Maximum buffer size exceeded"))
    );
}

#[test]
fn delete_char_signals_at_edges() {
    let mut buf = Buffer::with_text("e2e", "abc");
    buf.goto_char(2);
    assert_eq!(buf.delete_char(-2), Err(Error::BeginningOfBuffer));
    assert_eq!(buf.delete_char(3), Err(Error::EndOfBuffer));
    buf.delete_char(1).unwrap();
    assert_eq!(buf.text_string(), "ac");
}

// ============================================================================
// Read-only Text
// ============================================================================

#[test]
fn read_only_text_blocks_edits() {
    let mut buf = Buffer::with_text("e2e", "prompt> input");
    buf.put_text_property(1, 8, "read-only", Value::T).unwrap();
    assert!(matches!(buf.delete_region(3, 9), Err(Error::TextReadOnly(_))));
    assert!(matches!(
        buf.subst_char_in_region(1, 8, 'p', 'P', false),
        Err(Error::TextReadOnly(_))
    ));
    buf.delete_region(9, 14).unwrap();
    assert_eq!(buf.text_string(), "prompt> ");

    buf.options_mut().inhibit_read_only = true;
    buf.delete_region(1, 3).unwrap();
    assert_eq!(buf.text_string(), "ompt> ");
}

#[test]
fn read_only_buffer_rejects_everything() {
    let mut buf = Buffer::with_text("locked", "abc");
    buf.options_mut().read_only = true;
    assert_eq!(buf.insert("x"), Err(Error::BufferReadOnly("locked".into())));
    assert_eq!(
        buf.transpose_regions(1, 2, 3, 4, false),
        Err(Error::BufferReadOnly("locked".into()))
    );
    assert_eq!(buf.text_string(), "abc");
}

// ============================================================================
// Undo
// ============================================================================

#[test]
fn undo_reverts_groups_in_order() {
    let mut buf = Buffer::with_text("e2e", "one two");
    buf.goto_char(8);
    buf.insert(" three").unwrap();
    buf.undo_boundary();
    buf.transpose_regions(1, 4, 5, 8, false).unwrap();
    buf.undo_boundary();
    buf.subst_char_in_region(1, buf.point_max(), 'e', 'E', false).unwrap();
    buf.undo_boundary();
    assert_eq!(buf.text_string(), "two onE thrEE");

    assert_eq!(buf.undo(), Ok(true));
    assert_eq!(buf.text_string(), "two one three");
    assert_eq!(buf.undo(), Ok(true));
    assert_eq!(buf.text_string(), "one two three");
    assert_eq!(buf.redo(), Ok(true));
    assert_eq!(buf.text_string(), "two one three");
}

#[test]
fn noundo_subst_leaves_no_trace() {
    let mut buf = Buffer::with_text("e2e", "aaa");
    buf.set_modified(false);
    buf.subst_char_in_region(1, 4, 'a', 'b', true).unwrap();
    assert_eq!(buf.text_string(), "bbb");
    assert!(!buf.modified_p());
    assert!(!buf.undo_list().is_disabled());
    assert_eq!(buf.undo(), Ok(false));
}
