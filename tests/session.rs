//! Multi-buffer sessions: current buffer, markers across buffers, and
//! killing buffers under live handles.

mod common;

use textcore::{Error, InsertionType, Session, Value};

// ============================================================================
// Current Buffer
// ============================================================================

#[test]
fn copy_text_between_buffers() {
    common::init_logging();
    let mut session = Session::new();
    let src = session.get_buffer_create("src");
    let dst = session.get_buffer_create("dst");

    session.with_current_buffer(src, |s| {
        let b = s.current_mut();
        b.insert("let x = 1;").unwrap();
        b.put_text_property(5, 6, "face", Value::sym("var")).unwrap();
    })
    .unwrap();

    session.set_buffer(dst).unwrap();
    session.insert_buffer_substring(src, 1, 11).unwrap();
    session.current_mut().insert("\n").unwrap();
    session.insert_buffer_substring(src, 5, 6).unwrap();

    let b = session.buffer(dst).unwrap();
    assert_eq!(b.text_string(), "let x = 1;\nx");
    assert_eq!(b.get_text_property(5, "face"), Some(&Value::sym("var")));
    assert_eq!(b.get_text_property(12, "face"), Some(&Value::sym("var")));
    assert_eq!(session.compare_buffer_substrings(src, 1, 11, dst, 1, 11), Ok(0));
    assert_eq!(session.compare_buffer_substrings(src, 1, 3, dst, 5, 7), Ok(-1));
}

#[test]
fn excursion_survives_edits_in_other_buffers() {
    let mut session = Session::new();
    let log = session.get_buffer_create("log");
    session.current_mut().insert("abc").unwrap();
    session.current_mut().goto_char(2);
    let home = session.current_buffer();

    session.save_excursion(|s| {
        s.set_buffer(log).unwrap();
        s.current_mut().insert("entry").unwrap();
        s.set_buffer(home).unwrap();
        s.current_mut().goto_char(1);
        s.current_mut().insert(">>").unwrap();
    });

    assert_eq!(session.current_buffer(), home);
    assert_eq!(session.current().point(), 4);
    assert_eq!(session.buffer(log).unwrap().text_string(), "entry");
}

// ============================================================================
// Markers
// ============================================================================

#[test]
fn marker_follows_text_and_moves_between_buffers() {
    let mut session = Session::new();
    let a = session.get_buffer_create("a");
    let b = session.get_buffer_create("b");
    session.buffer_mut(a).unwrap().insert("0123456789").unwrap();
    session.buffer_mut(b).unwrap().insert("xyz").unwrap();

    let mut m = session.make_marker();
    assert_eq!(session.marker_buffer(&m), None);
    session.set_marker(&mut m, Some(5), Some(a));
    let advancing = session.copy_marker(&m, InsertionType::After);

    let buf = session.buffer_mut(a).unwrap();
    buf.goto_char(5);
    buf.insert("--").unwrap();
    assert_eq!(session.marker_position(&m), Some(5));
    assert_eq!(session.marker_position(&advancing), Some(7));

    session.set_marker(&mut m, Some(99), Some(b));
    assert_eq!(session.marker_buffer(&m), Some(b));
    assert_eq!(session.marker_position(&m), Some(4));
    assert_eq!(session.goto_marker(&m), Ok(4));
    assert_eq!(session.current_buffer(), b);
}

#[test]
fn killing_a_buffer_detaches_its_markers() {
    let mut session = Session::new();
    let doomed = session.get_buffer_create("doomed");
    session.set_buffer(doomed).unwrap();
    session.current_mut().insert("text").unwrap();
    let m = session.point_marker();
    assert_eq!(session.marker_position(&m), Some(5));

    assert!(session.kill_buffer(doomed));
    assert!(!session.buffer_live_p(doomed));
    assert_ne!(session.current_buffer(), doomed);
    assert_eq!(session.marker_buffer(&m), None);
    assert_eq!(session.goto_marker(&m), Err(Error::DetachedMarker));
    assert_eq!(session.buffer(doomed).err(), Some(Error::DeadBuffer));
    assert!(session.with_current_buffer(doomed, |_| ()).is_err());

    // The slot is reused under a new id.
    let reborn = session.get_buffer_create("doomed");
    assert_ne!(reborn, doomed);
    assert!(session.buffer(reborn).unwrap().text_string().is_empty());
}

#[test]
fn killing_the_last_buffer_makes_scratch() {
    let mut session = Session::new();
    for id in session.buffer_list() {
        session.kill_buffer(id);
    }
    let list = session.buffer_list();
    assert_eq!(list.len(), 1);
    assert_eq!(session.current().name(), "*scratch*");
}
