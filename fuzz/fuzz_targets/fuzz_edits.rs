//! Fuzz target for buffer edits.
//!
//! Replays a random sequence of edits and checks that positions stay
//! ordered and markers agree with the coordinate translator.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use textcore::{Buffer, InsertionType};

#[derive(Arbitrary, Debug)]
enum Edit {
    Goto(u16),
    Insert(String),
    Delete(u16, u16),
    Narrow(u16, u16),
    Widen,
    Subst(u16, u16, char, char),
    Transpose([u16; 4], bool),
    Marker(u16, bool),
    Overlay(u16, u16),
    Undo,
    Boundary,
}

fn pos(buf: &Buffer, p: u16) -> usize {
    1 + usize::from(p) % buf.z()
}

fuzz_target!(|edits: Vec<Edit>| {
    let mut buf = Buffer::with_text("fuzz", "héllo 漢字 world");
    let mut markers = Vec::new();
    for edit in edits.into_iter().take(64) {
        let _ = match edit {
            Edit::Goto(p) => {
                buf.goto_char(pos(&buf, p));
                Ok(())
            }
            Edit::Insert(s) => buf.insert(&s.chars().take(32).collect::<String>()),
            Edit::Delete(a, b) => buf.delete_region(pos(&buf, a), pos(&buf, b)),
            Edit::Narrow(a, b) => buf.narrow_to_region(pos(&buf, a), pos(&buf, b)),
            Edit::Widen => {
                buf.widen();
                Ok(())
            }
            Edit::Subst(a, b, from, to) => {
                buf.subst_char_in_region(pos(&buf, a), pos(&buf, b), from, to, false)
            }
            Edit::Transpose(ps, leave) => {
                let mut ps = ps.map(|p| pos(&buf, p));
                ps.sort_unstable();
                buf.transpose_regions(ps[0], ps[1], ps[2], ps[3], leave)
            }
            Edit::Marker(p, advance) => {
                let at = pos(&buf, p);
                markers.push(buf.create_marker(at, InsertionType::from_advance(advance)));
                Ok(())
            }
            Edit::Overlay(a, b) => buf.make_overlay(pos(&buf, a), pos(&buf, b), false, false).map(drop),
            Edit::Undo => buf.undo().map(drop),
            Edit::Boundary => {
                buf.undo_boundary();
                Ok(())
            }
        };

        assert!(buf.point_min() <= buf.point() && buf.point() <= buf.point_max());
        assert!(buf.point_max() <= buf.z());
        assert_eq!(buf.char_to_byte(buf.z()).ok(), Some(buf.z_byte()));
        for &m in &markers {
            let c = buf.marker_position(m).unwrap();
            assert_eq!(buf.marker_byte_position(m), buf.char_to_byte(c).ok());
        }
    }
});
