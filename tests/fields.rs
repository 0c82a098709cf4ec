//! Field resolution through the public API.

mod common;

use textcore::{Buffer, Value};

/// `field=A` over [1,5), `boundary` over [5,6), `B` over [6,10).
fn three_runs() -> Buffer {
    let mut buf = Buffer::with_text("fields", "name:valu!");
    buf.put_text_property(1, 5, "field", Value::sym("A")).unwrap();
    buf.put_text_property(5, 6, "field", Value::sym("boundary")).unwrap();
    buf.put_text_property(6, 10, "field", Value::sym("B")).unwrap();
    buf
}

// ============================================================================
// Field Boundaries
// ============================================================================

mod boundaries {
    use super::*;

    #[test]
    fn merge_fuses_across_boundary() {
        common::init_logging();
        let buf = three_runs();
        assert_eq!(buf.find_field(Some(5), true, None, None), Ok((1, 10)));
    }

    #[test]
    fn without_merge_rear_sticky_belongs_before() {
        let buf = three_runs();
        assert_eq!(buf.find_field(Some(5), false, None, None), Ok((1, 5)));
    }

    #[test]
    fn without_merge_front_sticky_belongs_after() {
        let mut buf = three_runs();
        buf.put_text_property(1, 5, "rear-nonsticky", Value::T).unwrap();
        buf.put_text_property(5, 6, "front-sticky", Value::T).unwrap();
        assert_eq!(buf.find_field(Some(5), false, None, None), Ok((5, 6)));
    }

    #[test]
    fn interior_positions() {
        let buf = three_runs();
        assert_eq!(buf.find_field(Some(3), false, None, None), Ok((1, 5)));
        assert_eq!(buf.find_field(Some(8), false, None, None), Ok((6, 10)));
        assert_eq!(buf.field_beginning(Some(8), false, None), Ok(6));
        assert_eq!(buf.field_end(Some(2), false, None), Ok(5));
    }

    #[test]
    fn narrowing_clamps_field() {
        let mut buf = three_runs();
        buf.narrow_to_region(2, 8).unwrap();
        assert_eq!(buf.find_field(Some(3), false, None, None), Ok((2, 5)));
        assert_eq!(buf.find_field(Some(7), false, None, None), Ok((6, 8)));
    }

    #[test]
    fn overlay_field_wins_over_text_property() {
        let mut buf = three_runs();
        let ov = buf.make_overlay(2, 4, false, false).unwrap();
        buf.overlay_put(ov, "field", Value::sym("O"));
        assert_eq!(buf.find_field(Some(3), false, None, None), Ok((2, 4)));
    }
}

// ============================================================================
// Field Contents
// ============================================================================

mod contents {
    use super::*;

    #[test]
    fn field_string_variants() {
        let mut buf = three_runs();
        assert_eq!(buf.field_string_no_properties(Some(2)).unwrap(), "name");
        let text = buf.field_string(Some(7)).unwrap();
        assert_eq!(text.as_str(), "valu");
        assert_eq!(text.get_text_property(0, "field"), Some(&Value::sym("B")));
    }

    #[test]
    fn delete_field_removes_only_the_field() {
        let mut buf = three_runs();
        buf.delete_field(Some(2)).unwrap();
        assert_eq!(buf.buffer_string_no_properties(), ":valu!");
    }
}

// ============================================================================
// Constrained Motion
// ============================================================================

mod motion {
    use super::*;

    #[test]
    fn constrain_stops_at_field_edge() {
        let mut buf = three_runs();
        assert_eq!(buf.constrain_to_field(Some(8), 3, false, false, None), 5);
        assert_eq!(buf.constrain_to_field(Some(2), 3, false, false, None), 2);
    }

    #[test]
    fn constrain_moves_point_without_new_pos() {
        let mut buf = three_runs();
        buf.goto_char(8);
        let pos = buf.constrain_to_field(None, 3, false, false, None);
        assert_eq!(pos, 5);
        assert_eq!(buf.point(), 5);
    }

    #[test]
    fn inhibit_field_text_motion_disables_constraint() {
        let mut buf = three_runs();
        buf.options_mut().inhibit_field_text_motion = true;
        assert_eq!(buf.constrain_to_field(Some(8), 3, false, false, None), 8);
    }

    #[test]
    fn line_positions_respect_fields() {
        let mut buf = Buffer::with_text("prompt", "> input");
        buf.put_text_property(1, 3, "field", Value::sym("prompt")).unwrap();
        buf.goto_char(6);
        assert_eq!(buf.pos_bol(1), 1);
        assert_eq!(buf.line_beginning_position(1), 3);
        assert_eq!(buf.line_end_position(1), 8);
    }
}
