use ftkb_common::keycodes::{consumer, key_code as kc, modifier};

use super::reference::{self, ReferenceLayout};
use super::*;

macro_rules! press {
    ($layout:ident, $($col:expr, $row:expr);+) => {{
        $(assert!($layout.key_mut($col, $row).unwrap().set_pressed(true));)+
    }};
}

macro_rules! release {
    ($layout:ident, $($col:expr, $row:expr);+) => {{
        $(assert!($layout.key_mut($col, $row).unwrap().set_pressed(false));)+
    }};
}

const A: (usize, usize) = (1, 3);
const LEFT_SHIFT: (usize, usize) = (0, 4);
const FUNCTION: (usize, usize) = (reference::LAYER_COLUMN, reference::LAYER_ROW);

fn layout() -> ReferenceLayout {
    reference::layout()
}

#[test]
fn nothing_pressed() {
    let layout = layout();
    assert_eq!(layout.report(), Report::default());
    assert!(!layout.is_layer_active());
}

#[test]
fn single_key() {
    let mut layout = layout();
    press!(layout, A.0, A.1);

    let report = layout.report();
    assert_eq!(report.keys(), &[kc::A]);
    assert_eq!(report.modifiers(), 0);
    assert_eq!(report.consumer(), 0);
}

#[test]
fn shift_and_key() {
    let mut layout = layout();
    press!(layout, LEFT_SHIFT.0, LEFT_SHIFT.1; A.0, A.1);

    let report = layout.report();
    assert_eq!(report.keys(), &[kc::A]);
    assert_eq!(report.modifiers(), modifier::LEFT_SHIFT);
}

#[test]
fn modifier_mask_is_or_of_pressed_modifiers() {
    let mut layout = layout();
    // LEFTCTRL, LEFTGUI, RIGHTSHIFT and the space bar
    press!(layout, 0, 5; 2, 5; 12, 4; 6, 5);

    let report = layout.report();
    assert_eq!(
        report.modifiers(),
        modifier::LEFT_CTRL | modifier::LEFT_GUI | modifier::RIGHT_SHIFT
    );
    assert_eq!(report.keys(), &[kc::SPACE]);

    release!(layout, 2, 5);
    assert_eq!(
        layout.report().modifiers(),
        modifier::LEFT_CTRL | modifier::RIGHT_SHIFT
    );
}

#[test]
fn press_then_release() {
    let mut layout = layout();
    press!(layout, LEFT_SHIFT.0, LEFT_SHIFT.1; A.0, A.1; 2, 2);
    assert_eq!(layout.report().keys(), &[kc::A, kc::W]);

    release!(layout, A.0, A.1);
    let report = layout.report();
    assert_eq!(report.keys(), &[kc::W]);
    assert_eq!(report.modifiers(), modifier::LEFT_SHIFT);
}

#[test]
fn seven_keys_truncate_to_six() {
    let mut layout = layout();
    press!(layout, 0, 0; 0, 1; 0, 2; 0, 3; 1, 0; 1, 1; 1, 2);

    let report = layout.report();
    assert_eq!(
        report.keys(),
        &[kc::ESCAPE, kc::GRAVE, kc::TAB, kc::CAPS_LOCK, kc::F1, kc::N1]
    );
}

#[test]
fn modifiers_do_not_take_key_slots() {
    let mut layout = layout();
    press!(layout, 0, 0; 0, 1; 0, 2; 0, 3; 0, 4; 0, 5; 1, 0; 1, 1);

    let report = layout.report();
    assert_eq!(report.keys().len(), 6);
    assert_eq!(
        report.modifiers(),
        modifier::LEFT_SHIFT | modifier::LEFT_CTRL
    );
}

#[test]
fn layer_shift_uses_fn_code() {
    let mut layout = layout();
    press!(layout, FUNCTION.0, FUNCTION.1; 11, 5; 14, 4);
    assert!(layout.is_layer_active());

    let report = layout.report();
    assert_eq!(report.keys(), &[kc::HOME, kc::PAGE_UP]);
    assert_eq!(report.consumer(), 0);

    release!(layout, FUNCTION.0, FUNCTION.1);
    assert_eq!(layout.report().keys(), &[kc::ARROW_LEFT, kc::ARROW_UP]);
}

#[test]
fn layer_shift_consumer_key() {
    let mut layout = layout();
    press!(layout, FUNCTION.0, FUNCTION.1; 2, 0);

    let report = layout.report();
    assert!(report.keys().is_empty());
    assert_eq!(report.consumer(), consumer::VOLUME_DECREMENT);

    release!(layout, FUNCTION.0, FUNCTION.1);
    let report = layout.report();
    assert_eq!(report.keys(), &[kc::F2]);
    assert_eq!(report.consumer(), 0);
}

#[test]
fn layer_shift_falls_back_to_hid_code() {
    let mut layout = layout();
    press!(layout, FUNCTION.0, FUNCTION.1; 1, 2);

    assert_eq!(layout.report().keys(), &[kc::Q]);
}

#[test]
fn layer_shift_alone_reports_nothing() {
    let mut layout = layout();
    press!(layout, FUNCTION.0, FUNCTION.1);

    assert_eq!(layout.report(), Report::default());
}

#[test]
fn empty_cells_report_nothing() {
    let mut layout = layout();
    press!(layout, 13, 1; 4, 5);

    assert_eq!(layout.report(), Report::default());
}

#[test]
fn set_pressed_reports_change() {
    let mut key = Key::code("A", kc::A);
    assert!(!key.set_pressed(false));
    assert!(key.set_pressed(true));
    assert!(!key.set_pressed(true));
    assert!(key.is_pressed());
    assert_eq!(key.hid_code(), kc::A);
    assert_eq!(Key::modifier("LS", modifier::LEFT_SHIFT).hid_code(), 0);
}

#[test]
fn release_all() {
    let mut layout = layout();
    press!(layout, A.0, A.1; FUNCTION.0, FUNCTION.1);
    layout.release_all();

    assert_eq!(layout.report(), Report::default());
    assert!(!layout.is_layer_active());
}

#[test]
fn every_cell_has_one_kind() {
    let layout = layout();
    for col in 0..reference::COLUMNS {
        for row in 0..reference::ROWS {
            let key = layout.key(col, row).unwrap();
            match key.kind() {
                KeyKind::Code { hid, .. } => assert_ne!(hid, 0, "{}", key.label()),
                KeyKind::Modifier(bit) => assert_eq!(bit.count_ones(), 1, "{}", key.label()),
                KeyKind::LayerShift => assert_eq!((col, row), FUNCTION),
                KeyKind::Empty => {}
            }
        }
    }
    assert!(layout.key(reference::COLUMNS, 0).is_none());
}
