//! The Keyboard-FT 15 × 6 layout.

use ftkb_common::keycodes::{consumer, key_code as kc, modifier};

use super::{Key, Layout};

pub const COLUMNS: usize = 15;
pub const ROWS: usize = 6;

pub const LAYER_COLUMN: usize = 1;
pub const LAYER_ROW: usize = 5;

pub type ReferenceLayout = Layout<COLUMNS, ROWS>;

#[rustfmt::skip]
const KEYS: [[Key; ROWS]; COLUMNS] = [
    [
        Key::code("ESCAPE", kc::ESCAPE),
        Key::code("GRAVE", kc::GRAVE),
        Key::code("TAB", kc::TAB),
        Key::code("CAPS_LOCK", kc::CAPS_LOCK),
        Key::modifier("LEFTSHIFT", modifier::LEFT_SHIFT),
        Key::modifier("LEFTCTRL", modifier::LEFT_CTRL),
    ],
    [
        Key::with_consumer("F1", kc::F1, consumer::MUTE),
        Key::code("1", kc::N1),
        Key::code("Q", kc::Q),
        Key::with_consumer("A", kc::A, consumer::SCAN_PREVIOUS),
        Key::code("EUROPE_2", kc::EUROPE_2),
        Key::layer_shift("FUNCTION"),
    ],
    [
        Key::with_consumer("F2", kc::F2, consumer::VOLUME_DECREMENT),
        Key::code("2", kc::N2),
        Key::code("W", kc::W),
        Key::with_consumer("S", kc::S, consumer::PLAY_PAUSE),
        Key::code("Z", kc::Z),
        Key::modifier("LEFTGUI", modifier::LEFT_GUI),
    ],
    [
        Key::with_consumer("F3", kc::F3, consumer::VOLUME_INCREMENT),
        Key::code("3", kc::N3),
        Key::code("E", kc::E),
        Key::with_consumer("D", kc::D, consumer::SCAN_NEXT),
        Key::code("X", kc::X),
        Key::modifier("LEFTALT", modifier::LEFT_ALT),
    ],
    [
        Key::with_consumer("F4", kc::F4, consumer::BRIGHTNESS_DECREMENT),
        Key::code("4", kc::N4),
        Key::code("R", kc::R),
        Key::code("F", kc::F),
        Key::code("C", kc::C),
        Key::empty("NONE"),
    ],
    [
        Key::with_consumer("F5", kc::F5, consumer::BRIGHTNESS_INCREMENT),
        Key::code("5", kc::N5),
        Key::code("T", kc::T),
        Key::code("G", kc::G),
        Key::code("V", kc::V),
        Key::empty("NONE"),
    ],
    [
        Key::code("F6", kc::F6),
        Key::code("6", kc::N6),
        Key::code("Y", kc::Y),
        Key::code("H", kc::H),
        Key::code("B", kc::B),
        Key::code("SPACE", kc::SPACE),
    ],
    [
        Key::code("F7", kc::F7),
        Key::code("7", kc::N7),
        Key::code("U", kc::U),
        Key::code("J", kc::J),
        Key::code("N", kc::N),
        Key::empty("NONE"),
    ],
    [
        Key::code("F8", kc::F8),
        Key::code("8", kc::N8),
        Key::code("I", kc::I),
        Key::code("K", kc::K),
        Key::code("M", kc::M),
        Key::modifier("RIGHTALT", modifier::RIGHT_ALT),
    ],
    [
        Key::code("F9", kc::F9),
        Key::code("9", kc::N9),
        Key::code("O", kc::O),
        Key::code("L", kc::L),
        Key::code("COMMA", kc::COMMA),
        Key::code("/?", kc::KANJI1),
    ],
    [
        Key::code("F10", kc::F10),
        Key::code("0", kc::N0),
        Key::code("P", kc::P),
        Key::code("SEMICOLON", kc::SEMICOLON),
        Key::code("PERIOD", kc::PERIOD),
        Key::modifier("RIGHTCTRL", modifier::RIGHT_CTRL),
    ],
    [
        Key::code("F11", kc::F11),
        Key::code("MINUS", kc::MINUS),
        Key::code("BRACKET_LEFT", kc::BRACKET_LEFT),
        Key::code("APOSTROPHE", kc::APOSTROPHE),
        Key::code("SLASH", kc::SLASH),
        Key::with_fn("ARROW_LEFT", kc::ARROW_LEFT, kc::HOME),
    ],
    [
        Key::code("F12", kc::F12),
        Key::code("EQUAL", kc::EQUAL),
        Key::code("BRACKET_RIGHT", kc::BRACKET_RIGHT),
        Key::empty("NONE"),
        Key::modifier("RIGHTSHIFT", modifier::RIGHT_SHIFT),
        Key::with_fn("ARROW_DOWN", kc::ARROW_DOWN, kc::PAGE_DOWN),
    ],
    [
        Key::code("PRINT_SCREEN", kc::PRINT_SCREEN),
        Key::empty("NONE"),
        Key::empty("NONE"),
        Key::empty("NONE"),
        Key::empty("NONE"),
        Key::empty("NONE"),
    ],
    [
        Key::code("DELETE", kc::DELETE),
        Key::code("BACKSPACE", kc::BACKSPACE),
        Key::code("BACKSLASH", kc::BACKSLASH),
        Key::code("ENTER", kc::ENTER),
        Key::with_fn("ARROW_UP", kc::ARROW_UP, kc::PAGE_UP),
        Key::with_fn("ARROW_RIGHT", kc::ARROW_RIGHT, kc::END),
    ],
];

pub const fn layout() -> ReferenceLayout {
    Layout::new(KEYS, LAYER_COLUMN, LAYER_ROW)
}
