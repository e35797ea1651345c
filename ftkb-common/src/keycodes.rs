/// Keyboard/Keypad page (0x07) usages used by the Keyboard-FT layouts.
pub mod key_code {
    pub const NONE: u8 = 0x00;

    pub const A: u8 = 0x04;
    pub const B: u8 = 0x05;
    pub const C: u8 = 0x06;
    pub const D: u8 = 0x07;
    pub const E: u8 = 0x08;
    pub const F: u8 = 0x09;
    pub const G: u8 = 0x0a;
    pub const H: u8 = 0x0b;
    pub const I: u8 = 0x0c;
    pub const J: u8 = 0x0d;
    pub const K: u8 = 0x0e;
    pub const L: u8 = 0x0f;
    pub const M: u8 = 0x10;
    pub const N: u8 = 0x11;
    pub const O: u8 = 0x12;
    pub const P: u8 = 0x13;
    pub const Q: u8 = 0x14;
    pub const R: u8 = 0x15;
    pub const S: u8 = 0x16;
    pub const T: u8 = 0x17;
    pub const U: u8 = 0x18;
    pub const V: u8 = 0x19;
    pub const W: u8 = 0x1a;
    pub const X: u8 = 0x1b;
    pub const Y: u8 = 0x1c;
    pub const Z: u8 = 0x1d;

    pub const N1: u8 = 0x1e;
    pub const N2: u8 = 0x1f;
    pub const N3: u8 = 0x20;
    pub const N4: u8 = 0x21;
    pub const N5: u8 = 0x22;
    pub const N6: u8 = 0x23;
    pub const N7: u8 = 0x24;
    pub const N8: u8 = 0x25;
    pub const N9: u8 = 0x26;
    pub const N0: u8 = 0x27;

    pub const ENTER: u8 = 0x28;
    pub const ESCAPE: u8 = 0x29;
    pub const BACKSPACE: u8 = 0x2a;
    pub const TAB: u8 = 0x2b;
    pub const SPACE: u8 = 0x2c;
    pub const MINUS: u8 = 0x2d;
    pub const EQUAL: u8 = 0x2e;
    pub const BRACKET_LEFT: u8 = 0x2f;
    pub const BRACKET_RIGHT: u8 = 0x30;
    pub const BACKSLASH: u8 = 0x31;
    pub const SEMICOLON: u8 = 0x33;
    pub const APOSTROPHE: u8 = 0x34;
    pub const GRAVE: u8 = 0x35;
    pub const COMMA: u8 = 0x36;
    pub const PERIOD: u8 = 0x37;
    pub const SLASH: u8 = 0x38;
    pub const CAPS_LOCK: u8 = 0x39;

    pub const F1: u8 = 0x3a;
    pub const F2: u8 = 0x3b;
    pub const F3: u8 = 0x3c;
    pub const F4: u8 = 0x3d;
    pub const F5: u8 = 0x3e;
    pub const F6: u8 = 0x3f;
    pub const F7: u8 = 0x40;
    pub const F8: u8 = 0x41;
    pub const F9: u8 = 0x42;
    pub const F10: u8 = 0x43;
    pub const F11: u8 = 0x44;
    pub const F12: u8 = 0x45;

    pub const PRINT_SCREEN: u8 = 0x46;
    pub const HOME: u8 = 0x4a;
    pub const PAGE_UP: u8 = 0x4b;
    pub const DELETE: u8 = 0x4c;
    pub const END: u8 = 0x4d;
    pub const PAGE_DOWN: u8 = 0x4e;
    pub const ARROW_RIGHT: u8 = 0x4f;
    pub const ARROW_LEFT: u8 = 0x50;
    pub const ARROW_DOWN: u8 = 0x51;
    pub const ARROW_UP: u8 = 0x52;

    pub const EUROPE_2: u8 = 0x64;
    pub const KANJI1: u8 = 0x87;
}

/// Bits of the modifier byte in a keyboard report.
pub mod modifier {
    pub const LEFT_CTRL: u8 = 1 << 0;
    pub const LEFT_SHIFT: u8 = 1 << 1;
    pub const LEFT_ALT: u8 = 1 << 2;
    pub const LEFT_GUI: u8 = 1 << 3;
    pub const RIGHT_CTRL: u8 = 1 << 4;
    pub const RIGHT_SHIFT: u8 = 1 << 5;
    pub const RIGHT_ALT: u8 = 1 << 6;
    pub const RIGHT_GUI: u8 = 1 << 7;
}

/// Consumer page (0x0c) usages.
pub mod consumer {
    pub const NONE: u16 = 0x0000;
    pub const BRIGHTNESS_INCREMENT: u16 = 0x006f;
    pub const BRIGHTNESS_DECREMENT: u16 = 0x0070;
    pub const SCAN_NEXT: u16 = 0x00b5;
    pub const SCAN_PREVIOUS: u16 = 0x00b6;
    pub const PLAY_PAUSE: u16 = 0x00cd;
    pub const MUTE: u16 = 0x00e2;
    pub const VOLUME_INCREMENT: u16 = 0x00e9;
    pub const VOLUME_DECREMENT: u16 = 0x00ea;
}

/// Bits of the keyboard LED output report.
pub mod led {
    pub const NUM_LOCK: u8 = 1 << 0;
    pub const CAPS_LOCK: u8 = 1 << 1;
    pub const SCROLL_LOCK: u8 = 1 << 2;
}

/// HID report ids used on the shared interface.
pub mod report_id {
    pub const KEYBOARD: u8 = 1;
    pub const CONSUMER: u8 = 3;
}
