use crate::report::Report;

pub mod reference;

/// What a matrix cell does when its switch is closed. A cell has exactly one kind, so a key is
/// never both a modifier and a coded key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyKind {
    /// Unpopulated cell.
    Empty,
    /// Regular key. `fn_code` and `fn_consumer` are the alternates used while the layer-shift
    /// key is held; zero means no alternate.
    Code {
        hid: u8,
        fn_code: u8,
        fn_consumer: u16,
    },
    /// Modifier contributing `bit` to the report's modifier byte.
    Modifier(u8),
    /// Activates the alternate codes of every other key while held.
    LayerShift,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Key {
    label: &'static str,
    kind: KeyKind,
    pressed: bool,
}

impl Key {
    pub const fn new(label: &'static str, kind: KeyKind) -> Self {
        Self {
            label,
            kind,
            pressed: false,
        }
    }

    pub const fn empty(label: &'static str) -> Self {
        Self::new(label, KeyKind::Empty)
    }

    pub const fn code(label: &'static str, hid: u8) -> Self {
        Self::new(
            label,
            KeyKind::Code {
                hid,
                fn_code: 0,
                fn_consumer: 0,
            },
        )
    }

    pub const fn with_fn(label: &'static str, hid: u8, fn_code: u8) -> Self {
        Self::new(
            label,
            KeyKind::Code {
                hid,
                fn_code,
                fn_consumer: 0,
            },
        )
    }

    pub const fn with_consumer(label: &'static str, hid: u8, fn_consumer: u16) -> Self {
        Self::new(
            label,
            KeyKind::Code {
                hid,
                fn_code: 0,
                fn_consumer,
            },
        )
    }

    pub const fn modifier(label: &'static str, bit: u8) -> Self {
        Self::new(label, KeyKind::Modifier(bit))
    }

    pub const fn layer_shift(label: &'static str) -> Self {
        Self::new(label, KeyKind::LayerShift)
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn kind(&self) -> KeyKind {
        self.kind
    }

    /// Primary code, zero for anything but a coded key.
    pub fn hid_code(&self) -> u8 {
        match self.kind {
            KeyKind::Code { hid, .. } => hid,
            _ => 0,
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Records the switch position. Returns `true` when it differs from the stored one.
    pub fn set_pressed(&mut self, pressed: bool) -> bool {
        let changed = self.pressed != pressed;
        self.pressed = pressed;
        changed
    }

    fn resolve(&self, layer_active: bool, report: &mut Report) {
        match self.kind {
            KeyKind::Modifier(bit) => report.add_modifiers(bit),
            KeyKind::Code {
                hid,
                fn_code,
                fn_consumer,
            } => {
                if !layer_active {
                    if hid != 0 {
                        report.push_key(hid);
                    }
                } else if fn_code != 0 {
                    report.push_key(fn_code);
                } else if fn_consumer != 0 {
                    report.set_consumer(fn_consumer);
                } else if hid != 0 {
                    report.push_key(hid);
                }
            }
            KeyKind::Empty | KeyKind::LayerShift => {}
        }
    }
}

/// Key grid addressed by `(column, row)`, with the layer-shift key at a fixed cell.
#[derive(Debug, Clone)]
pub struct Layout<const COLS: usize, const ROWS: usize> {
    keys: [[Key; ROWS]; COLS],
    layer_column: usize,
    layer_row: usize,
}

impl<const COLS: usize, const ROWS: usize> Layout<COLS, ROWS> {
    pub const fn new(keys: [[Key; ROWS]; COLS], layer_column: usize, layer_row: usize) -> Self {
        assert!(layer_column < COLS && layer_row < ROWS);
        Self {
            keys,
            layer_column,
            layer_row,
        }
    }

    pub fn key(&self, column: usize, row: usize) -> Option<&Key> {
        self.keys.get(column).and_then(|c| c.get(row))
    }

    pub fn key_mut(&mut self, column: usize, row: usize) -> Option<&mut Key> {
        self.keys.get_mut(column).and_then(|c| c.get_mut(row))
    }

    pub(crate) fn columns_mut(&mut self) -> core::slice::IterMut<'_, [Key; ROWS]> {
        self.keys.iter_mut()
    }

    pub fn is_layer_active(&self) -> bool {
        self.keys[self.layer_column][self.layer_row].pressed
    }

    /// Builds the report for the currently pressed keys, in scan order. Codes past the sixth are
    /// dropped.
    pub fn report(&self) -> Report {
        let layer_active = self.is_layer_active();
        let mut report = Report::default();

        for key in self.keys.iter().flatten().filter(|k| k.pressed) {
            key.resolve(layer_active, &mut report);
        }

        report
    }

    pub fn release_all(&mut self) {
        self.keys
            .iter_mut()
            .flatten()
            .for_each(|k| k.pressed = false);
    }
}

#[cfg(test)]
#[path = "layout_test.rs"]
mod test;
