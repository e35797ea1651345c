//! Timing and sizing constants shared by the firmware tasks.

/// Pause between two full matrix sweeps.
pub const SCAN_PERIOD_MS: u64 = 5;
/// Time given to the row inputs to follow a freshly asserted column strobe.
pub const STROBE_SETTLE_US: u32 = 1;

/// How long the HID link waits for a report before polling the transport state.
pub const LINK_POLL_MS: u64 = 10;

/// Delay between two attempts at initialising a task.
pub const INIT_RETRY_MS: u64 = 100;

/// Reports the scanner may queue before new ones are dropped.
pub const REPORT_QUEUE_DEPTH: usize = 10;
/// Status commands are mode selectors, so one pending command is enough.
pub const STATUS_QUEUE_DEPTH: usize = 1;

/// Maximum non-modifier keys in a keyboard report.
pub const REPORT_KEY_MAX: usize = 6;

pub const BRIGHTNESS_INDEX_MAX: u8 = 7;
pub const BRIGHTNESS_INDEX_DEFAULT: u8 = 2;
/// Interval between brightness steps while a brightness key is held.
pub const BRIGHTNESS_REPEAT_MS: u64 = 200;

/// Blink half-period while searching for a bluetooth host.
pub const BLINK_PERIOD_MS: u64 = 250;
/// Rainbow frame time is this divided by the current brightness.
pub const RAINBOW_PERIOD_MS: u64 = 160;

/// Brightness value for a brightness index: `2^(index+1) - 1`.
///
/// ```
/// use ftkb_common::globals::brightness_value;
/// assert_eq!(brightness_value(0), 1);
/// assert_eq!(brightness_value(2), 7);
/// assert_eq!(brightness_value(7), 255);
/// ```
pub const fn brightness_value(index: u8) -> u8 {
    let index = if index > BRIGHTNESS_INDEX_MAX {
        BRIGHTNESS_INDEX_MAX
    } else {
        index
    };
    ((1u16 << (index + 1)) - 1) as u8
}
