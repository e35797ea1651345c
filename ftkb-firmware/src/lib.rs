#![no_std]
pub mod brightness_repeat;
pub mod exec;
pub mod hid;
pub mod key_reporter;
pub mod key_scanner;
pub mod layout;
pub mod report;
pub mod status_led;
pub mod task;
pub mod usb;

pub use exec::{Keyboard, KeyboardBuilder};

#[cfg(any(test, feature = "test-utils"))]
pub mod switch_test_stub;
#[cfg(test)]
pub mod time_driver_test_stub;
#[cfg(any(test, feature = "test-utils"))]
pub mod usb_test_stub;

#[macro_use]
mod macros;

#[cfg(test)]
#[path = "lib_test.rs"]
mod test;
