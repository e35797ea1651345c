use embassy_sync::{blocking_mutex::raw::RawMutex, channel::Channel};
use embassy_time::{with_timeout, Duration};
use ftkb_common::{globals::REPORT_KEY_MAX, keycodes::report_id};
use heapless::Vec;

/// Keyboard frame on the wire: report id, modifiers, reserved, six key codes.
pub const KEYBOARD_FRAME_LEN: usize = 9;
/// Consumer frame on the wire: report id, little-endian usage.
pub const CONSUMER_FRAME_LEN: usize = 3;

/// Snapshot of the keyboard produced by one dirty scan cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Report {
    keys: Vec<u8, REPORT_KEY_MAX>,
    modifiers: u8,
    consumer: u16,
}

impl Report {
    pub fn keys(&self) -> &[u8] {
        &self.keys
    }

    pub fn modifiers(&self) -> u8 {
        self.modifiers
    }

    pub fn consumer(&self) -> u16 {
        self.consumer
    }

    /// Appends `code` unless the report is already full. Returns `false` when the code was
    /// dropped.
    pub fn push_key(&mut self, code: u8) -> bool {
        self.keys.push(code).is_ok()
    }

    pub fn add_modifiers(&mut self, modifiers: u8) {
        self.modifiers |= modifiers;
    }

    pub fn set_consumer(&mut self, usage: u16) {
        self.consumer = usage;
    }

    pub fn keyboard_frame(&self) -> [u8; KEYBOARD_FRAME_LEN] {
        let mut frame = [0; KEYBOARD_FRAME_LEN];
        frame[0] = report_id::KEYBOARD;
        frame[1] = self.modifiers;
        frame[3..3 + self.keys.len()].copy_from_slice(&self.keys);
        frame
    }

    pub fn consumer_frame(&self) -> [u8; CONSUMER_FRAME_LEN] {
        let [lo, hi] = self.consumer.to_le_bytes();
        [report_id::CONSUMER, lo, hi]
    }
}

pub struct ReportChannel<M: RawMutex, const N: usize>(Channel<M, Report, N>);
impl<M: RawMutex, const N: usize> Default for ReportChannel<M, N> {
    fn default() -> Self {
        Self(Channel::new())
    }
}
impl<M: RawMutex, const N: usize> ReportChannel<M, N> {
    /// Waits at most `timeout` for the next report.
    pub async fn receive_timeout(&self, timeout: Duration) -> Option<Report> {
        with_timeout(timeout, self.0.receive()).await.ok()
    }

    /// Queues `report` without waiting. A full queue drops it and returns `false`.
    pub fn try_send(&self, report: Report) -> bool {
        self.0.try_send(report).is_ok()
    }

    pub fn try_receive(&self) -> Option<Report> {
        self.0.try_receive().ok()
    }
}

#[cfg(test)]
#[path = "report_test.rs"]
mod test;
