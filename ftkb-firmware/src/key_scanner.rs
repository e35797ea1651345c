use core::convert::Infallible;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::Timer;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal_async::delay::DelayNs;
use ftkb_common::globals::{SCAN_PERIOD_MS, STROBE_SETTLE_US};

use crate::{
    layout::Layout,
    report::{Report, ReportChannel},
    task::Task,
};

/// Strobes one column at a time and turns switch changes into [`Report`]s.
pub struct KeyScanner<
    'c,
    I: InputPin,
    O: OutputPin,
    D: DelayNs,
    M: RawMutex,
    const COLS: usize,
    const ROWS: usize,
    const QS: usize,
> {
    channel: &'c ReportChannel<M, QS>,

    row_pins: [I; ROWS],
    column_pins: [O; COLS],

    /// Wait between asserting a column and sampling its rows.
    settle: D,

    layout: Layout<COLS, ROWS>,
}

impl<
        'c,
        I: InputPin,
        O: OutputPin,
        D: DelayNs,
        M: RawMutex,
        const COLS: usize,
        const ROWS: usize,
        const QS: usize,
    > KeyScanner<'c, I, O, D, M, COLS, ROWS, QS>
{
    pub fn new(
        row_pins: [I; ROWS],
        column_pins: [O; COLS],
        settle: D,
        layout: Layout<COLS, ROWS>,
        channel: &'c ReportChannel<M, QS>,
    ) -> Self {
        Self {
            channel,
            row_pins,
            column_pins,
            settle,
            layout,
        }
    }

    pub fn layout(&self) -> &Layout<COLS, ROWS> {
        &self.layout
    }

    /// One full sweep. Returns `true` if any key changed state.
    pub async fn scan(&mut self) -> bool {
        let mut dirty = false;

        for (column, (strobe, keys)) in self
            .column_pins
            .iter_mut()
            .zip(self.layout.columns_mut())
            .enumerate()
        {
            let _ = strobe.set_high();
            self.settle.delay_us(STROBE_SETTLE_US).await;

            for (row, (input, key)) in self.row_pins.iter_mut().zip(keys.iter_mut()).enumerate() {
                let is_down = input.is_high().unwrap_or(false);
                if key.set_pressed(is_down) {
                    dirty = true;
                    crate::debug!(
                        "{} has been {}. code = {}. row = {}, column = {}",
                        key.label(),
                        if is_down { "pressed" } else { "released" },
                        key.hid_code(),
                        row,
                        column
                    );
                }
            }

            let _ = strobe.set_low();
        }

        dirty
    }

    /// Scans once and queues a report if anything changed. A full queue drops the report; the
    /// next change carries the whole keyboard state again.
    pub async fn scan_and_report(&mut self) -> Option<Report> {
        if !self.scan().await {
            return None;
        }
        let report = self.layout.report();
        if !self.channel.try_send(report.clone()) {
            crate::debug!("report queue full, dropped {:?}", &report);
        }
        Some(report)
    }
}

impl<
        I: InputPin,
        O: OutputPin,
        D: DelayNs,
        M: RawMutex,
        const COLS: usize,
        const ROWS: usize,
        const QS: usize,
    > Task for KeyScanner<'_, I, O, D, M, COLS, ROWS, QS>
{
    const NAME: &'static str = "MatrixTask";

    type Error = Infallible;

    async fn init(&mut self) -> Result<(), Self::Error> {
        for strobe in self.column_pins.iter_mut() {
            let _ = strobe.set_low();
        }
        self.layout.release_all();
        Ok(())
    }

    async fn handle(&mut self) {
        self.scan_and_report().await;
        Timer::after_millis(SCAN_PERIOD_MS).await;
    }
}

#[cfg(test)]
#[path = "key_scanner_test.rs"]
mod test;
