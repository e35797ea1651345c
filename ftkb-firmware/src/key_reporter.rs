use core::convert::Infallible;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::Duration;
use embassy_usb::driver::EndpointIn;
use ftkb_common::{globals::LINK_POLL_MS, keycodes::consumer};

use crate::{
    hid::HidWriter,
    report::{Report, ReportChannel, KEYBOARD_FRAME_LEN},
    status_led::{BrightnessStep, DisplayMode, StatusChannel},
    task::Task,
    warn,
};

/// Whether the host transport can currently take reports.
pub trait LinkState {
    fn is_ready(&self) -> bool;
}

impl LinkState for AtomicBool {
    fn is_ready(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

/// Turns queued [`Report`]s into HID frames and keeps the status LED in step with the host link.
pub struct Reporter<'c, E: EndpointIn, L: LinkState, M: RawMutex, const QS: usize> {
    hid_writer: HidWriter<E, KEYBOARD_FRAME_LEN>,
    link: &'c L,
    reports: &'c ReportChannel<M, QS>,
    status: &'c StatusChannel<M>,
    was_ready: bool,
    last_consumer: u16,
    brightness_hold: Option<BrightnessStep>,
}

impl<'c, E: EndpointIn, L: LinkState, M: RawMutex, const QS: usize> Reporter<'c, E, L, M, QS> {
    pub fn new(
        hid_writer: HidWriter<E, KEYBOARD_FRAME_LEN>,
        link: &'c L,
        reports: &'c ReportChannel<M, QS>,
        status: &'c StatusChannel<M>,
    ) -> Self {
        Self {
            hid_writer,
            link,
            reports,
            status,
            was_ready: false,
            last_consumer: 0,
            brightness_hold: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.was_ready
    }

    /// Waits a short while for a report, then follows the link state and forwards the report if
    /// the host can take it.
    pub async fn poll(&mut self) {
        let report = self
            .reports
            .receive_timeout(Duration::from_millis(LINK_POLL_MS))
            .await;

        let ready = self.check_link();

        if let Some(report) = report {
            self.follow_brightness_keys(&report);
            if ready {
                self.report(&report).await;
            } else {
                crate::debug!("host not ready, dropped {:?}", &report);
            }
        }
    }

    /// Tells the status LED about link transitions. A transition whose command could not be
    /// queued is tried again on the next poll.
    fn check_link(&mut self) -> bool {
        let ready = self.link.is_ready();
        if ready == self.was_ready {
            return ready;
        }

        let sent = if ready {
            self.status.mode() != DisplayMode::NOT_CONNECTED || self.status.set_mode(DisplayMode::Usb)
        } else {
            self.status.set_mode(DisplayMode::NOT_CONNECTED)
        };

        if sent {
            crate::info!("host link {}", if ready { "up" } else { "down" });
            self.was_ready = ready;
        }
        ready
    }

    /// The brightness consumer usages also step the status LED for as long as they are held,
    /// whether or not a host is attached.
    fn follow_brightness_keys(&mut self, report: &Report) {
        let held = match report.consumer() {
            consumer::BRIGHTNESS_INCREMENT => Some(BrightnessStep::Increase),
            consumer::BRIGHTNESS_DECREMENT => Some(BrightnessStep::Decrease),
            _ => None,
        };
        if held != self.brightness_hold {
            self.brightness_hold = held;
            self.status.hold_brightness(held);
        }
    }

    /// Writes one frame for `report`. A changed consumer usage takes the whole cycle; the keyboard
    /// frame for the same report is not sent.
    pub async fn report(&mut self, report: &Report) {
        let res = if report.consumer() != self.last_consumer {
            self.last_consumer = report.consumer();
            self.hid_writer.write(&report.consumer_frame()).await
        } else {
            self.hid_writer.write(&report.keyboard_frame()).await
        };

        if let Err(e) = res {
            warn!("Failed to send report: {:?}", e);
        }
    }
}

impl<E: EndpointIn, L: LinkState, M: RawMutex, const QS: usize> Task
    for Reporter<'_, E, L, M, QS>
{
    const NAME: &'static str = "HidLinkTask";

    type Error = Infallible;

    async fn init(&mut self) -> Result<(), Self::Error> {
        self.was_ready = false;
        self.last_consumer = 0;
        self.brightness_hold = None;
        Ok(())
    }

    async fn handle(&mut self) {
        self.poll().await;
    }
}

#[cfg(test)]
#[path = "key_reporter_test.rs"]
mod test;
