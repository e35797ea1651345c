use core::convert::Infallible;

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Duration, Ticker};
use ftkb_common::globals::BRIGHTNESS_REPEAT_MS;

use crate::{
    status_led::{BrightnessStep, StatusChannel, StatusCommand},
    task::Task,
};

/// Sends a brightness step when a brightness key goes down and again every
/// [`BRIGHTNESS_REPEAT_MS`] until it is released.
pub struct BrightnessRepeat<'c, M: RawMutex> {
    channel: &'c StatusChannel<M>,
    held: Option<BrightnessStep>,
    ticker: Ticker,
}

impl<'c, M: RawMutex> BrightnessRepeat<'c, M> {
    pub fn new(channel: &'c StatusChannel<M>) -> Self {
        Self {
            channel,
            held: None,
            ticker: Ticker::every(Duration::from_millis(BRIGHTNESS_REPEAT_MS)),
        }
    }

    pub fn held(&self) -> Option<BrightnessStep> {
        self.held
    }

    fn step(&self, step: BrightnessStep) {
        if !self.channel.try_send(StatusCommand::Brightness(step)) {
            crate::debug!("status queue full, dropped {:?}", step);
        }
    }

    fn hold(&mut self, held: Option<BrightnessStep>) {
        if held == self.held {
            return;
        }
        self.held = held;
        if let Some(step) = held {
            self.ticker.reset();
            self.step(step);
        }
    }
}

impl<M: RawMutex> Task for BrightnessRepeat<'_, M> {
    const NAME: &'static str = "BrightnessTask";

    type Error = Infallible;

    async fn init(&mut self) -> Result<(), Self::Error> {
        self.held = None;
        Ok(())
    }

    async fn handle(&mut self) {
        let channel = self.channel;
        let held = match self.held {
            None => channel.brightness_hold().await,
            Some(step) => match select(channel.brightness_hold(), self.ticker.next()).await {
                Either::First(held) => held,
                Either::Second(()) => {
                    self.step(step);
                    return;
                }
            },
        };
        self.hold(held);
    }
}

#[cfg(test)]
#[path = "brightness_repeat_test.rs"]
mod test;
