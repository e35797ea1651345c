//! The execution model shared by the scanner, the HID link and the status LED.
//!
//! Each context is a [`Task`]: an initialisation step that may fail and is retried forever,
//! followed by a handler that is called in a loop until power-off.

use embassy_time::Timer;
use ftkb_common::globals::INIT_RETRY_MS;

#[cfg(feature = "defmt")]
pub trait TaskError: core::fmt::Debug + defmt::Format {}
#[cfg(feature = "defmt")]
impl<T: core::fmt::Debug + defmt::Format> TaskError for T {}

#[cfg(not(feature = "defmt"))]
pub trait TaskError: core::fmt::Debug {}
#[cfg(not(feature = "defmt"))]
impl<T: core::fmt::Debug> TaskError for T {}

#[allow(async_fn_in_trait)]
pub trait Task {
    const NAME: &'static str;

    type Error: TaskError;

    async fn init(&mut self) -> Result<(), Self::Error>;

    /// One pass of the task body. Must contain the task's suspension point.
    async fn handle(&mut self);
}

/// Runs `init` until it succeeds, waiting [`INIT_RETRY_MS`] between attempts. Returns the number
/// of failed attempts.
pub async fn start<T: Task>(task: &mut T) -> u32 {
    let mut failures = 0;
    while let Err(err) = task.init().await {
        failures += 1;
        crate::warn!("{} init failed: {:?}", T::NAME, err);
        Timer::after_millis(INIT_RETRY_MS).await;
    }
    crate::info!("{} init successful", T::NAME);
    failures
}

pub async fn run_task<T: Task>(mut task: T) -> ! {
    start(&mut task).await;
    loop {
        task.handle().await;
    }
}

#[cfg(test)]
#[path = "task_test.rs"]
mod test;
