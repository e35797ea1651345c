use core::sync::atomic::{AtomicU8, Ordering};

use embassy_sync::{blocking_mutex::raw::RawMutex, channel::Channel, signal::Signal};
use embassy_time::{with_timeout, Duration};
use embedded_hal::digital::OutputPin;
use ftkb_common::globals::{
    brightness_value, BLINK_PERIOD_MS, BRIGHTNESS_INDEX_DEFAULT, BRIGHTNESS_INDEX_MAX,
    RAINBOW_PERIOD_MS, STATUS_QUEUE_DEPTH,
};
use smart_leds::{SmartLedsWrite, RGB8};

use crate::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DisplayMode {
    CapsOnUsb = 0,
    CapsOnBle,
    Usb,
    BluetoothSearching,
    BluetoothConnected,
    /// Start-up animation, also shown while no host is attached.
    Rainbow,
    Error,
}

impl DisplayMode {
    pub const NOT_CONNECTED: Self = Self::Rainbow;

    const ALL: [Self; 7] = [
        Self::CapsOnUsb,
        Self::CapsOnBle,
        Self::Usb,
        Self::BluetoothSearching,
        Self::BluetoothConnected,
        Self::Rainbow,
        Self::Error,
    ];

    fn from_u8(value: u8) -> Self {
        Self::ALL
            .get(value as usize)
            .copied()
            .unwrap_or(Self::Error)
    }

    fn behaviour(self) -> &'static Behaviour {
        &MODE_TABLE[self as usize]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BrightnessStep {
    Increase,
    Decrease,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatusCommand {
    Mode(DisplayMode),
    Brightness(BrightnessStep),
}

/// Colour with each channel either off (0) or on (1), scaled by the brightness when rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Tint(u8, u8, u8);

impl Tint {
    const RED: Self = Self(1, 0, 0);
    const GREEN: Self = Self(0, 1, 0);
    const BLUE: Self = Self(0, 0, 1);
    const YELLOW: Self = Self(1, 1, 0);
    const MAGENTA: Self = Self(1, 0, 1);

    fn scale(self, brightness: u8) -> RGB8 {
        RGB8::new(
            self.0 * brightness,
            self.1 * brightness,
            self.2 * brightness,
        )
    }
}

enum Behaviour {
    Solid { tint: Tint, caps: bool },
    Blink { on: Tint, off: Tint },
    Rainbow,
}

impl Behaviour {
    /// How long to wait for a command before rendering again. `None` waits forever.
    fn wait(&self, brightness: u8) -> Option<Duration> {
        match self {
            Behaviour::Solid { .. } => None,
            Behaviour::Blink { .. } => Some(Duration::from_millis(BLINK_PERIOD_MS)),
            Behaviour::Rainbow => Some(Duration::from_micros(
                RAINBOW_PERIOD_MS * 1000 / brightness.max(1) as u64,
            )),
        }
    }
}

/// Indexed by `DisplayMode as usize`.
static MODE_TABLE: [Behaviour; 7] = [
    Behaviour::Solid {
        tint: Tint::YELLOW,
        caps: true,
    },
    Behaviour::Solid {
        tint: Tint::MAGENTA,
        caps: true,
    },
    Behaviour::Solid {
        tint: Tint::GREEN,
        caps: false,
    },
    Behaviour::Blink {
        on: Tint::BLUE,
        off: Tint::RED,
    },
    Behaviour::Solid {
        tint: Tint::BLUE,
        caps: false,
    },
    Behaviour::Rainbow,
    Behaviour::Solid {
        tint: Tint::RED,
        caps: false,
    },
];

/// Command queue to the status LED plus the mode it is currently showing.
pub struct StatusChannel<M: RawMutex> {
    channel: Channel<M, StatusCommand, STATUS_QUEUE_DEPTH>,
    mode: AtomicU8,
    brightness_hold: Signal<M, Option<BrightnessStep>>,
}
impl<M: RawMutex> Default for StatusChannel<M> {
    fn default() -> Self {
        Self::new()
    }
}
impl<M: RawMutex> StatusChannel<M> {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
            mode: AtomicU8::new(DisplayMode::Rainbow as u8),
            brightness_hold: Signal::new(),
        }
    }

    /// Queues `command` without waiting. Returns `false` if a command is already pending.
    pub fn try_send(&self, command: StatusCommand) -> bool {
        self.channel.try_send(command).is_ok()
    }

    pub fn set_mode(&self, mode: DisplayMode) -> bool {
        self.try_send(StatusCommand::Mode(mode))
    }

    /// Starts or stops repeating [`BrightnessStep::Increase`]. Releasing stops either direction.
    pub fn increase_brightness(&self, held: bool) {
        self.hold_brightness(held.then_some(BrightnessStep::Increase));
    }

    pub fn decrease_brightness(&self, held: bool) {
        self.hold_brightness(held.then_some(BrightnessStep::Decrease));
    }

    /// Sets the brightness step repeated by [`BrightnessRepeat`](crate::brightness_repeat::BrightnessRepeat),
    /// `None` for none. Only the latest value is kept.
    pub fn hold_brightness(&self, step: Option<BrightnessStep>) {
        self.brightness_hold.signal(step);
    }

    pub(crate) async fn brightness_hold(&self) -> Option<BrightnessStep> {
        self.brightness_hold.wait().await
    }

    /// The mode the status LED is showing.
    pub fn mode(&self) -> DisplayMode {
        DisplayMode::from_u8(self.mode.load(Ordering::Relaxed))
    }

    /// Only [`StatusLed`] writes the mode.
    pub(crate) fn publish_mode(&self, mode: DisplayMode) {
        self.mode.store(mode as u8, Ordering::Relaxed);
    }

    /// Waits up to `timeout` for a command, or forever when `timeout` is `None`.
    pub async fn receive_timeout(&self, timeout: Option<Duration>) -> Option<StatusCommand> {
        match timeout {
            Some(timeout) => with_timeout(timeout, self.channel.receive()).await.ok(),
            None => Some(self.channel.receive().await),
        }
    }

    pub fn try_receive(&self) -> Option<StatusCommand> {
        self.channel.try_receive().ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Brightness {
    index: u8,
}
impl Default for Brightness {
    fn default() -> Self {
        Self {
            index: BRIGHTNESS_INDEX_DEFAULT,
        }
    }
}
impl Brightness {
    pub fn index(&self) -> u8 {
        self.index
    }

    pub fn value(&self) -> u8 {
        brightness_value(self.index)
    }

    pub fn step(&mut self, step: BrightnessStep) {
        self.index = match step {
            BrightnessStep::Increase => (self.index + 1).min(BRIGHTNESS_INDEX_MAX),
            BrightnessStep::Decrease => self.index.saturating_sub(1),
        };
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RainbowPhase {
    /// Red fades in from black; only shown once per entry into the animation.
    RampIn,
    RedToGreen,
    GreenToBlue,
    BlueToRed,
}

/// Hue ramp advanced one step per frame; each phase lasts `max` frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rainbow {
    phase: RainbowPhase,
    level: u8,
}
impl Default for Rainbow {
    fn default() -> Self {
        Self {
            phase: RainbowPhase::RampIn,
            level: 0,
        }
    }
}
impl Rainbow {
    pub fn phase(&self) -> RainbowPhase {
        self.phase
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    fn restart_level(&mut self) {
        self.level = 0;
    }

    /// Colour for the current frame, then moves to the next one.
    pub fn next_color(&mut self, max: u8) -> RGB8 {
        let level = self.level.min(max);
        let fade = max - level;
        let color = match self.phase {
            RainbowPhase::RampIn => RGB8::new(level, 0, 0),
            RainbowPhase::RedToGreen => RGB8::new(fade, level, 0),
            RainbowPhase::GreenToBlue => RGB8::new(0, fade, level),
            RainbowPhase::BlueToRed => RGB8::new(level, 0, fade),
        };

        self.level = level + 1;
        if self.level >= max {
            self.level = 0;
            self.phase = match self.phase {
                RainbowPhase::RampIn | RainbowPhase::BlueToRed => RainbowPhase::RedToGreen,
                RainbowPhase::RedToGreen => RainbowPhase::GreenToBlue,
                RainbowPhase::GreenToBlue => RainbowPhase::BlueToRed,
            };
        }
        color
    }
}

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitError {
    Strip,
    CapsLed,
}

/// Drives the RGB status pixel and the caps-lock LED from [`StatusCommand`]s.
pub struct StatusLed<'c, S: SmartLedsWrite<Color = RGB8>, C: OutputPin, M: RawMutex> {
    strip: S,
    caps_led: C,
    /// The reference board sinks the caps LED current, so "on" is a low level.
    caps_active_low: bool,
    channel: &'c StatusChannel<M>,

    mode: DisplayMode,
    brightness: Brightness,
    blink_on: bool,
    rainbow: Rainbow,
}

impl<'c, S: SmartLedsWrite<Color = RGB8>, C: OutputPin, M: RawMutex> StatusLed<'c, S, C, M> {
    pub fn new(strip: S, caps_led: C, caps_active_low: bool, channel: &'c StatusChannel<M>) -> Self {
        Self {
            strip,
            caps_led,
            caps_active_low,
            channel,
            mode: DisplayMode::Rainbow,
            brightness: Brightness::default(),
            blink_on: false,
            rainbow: Rainbow::default(),
        }
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn brightness(&self) -> Brightness {
        self.brightness
    }

    pub fn rainbow(&self) -> Rainbow {
        self.rainbow
    }

    fn write_color(&mut self, color: RGB8) -> Result<(), InitError> {
        self.strip.write([color]).map_err(|_| InitError::Strip)
    }

    fn set_caps(&mut self, on: bool) -> Result<(), InitError> {
        let res = if on != self.caps_active_low {
            self.caps_led.set_high()
        } else {
            self.caps_led.set_low()
        };
        res.map_err(|_| InitError::CapsLed)
    }

    /// Draws one frame of the current mode and returns how long it stays valid.
    pub fn render(&mut self) -> Option<Duration> {
        let brightness = self.brightness.value();
        let behaviour = self.mode.behaviour();
        let (color, caps) = match behaviour {
            Behaviour::Solid { tint, caps } => (tint.scale(brightness), *caps),
            Behaviour::Blink { on, off } => {
                let tint = if self.blink_on { on } else { off };
                self.blink_on = !self.blink_on;
                (tint.scale(brightness), false)
            }
            Behaviour::Rainbow => (self.rainbow.next_color(brightness), false),
        };

        if self.write_color(color).is_err() {
            crate::warn!("status LED write failed");
        }
        if self.set_caps(caps).is_err() {
            crate::warn!("caps LED write failed");
        }
        behaviour.wait(brightness)
    }

    pub fn apply(&mut self, command: StatusCommand) {
        match command {
            StatusCommand::Brightness(step) => {
                self.brightness.step(step);
                self.rainbow.restart_level();
                crate::debug!("brightness {}", self.brightness.value());
            }
            StatusCommand::Mode(mode) => {
                if mode != self.mode {
                    crate::debug!("status mode {:?} -> {:?}", self.mode, mode);
                }
                self.mode = mode;
                self.channel.publish_mode(mode);
            }
        }
    }
}

impl<S: SmartLedsWrite<Color = RGB8>, C: OutputPin, M: RawMutex> Task for StatusLed<'_, S, C, M> {
    const NAME: &'static str = "LedsTask";

    type Error = InitError;

    async fn init(&mut self) -> Result<(), Self::Error> {
        self.write_color(RGB8::default())?;
        self.set_caps(false)?;
        self.mode = DisplayMode::Rainbow;
        self.rainbow = Rainbow::default();
        self.channel.publish_mode(self.mode);
        Ok(())
    }

    async fn handle(&mut self) {
        let wait = self.render();
        if let Some(command) = self.channel.receive_timeout(wait).await {
            self.apply(command);
        }
    }
}

#[cfg(test)]
#[path = "status_led_test.rs"]
mod test;
