use embassy_futures::select::{select3, select4, Either3, Either4};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_time::Delay;
use embassy_usb::{driver::Driver, Config};
use embedded_hal::digital::{InputPin, OutputPin};
use ftkb_common::globals::REPORT_QUEUE_DEPTH;
use smart_leds::{SmartLedsWrite, RGB8};
use static_cell::StaticCell;

use crate::{
    brightness_repeat::BrightnessRepeat,
    key_reporter::Reporter,
    key_scanner::KeyScanner,
    layout::Layout,
    report::ReportChannel,
    status_led::{StatusChannel, StatusLed},
    task::run_task,
    usb::{self, CapsLockHandler, Configurator, State, UsbBuffers, UsbLink, KEYBOARD_REPORT_DESC},
};

type Reports = ReportChannel<NoopRawMutex, REPORT_QUEUE_DEPTH>;
type Status = StatusChannel<NoopRawMutex>;

static REPORT_CHANNEL: StaticCell<Reports> = StaticCell::new();
static STATUS_CHANNEL: StaticCell<Status> = StaticCell::new();
static USB_LINK: StaticCell<UsbLink> = StaticCell::new();
static USB_BUFFERS: StaticCell<UsbBuffers> = StaticCell::new();
static HID_STATE: StaticCell<State> = StaticCell::new();
static CONTROL_HANDLER: StaticCell<CapsLockHandler<'static, NoopRawMutex>> = StaticCell::new();

pub struct KeyboardBuilder<
    D: Driver<'static>,
    I: InputPin,
    O: OutputPin,
    S: SmartLedsWrite<Color = RGB8>,
    C: OutputPin,
    const COLS: usize,
    const ROWS: usize,
> {
    usb_config: Config<'static>,
    driver: D,
    row_pins: [I; ROWS],
    column_pins: [O; COLS],
    layout: Layout<COLS, ROWS>,
    strip: S,
    caps_led: C,
    caps_active_low: bool,
}

/// All the keyboard's parts, ready to [`run`](Keyboard::run).
pub struct Keyboard<
    D: Driver<'static>,
    I: InputPin,
    O: OutputPin,
    S: SmartLedsWrite<Color = RGB8>,
    C: OutputPin,
    const COLS: usize,
    const ROWS: usize,
> {
    builder: KeyboardBuilder<D, I, O, S, C, COLS, ROWS>,
    reports: &'static Reports,
    status: &'static Status,
    link: &'static UsbLink,
}

const fn check_settings<const COLS: usize, const ROWS: usize>() -> bool {
    assert!(COLS > 0 && COLS < 128);
    assert!(ROWS > 0 && ROWS < 128);
    true
}

impl<
        D: Driver<'static> + 'static,
        I: InputPin,
        O: OutputPin,
        S: SmartLedsWrite<Color = RGB8>,
        C: OutputPin,
        const COLS: usize,
        const ROWS: usize,
    > Keyboard<D, I, O, S, C, COLS, ROWS>
{
    const OKAY: bool = check_settings::<COLS, ROWS>();

    /// Sets up USB and runs the scanner, the HID link and the status LED until power-off.
    pub async fn run(self) -> ! {
        assert!(Self::OKAY);

        let KeyboardBuilder {
            usb_config,
            driver,
            row_pins,
            column_pins,
            layout,
            strip,
            caps_led,
            caps_active_low,
        } = self.builder;

        let configurator = Configurator::new(&usb_config);
        let usb_buffers: &'static mut UsbBuffers = USB_BUFFERS.init(UsbBuffers::default());
        let mut usb_builder = usb::usb_builder(driver, usb_config, usb_buffers);

        let hid_state: &'static mut State<'static> = HID_STATE.init(State::new());
        let control_handler = CONTROL_HANDLER.init(CapsLockHandler::new(self.status));
        let (hid_writer, hid_reader) = configurator.add_iface(
            &mut usb_builder,
            &KEYBOARD_REPORT_DESC,
            self.link,
            Some(control_handler),
            hid_state,
        );

        let mut usb = usb_builder.build();
        let mut reader_handler = CapsLockHandler::new(self.status);

        let scanner = KeyScanner::new(row_pins, column_pins, Delay, layout, self.reports);
        let reporter = Reporter::new(hid_writer, self.link, self.reports, self.status);
        let indicator = StatusLed::new(strip, caps_led, caps_active_low, self.status);
        let brightness = BrightnessRepeat::new(self.status);

        crate::info!("keyboard starting");

        match select4(
            usb.run(),
            run_task(scanner),
            run_task(reporter),
            select3(
                run_task(indicator),
                run_task(brightness),
                hid_reader.run(&mut reader_handler),
            ),
        )
        .await
        {
            Either4::First(never) | Either4::Second(never) | Either4::Third(never) => never,
            Either4::Fourth(Either3::First(never) | Either3::Second(never) | Either3::Third(never)) => {
                never
            }
        }
    }
}

impl<
        D: Driver<'static> + 'static,
        I: InputPin,
        O: OutputPin,
        S: SmartLedsWrite<Color = RGB8>,
        C: OutputPin,
        const COLS: usize,
        const ROWS: usize,
    > KeyboardBuilder<D, I, O, S, C, COLS, ROWS>
{
    /// `row_pins` read high while a switch in the strobed column is closed. The caps LED
    /// defaults to active-low.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        vid: u16,
        pid: u16,
        driver: D,
        row_pins: [I; ROWS],
        column_pins: [O; COLS],
        layout: Layout<COLS, ROWS>,
        strip: S,
        caps_led: C,
    ) -> Self {
        Self {
            usb_config: Config::new(vid, pid),
            driver,
            row_pins,
            column_pins,
            layout,
            strip,
            caps_led,
            caps_active_low: true,
        }
    }

    pub fn manufacturer(mut self, value: &'static str) -> Self {
        self.usb_config.manufacturer = Some(value);
        self
    }

    pub fn product(mut self, value: &'static str) -> Self {
        self.usb_config.product = Some(value);
        self
    }

    pub fn serial_number(mut self, value: &'static str) -> Self {
        self.usb_config.serial_number = Some(value);
        self
    }

    pub fn max_power(mut self, value: u16) -> Self {
        self.usb_config.max_power = value;
        self
    }

    pub fn caps_active_low(mut self, value: bool) -> Self {
        self.caps_active_low = value;
        self
    }

    /// Call once: the channels and USB state live in statics, so a second keyboard panics.
    pub fn build(self) -> Keyboard<D, I, O, S, C, COLS, ROWS> {
        let reports: &'static Reports = REPORT_CHANNEL.init(Reports::default());
        let status: &'static Status = STATUS_CHANNEL.init(Status::new());
        let link: &'static UsbLink = USB_LINK.init(UsbLink::new());

        Keyboard {
            builder: self,
            reports,
            status,
            link,
        }
    }
}
