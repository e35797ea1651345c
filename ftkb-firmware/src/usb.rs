use core::{
    mem::MaybeUninit,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_usb::{
    class::hid::{ReportId, RequestHandler},
    control::{InResponse, OutResponse, Recipient, Request, RequestType},
    driver::Driver,
    types::InterfaceNumber,
    Builder, Config, Handler,
};
use ftkb_common::keycodes::{led, report_id};

use crate::{
    hid::{HidReader, HidWriter},
    key_reporter::LinkState,
    report::KEYBOARD_FRAME_LEN,
    status_led::{DisplayMode, StatusChannel},
};

// HID
const HID_DESC_DESCTYPE_HID: u8 = 0x21;
const HID_DESC_DESCTYPE_HID_REPORT: u8 = 0x22;
const HID_DESC_SPEC_1_11: [u8; 2] = [0x11, 0x01];
const HID_DESC_COUNTRY_UNSPEC: u8 = 0x00;

const HID_REQ_SET_IDLE: u8 = 0x0a;
const HID_REQ_GET_IDLE: u8 = 0x02;
const HID_REQ_GET_REPORT: u8 = 0x01;
const HID_REQ_SET_REPORT: u8 = 0x09;
const HID_REQ_GET_PROTOCOL: u8 = 0x03;
const HID_REQ_SET_PROTOCOL: u8 = 0x0b;

const HID_CLASS: u8 = 3;
pub const HID_SUBCLASS_NONE: u8 = 0;
pub const HID_PROTOCOL_NONE: u8 = 0;

/// Output reports are a report id and the LED byte.
pub const OUT_REPORT_LEN: usize = 2;

#[rustfmt::skip]
pub const KEYBOARD_REPORT_DESC: [u8; 67 + 25] = [
    // KEYBOARD_DESC [u8; 67]
    0x05, 0x01, // (GLOBAL) USAGE_PAGE         0x0001 Generic Desktop Page
    0x09, 0x06, // (LOCAL)  USAGE              0x00010006 Keyboard (Application Collection)
    0xA1, 0x01, // (MAIN) COLLECTION 0x01 Application
    0x85, 0x01, //   (GLOBAL) REPORT_ID          0x01 (1)
    0x05, 0x07, //   (GLOBAL) USAGE_PAGE         0x0007 Keyboard/Keypad Page
    0x19, 0xE0, //   (LOCAL)  USAGE_MINIMUM      0x000700E0 Keyboard LeftControl
    0x29, 0xE7, //   (LOCAL)  USAGE_MAXIMUM      0x000700E7 Keyboard Right GUI
    0x15, 0x00, //   (GLOBAL) LOGICAL_MINIMUM    0x00 (0)
    0x25, 0x01, //   (GLOBAL) LOGICAL_MAXIMUM    0x01 (1)
    0x95, 0x08, //   (GLOBAL) REPORT_COUNT       0x08 (8) Number of fields
    0x75, 0x01, //   (GLOBAL) REPORT_SIZE        0x01 (1) Number of bits per field
    0x81, 0x02, //   (MAIN) INPUT 0x00000002 (8 fields x 1 bit) Data Variable Absolute
    0x95, 0x01, //   (GLOBAL) REPORT_COUNT       0x01 (1) Number of fields
    0x75, 0x08, //   (GLOBAL) REPORT_SIZE        0x08 (8) Number of bits per field
    0x81, 0x01, //   (MAIN) INPUT 0x00000001 (1 field x 8 bits) Constant: reserved byte
    0x05, 0x08, //   (GLOBAL) USAGE_PAGE         0x0008 LED Page
    0x19, 0x01, //   (LOCAL)  USAGE_MINIMUM      0x00080001 Num Lock
    0x29, 0x05, //   (LOCAL)  USAGE_MAXIMUM      0x00080005 Kana
    0x95, 0x05, //   (GLOBAL) REPORT_COUNT       0x05 (5) Number of fields
    0x75, 0x01, //   (GLOBAL) REPORT_SIZE        0x01 (1) Number of bits per field
    0x91, 0x02, //   (MAIN) OUTPUT 0x00000002 (5 fields x 1 bit) Data Variable Absolute
    0x95, 0x01, //   (GLOBAL) REPORT_COUNT       0x01 (1) Number of fields
    0x75, 0x03, //   (GLOBAL) REPORT_SIZE        0x03 (3) Number of bits per field
    0x91, 0x01, //   (MAIN) OUTPUT 0x00000001 (1 field x 3 bits) Constant: padding
    0x05, 0x07, //   (GLOBAL) USAGE_PAGE         0x0007 Keyboard/Keypad Page
    0x19, 0x00, //   (LOCAL)  USAGE_MINIMUM      0x00070000 Keyboard No event indicated
    0x2A, 0xFF, 0x00, // (LOCAL) USAGE_MAXIMUM   0x000700FF
    0x15, 0x00, //   (GLOBAL) LOGICAL_MINIMUM    0x00 (0)
    0x26, 0xFF, 0x00, // (GLOBAL) LOGICAL_MAXIMUM 0x00FF (255)
    0x95, 0x06, //   (GLOBAL) REPORT_COUNT       0x06 (6) Number of fields
    0x75, 0x08, //   (GLOBAL) REPORT_SIZE        0x08 (8) Number of bits per field
    0x81, 0x00, //   (MAIN) INPUT 0x00000000 (6 fields x 8 bits) Data Array Absolute
    0xC0,       // (MAIN)   END_COLLECTION     Application

    // CONSUMER_CTL_DESC: [u8; 25]
    0x05, 0x0C, // (GLOBAL) USAGE_PAGE         0x000C Consumer Page
    0x09, 0x01, // (LOCAL)  USAGE              0x000C0001 Consumer Control (Application Collection)
    0xA1, 0x01, // (MAIN) COLLECTION 0x01 Application
    0x85, 0x03, //   (GLOBAL) REPORT_ID          0x03 (3)
    0x19, 0x01, //   (LOCAL)  USAGE_MINIMUM      0x000C0001 Consumer Control
    0x2A, 0xA0,2,//  (LOCAL)  USAGE_MAXIMUM      0x000C02A0 AC Soft Key Left
    0x15, 0x01, //   (GLOBAL) LOGICAL_MINIMUM    0x01 (1)
    0x26, 0xA0,2,//  (GLOBAL) LOGICAL_MAXIMUM    0x02A0 (672)
    0x95, 0x01, //   (GLOBAL) REPORT_COUNT       0x01 (1) Number of fields
    0x75, 0x10, //   (GLOBAL) REPORT_SIZE        0x10 (16) Number of bits per field
    0x81, 0x00, //   (MAIN)   INPUT              0x00000000 (1 field x 16 bits) Data Array Absolute
    0xC0,       // (MAIN)   END_COLLECTION     Application
];

/// Device state as reported by the USB stack.
#[derive(Default)]
pub struct UsbLink {
    configured: AtomicBool,
    suspended: AtomicBool,
}
impl UsbLink {
    pub const fn new() -> Self {
        Self {
            configured: AtomicBool::new(false),
            suspended: AtomicBool::new(false),
        }
    }

    pub fn set_configured(&self, configured: bool) {
        self.configured.store(configured, Ordering::Relaxed);
    }

    pub fn set_suspended(&self, suspended: bool) {
        self.suspended.store(suspended, Ordering::Relaxed);
    }
}
impl LinkState for UsbLink {
    fn is_ready(&self) -> bool {
        self.configured.load(Ordering::Relaxed) && !self.suspended.load(Ordering::Relaxed)
    }
}

/// Reads the caps-lock state out of an output report.
///
/// The LED byte may arrive with or without its leading report id. Returns `None` for anything
/// that is not a keyboard LED report.
pub fn caps_lock_state(id: ReportId, data: &[u8]) -> Option<bool> {
    let leds = match (id, data) {
        (ReportId::Out(report_id::KEYBOARD), [report_id::KEYBOARD, leds])
        | (ReportId::Out(report_id::KEYBOARD), [leds]) => *leds,
        _ => return None,
    };
    Some(leds & led::CAPS_LOCK != 0)
}

/// Forwards the host's caps-lock LED to the status LED.
pub struct CapsLockHandler<'c, M: RawMutex> {
    status: &'c StatusChannel<M>,
}
impl<'c, M: RawMutex> CapsLockHandler<'c, M> {
    pub fn new(status: &'c StatusChannel<M>) -> Self {
        Self { status }
    }
}
impl<M: RawMutex> RequestHandler for CapsLockHandler<'_, M> {
    fn set_report(&mut self, id: ReportId, data: &[u8]) -> OutResponse {
        match caps_lock_state(id, data) {
            Some(caps) => {
                let mode = if caps {
                    DisplayMode::CapsOnUsb
                } else {
                    DisplayMode::Usb
                };
                if !self.status.set_mode(mode) {
                    crate::debug!("status queue full, caps lock {} dropped", caps);
                }
            }
            None => {
                crate::info!("ignored output report {:?}: {:?}", id, data);
            }
        }
        OutResponse::Accepted
    }
}

/// Internal state for USB HID.
pub struct State<'d> {
    control: MaybeUninit<Control<'d>>,
    out_report_offset: AtomicUsize,
}
impl Default for State<'_> {
    fn default() -> Self {
        Self::new()
    }
}
impl State<'_> {
    /// Create a new `State`.
    pub const fn new() -> Self {
        State {
            control: MaybeUninit::uninit(),
            out_report_offset: AtomicUsize::new(0),
        }
    }
}

const CONFIG_SIZE: usize = 128;
const BOS_SIZE: usize = 32;
const MSOS_SIZE: usize = 0;
const CONTROL_SIZE: usize = 64;

pub struct UsbBuffers {
    config_descriptor_buf: [u8; CONFIG_SIZE],
    bos_descriptor_buf: [u8; BOS_SIZE],
    msos_descriptor_buf: [u8; MSOS_SIZE],
    control_buf: [u8; CONTROL_SIZE],
}

impl Default for UsbBuffers {
    fn default() -> Self {
        Self {
            config_descriptor_buf: [0; CONFIG_SIZE],
            bos_descriptor_buf: [0; BOS_SIZE],
            msos_descriptor_buf: [0; MSOS_SIZE],
            control_buf: [0; CONTROL_SIZE],
        }
    }
}

/// Creates the device builder over the static descriptor buffers.
pub fn usb_builder<'d, D: Driver<'d>>(
    driver: D,
    device_config: Config<'d>,
    buffers: &'d mut UsbBuffers,
) -> Builder<'d, D> {
    Builder::new(
        driver,
        device_config,
        &mut buffers.config_descriptor_buf,
        &mut buffers.bos_descriptor_buf,
        &mut buffers.msos_descriptor_buf,
        &mut buffers.control_buf,
    )
}

/// Endpoint parameters for the HID interface.
#[derive(Debug, Clone, Copy)]
pub struct Configurator {
    max_packet_size: u16,
    poll_ms: u8,
}

impl Configurator {
    pub fn new(device_config: &Config<'_>) -> Self {
        Self {
            max_packet_size: device_config.max_packet_size_0 as u16,
            poll_ms: 10,
        }
    }

    /// Adds the keyboard HID interface with an interrupt IN endpoint for reports and an
    /// interrupt OUT endpoint for the host's LED state.
    pub fn add_iface<'d, D: Driver<'d>>(
        &self,
        builder: &mut Builder<'d, D>,
        descriptor: &'static [u8],
        link: &'d UsbLink,
        request_handler: Option<&'d mut dyn RequestHandler>,
        state: &'d mut State<'d>,
    ) -> (
        HidWriter<D::EndpointIn, KEYBOARD_FRAME_LEN>,
        HidReader<'d, D::EndpointOut, OUT_REPORT_LEN>,
    ) {
        let mut func = builder.function(HID_CLASS, HID_SUBCLASS_NONE, HID_PROTOCOL_NONE);
        let mut iface = func.interface();
        let if_num = iface.interface_number();
        let mut alt = iface.alt_setting(HID_CLASS, HID_SUBCLASS_NONE, HID_PROTOCOL_NONE, None);

        let len = descriptor.len();
        alt.descriptor(
            HID_DESC_DESCTYPE_HID,
            &[
                HID_DESC_SPEC_1_11[0],
                HID_DESC_SPEC_1_11[1],
                HID_DESC_COUNTRY_UNSPEC,
                1,
                HID_DESC_DESCTYPE_HID_REPORT,
                (len & 0xFF) as u8,
                (len >> 8 & 0xFF) as u8,
            ],
        );

        let ep_in = alt.endpoint_interrupt_in(self.max_packet_size, self.poll_ms);
        let ep_out = alt.endpoint_interrupt_out(self.max_packet_size, self.poll_ms);

        drop(func);

        let control = Control::new(
            if_num,
            descriptor,
            link,
            request_handler,
            &state.out_report_offset,
        );
        let control = state.control.write(control);
        builder.handler(control);
        (
            HidWriter::new(ep_in),
            HidReader::new(ep_out, &state.out_report_offset),
        )
    }
}

struct Control<'d> {
    if_num: InterfaceNumber,
    report_descriptor: &'d [u8],
    link: &'d UsbLink,
    request_handler: Option<&'d mut dyn RequestHandler>,
    out_report_offset: &'d AtomicUsize,
    hid_descriptor: [u8; 9],
}
impl<'d> Control<'d> {
    fn new(
        if_num: InterfaceNumber,
        report_descriptor: &'d [u8],
        link: &'d UsbLink,
        request_handler: Option<&'d mut dyn RequestHandler>,
        out_report_offset: &'d AtomicUsize,
    ) -> Self {
        Control {
            if_num,
            report_descriptor,
            link,
            request_handler,
            out_report_offset,
            hid_descriptor: [
                9,                                           // Length of buf inclusive of size prefix
                HID_DESC_DESCTYPE_HID,                       // Descriptor type
                HID_DESC_SPEC_1_11[0],                       // HID Class spec version
                HID_DESC_SPEC_1_11[1],                       //
                HID_DESC_COUNTRY_UNSPEC,                     // Country code not supported
                1,                                           // Number of following descriptors
                HID_DESC_DESCTYPE_HID_REPORT, // We have a HID report descriptor the host should read
                (report_descriptor.len() & 0xFF) as u8, // HID report descriptor size,
                (report_descriptor.len() >> 8 & 0xFF) as u8, //
            ],
        }
    }
}
impl Handler for Control<'_> {
    fn enabled(&mut self, enabled: bool) {
        if !enabled {
            self.link.set_configured(false);
        }
    }

    fn reset(&mut self) {
        self.out_report_offset.store(0, Ordering::Release);
        self.link.set_configured(false);
        self.link.set_suspended(false);
    }

    fn configured(&mut self, configured: bool) {
        crate::info!("usb configured: {}", configured);
        self.link.set_configured(configured);
    }

    fn suspended(&mut self, suspended: bool) {
        crate::info!("usb suspended: {}", suspended);
        self.link.set_suspended(suspended);
    }

    fn control_out(&mut self, req: Request, data: &[u8]) -> Option<OutResponse> {
        if (req.request_type, req.recipient, req.index)
            != (
                RequestType::Class,
                Recipient::Interface,
                self.if_num.0 as u16,
            )
        {
            return None;
        }

        match req.request {
            HID_REQ_SET_IDLE => {
                if let Some(handler) = self.request_handler.as_mut() {
                    let id = req.value as u8;
                    let id = (id != 0).then_some(ReportId::In(id));
                    let dur = u32::from(req.value >> 8);
                    let dur = if dur == 0 { u32::MAX } else { 4 * dur };
                    handler.set_idle_ms(id, dur);
                }
                Some(OutResponse::Accepted)
            }
            HID_REQ_SET_REPORT => {
                match (report_id_try_from(req.value), self.request_handler.as_mut()) {
                    (Ok(id), Some(handler)) => {
                        handler.set_report(id, data);
                    }
                    (Err(_), _) => {
                        crate::info!("set report with unknown type {}", req.value);
                    }
                    _ => {}
                }
                Some(OutResponse::Accepted)
            }
            HID_REQ_SET_PROTOCOL => {
                if req.value == 1 {
                    Some(OutResponse::Accepted)
                } else {
                    crate::warn!("HID Boot Protocol is unsupported.");
                    Some(OutResponse::Rejected) // UNSUPPORTED: Boot Protocol
                }
            }
            _ => Some(OutResponse::Rejected),
        }
    }

    fn control_in<'a>(&'a mut self, req: Request, buf: &'a mut [u8]) -> Option<InResponse<'a>> {
        if req.index != self.if_num.0 as u16 {
            return None;
        }

        match (req.request_type, req.recipient) {
            (RequestType::Standard, Recipient::Interface) => match req.request {
                Request::GET_DESCRIPTOR => match (req.value >> 8) as u8 {
                    HID_DESC_DESCTYPE_HID_REPORT => {
                        Some(InResponse::Accepted(self.report_descriptor))
                    }
                    HID_DESC_DESCTYPE_HID => Some(InResponse::Accepted(&self.hid_descriptor)),
                    _ => Some(InResponse::Rejected),
                },

                _ => Some(InResponse::Rejected),
            },
            (RequestType::Class, Recipient::Interface) => match req.request {
                HID_REQ_GET_REPORT => {
                    let size = match report_id_try_from(req.value) {
                        Ok(id) => self
                            .request_handler
                            .as_mut()
                            .and_then(|x| x.get_report(id, buf)),
                        Err(_) => None,
                    };

                    if let Some(size) = size {
                        Some(InResponse::Accepted(&buf[0..size]))
                    } else {
                        Some(InResponse::Rejected)
                    }
                }
                HID_REQ_GET_IDLE => {
                    let dur = self.request_handler.as_mut().and_then(|handler| {
                        let id = req.value as u8;
                        handler.get_idle_ms((id != 0).then_some(ReportId::In(id)))
                    });
                    match (dur, buf.first_mut()) {
                        (Some(dur), Some(first)) => {
                            *first = u8::try_from(dur / 4).unwrap_or(0);
                            Some(InResponse::Accepted(&buf[0..1]))
                        }
                        _ => Some(InResponse::Rejected),
                    }
                }
                HID_REQ_GET_PROTOCOL => match buf.first_mut() {
                    // UNSUPPORTED: Boot Protocol
                    Some(first) => {
                        *first = 1;
                        Some(InResponse::Accepted(&buf[0..1]))
                    }
                    None => Some(InResponse::Rejected),
                },
                _ => Some(InResponse::Rejected),
            },
            _ => None,
        }
    }
}

const fn report_id_try_from(value: u16) -> Result<ReportId, ()> {
    match value >> 8 {
        1 => Ok(ReportId::In(value as u8)),
        2 => Ok(ReportId::Out(value as u8)),
        3 => Ok(ReportId::Feature(value as u8)),
        _ => Err(()),
    }
}

#[cfg(test)]
#[path = "usb_test.rs"]
mod test;
