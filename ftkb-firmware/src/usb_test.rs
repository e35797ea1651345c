use embassy_sync::blocking_mutex::raw::NoopRawMutex;

use crate::status_led::StatusCommand;

use super::*;

fn setup_packet(request_type: u8, request: u8, value: u16, index: u16, length: u16) -> Request {
    let [vl, vh] = value.to_le_bytes();
    let [il, ih] = index.to_le_bytes();
    let [ll, lh] = length.to_le_bytes();
    Request::parse(&[request_type, request, vl, vh, il, ih, ll, lh])
}

fn set_report(value: u16, len: u16) -> Request {
    setup_packet(0x21, HID_REQ_SET_REPORT, value, 0, len)
}

fn mode_sent(status: &StatusChannel<NoopRawMutex>) -> Option<DisplayMode> {
    match status.try_receive()? {
        StatusCommand::Mode(mode) => Some(mode),
        StatusCommand::Brightness(_) => None,
    }
}

#[test]
fn descriptor_layout() {
    assert_eq!(KEYBOARD_REPORT_DESC.len(), 92);
    assert_eq!(&KEYBOARD_REPORT_DESC[6..8], &[0x85, report_id::KEYBOARD]);
    assert_eq!(&KEYBOARD_REPORT_DESC[67..69], &[0x05, 0x0C]);
    assert_eq!(&KEYBOARD_REPORT_DESC[73..75], &[0x85, report_id::CONSUMER]);
    assert_eq!(KEYBOARD_REPORT_DESC[66], 0xC0);
    assert_eq!(KEYBOARD_REPORT_DESC[91], 0xC0);
}

#[test]
fn caps_lock_from_led_byte() {
    let out = ReportId::Out(report_id::KEYBOARD);
    assert_eq!(caps_lock_state(out, &[led::CAPS_LOCK]), Some(true));
    assert_eq!(caps_lock_state(out, &[led::NUM_LOCK]), Some(false));
    assert_eq!(caps_lock_state(out, &[led::NUM_LOCK | led::CAPS_LOCK]), Some(true));
    assert_eq!(caps_lock_state(out, &[report_id::KEYBOARD, led::CAPS_LOCK]), Some(true));
    assert_eq!(caps_lock_state(out, &[report_id::KEYBOARD, 0]), Some(false));
}

#[test]
fn caps_lock_ignores_other_reports() {
    assert_eq!(caps_lock_state(ReportId::Out(2), &[led::CAPS_LOCK]), None);
    assert_eq!(caps_lock_state(ReportId::Feature(1), &[led::CAPS_LOCK]), None);
    assert_eq!(caps_lock_state(ReportId::Out(1), &[]), None);
    assert_eq!(caps_lock_state(ReportId::Out(1), &[1, 2, 3]), None);
    assert_eq!(caps_lock_state(ReportId::Out(1), &[5, led::CAPS_LOCK]), None);
}

#[test]
fn handler_switches_caps_mode() {
    let status = StatusChannel::<NoopRawMutex>::new();
    let mut handler = CapsLockHandler::new(&status);

    let out = ReportId::Out(report_id::KEYBOARD);
    assert_eq!(handler.set_report(out, &[led::CAPS_LOCK]), OutResponse::Accepted);
    assert_eq!(mode_sent(&status), Some(DisplayMode::CapsOnUsb));

    assert_eq!(handler.set_report(out, &[0]), OutResponse::Accepted);
    assert_eq!(mode_sent(&status), Some(DisplayMode::Usb));

    assert_eq!(
        handler.set_report(ReportId::Feature(9), &[1, 2, 3]),
        OutResponse::Accepted
    );
    assert_eq!(mode_sent(&status), None);
}

#[test]
fn handler_accepts_when_status_queue_full() {
    let status = StatusChannel::<NoopRawMutex>::new();
    assert!(status.set_mode(DisplayMode::Error));
    let mut handler = CapsLockHandler::new(&status);

    assert_eq!(
        handler.set_report(ReportId::Out(1), &[led::CAPS_LOCK]),
        OutResponse::Accepted
    );
    assert_eq!(mode_sent(&status), Some(DisplayMode::Error));
}

#[test]
fn link_ready_needs_configured_and_awake() {
    let link = UsbLink::new();
    assert!(!link.is_ready());
    link.set_configured(true);
    assert!(link.is_ready());
    link.set_suspended(true);
    assert!(!link.is_ready());
    link.set_suspended(false);
    assert!(link.is_ready());
}

#[test]
fn control_tracks_device_state() {
    let link = UsbLink::new();
    let offset = AtomicUsize::new(1);
    let mut control = Control::new(InterfaceNumber(0), &KEYBOARD_REPORT_DESC, &link, None, &offset);

    control.configured(true);
    assert!(link.is_ready());
    control.suspended(true);
    assert!(!link.is_ready());

    control.reset();
    assert!(!link.is_ready());
    assert_eq!(offset.load(Ordering::Relaxed), 0);

    control.configured(true);
    control.enabled(false);
    assert!(!link.is_ready());
}

#[test]
fn control_set_report_reaches_handler() {
    let link = UsbLink::new();
    let offset = AtomicUsize::new(0);
    let status = StatusChannel::<NoopRawMutex>::new();
    let mut handler = CapsLockHandler::new(&status);
    let mut control = Control::new(
        InterfaceNumber(0),
        &KEYBOARD_REPORT_DESC,
        &link,
        Some(&mut handler),
        &offset,
    );

    let ans = control.control_out(set_report(0x0201, 1), &[led::CAPS_LOCK]);
    assert_eq!(ans, Some(OutResponse::Accepted));
    assert_eq!(mode_sent(&status), Some(DisplayMode::CapsOnUsb));

    let ans = control.control_out(set_report(0x0201, 2), &[1, 0]);
    assert_eq!(ans, Some(OutResponse::Accepted));
    assert_eq!(mode_sent(&status), Some(DisplayMode::Usb));

    // unknown report type is still accepted
    let ans = control.control_out(set_report(0x0701, 1), &[led::CAPS_LOCK]);
    assert_eq!(ans, Some(OutResponse::Accepted));
    assert_eq!(mode_sent(&status), None);
}

#[test]
fn control_ignores_other_interfaces() {
    let link = UsbLink::new();
    let offset = AtomicUsize::new(0);
    let mut control = Control::new(InterfaceNumber(1), &KEYBOARD_REPORT_DESC, &link, None, &offset);

    assert_eq!(control.control_out(set_report(0x0201, 1), &[0]), None);
}

#[test]
fn control_serves_descriptors() {
    let link = UsbLink::new();
    let offset = AtomicUsize::new(0);
    let mut control = Control::new(InterfaceNumber(0), &KEYBOARD_REPORT_DESC, &link, None, &offset);
    let mut buf = [0; 64];

    let req = setup_packet(0x81, Request::GET_DESCRIPTOR, 0x2200, 0, 92);
    match control.control_in(req, &mut buf) {
        Some(InResponse::Accepted(data)) => assert_eq!(data, &KEYBOARD_REPORT_DESC),
        _ => panic!("report descriptor not served"),
    }

    let req = setup_packet(0x81, Request::GET_DESCRIPTOR, 0x2100, 0, 9);
    match control.control_in(req, &mut buf) {
        Some(InResponse::Accepted(data)) => {
            assert_eq!(data, &[9, 0x21, 0x11, 0x01, 0, 1, 0x22, 92, 0])
        }
        _ => panic!("hid descriptor not served"),
    }

    let req = setup_packet(0xA1, HID_REQ_GET_PROTOCOL, 0, 0, 1);
    match control.control_in(req, &mut buf) {
        Some(InResponse::Accepted(data)) => assert_eq!(data, &[1]),
        _ => panic!("protocol not served"),
    }

    let req = setup_packet(0xA1, HID_REQ_GET_REPORT, 0x0101, 0, 9);
    assert!(matches!(
        control.control_in(req, &mut buf),
        Some(InResponse::Rejected)
    ));
}

#[test]
fn boot_protocol_is_rejected() {
    let link = UsbLink::new();
    let offset = AtomicUsize::new(0);
    let mut control = Control::new(InterfaceNumber(0), &KEYBOARD_REPORT_DESC, &link, None, &offset);

    let req = setup_packet(0x21, HID_REQ_SET_PROTOCOL, 1, 0, 0);
    assert_eq!(control.control_out(req, &[]), Some(OutResponse::Accepted));
    let req = setup_packet(0x21, HID_REQ_SET_PROTOCOL, 0, 0, 0);
    assert_eq!(control.control_out(req, &[]), Some(OutResponse::Rejected));
}
