use embassy_futures::block_on;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_time::Instant;

use crate::time_driver_test_stub::set_time;

use super::*;

#[test]
fn keyboard_frame_layout() {
    let mut report = Report::default();
    report.add_modifiers(0x02);
    report.add_modifiers(0x40);
    assert!(report.push_key(0x04));
    assert!(report.push_key(0x2c));

    assert_eq!(
        report.keyboard_frame(),
        [report_id::KEYBOARD, 0x42, 0, 0x04, 0x2c, 0, 0, 0, 0]
    );
}

#[test]
fn full_keyboard_frame() {
    let mut report = Report::default();
    for code in 4..10 {
        assert!(report.push_key(code));
    }
    assert!(!report.push_key(10));
    assert_eq!(report.keys(), &[4, 5, 6, 7, 8, 9]);
    assert_eq!(report.keyboard_frame(), [1, 0, 0, 4, 5, 6, 7, 8, 9]);
}

#[test]
fn consumer_frame_is_little_endian() {
    let mut report = Report::default();
    report.set_consumer(0x0169);
    assert_eq!(report.consumer_frame(), [report_id::CONSUMER, 0x69, 0x01]);

    report.set_consumer(0);
    assert_eq!(report.consumer_frame(), [3, 0, 0]);
}

#[test]
fn channel_drops_when_full() {
    let channel = ReportChannel::<NoopRawMutex, 2>::default();
    let mut report = Report::default();
    report.push_key(4);

    assert!(channel.try_send(report.clone()));
    assert!(channel.try_send(Report::default()));
    assert!(!channel.try_send(report.clone()));

    assert_eq!(channel.try_receive(), Some(report));
    assert_eq!(channel.try_receive(), Some(Report::default()));
    assert_eq!(channel.try_receive(), None);
}

#[test]
fn receive_timeout_expires() {
    block_on(async {
        set_time(1000);
        let channel = ReportChannel::<NoopRawMutex, 2>::default();

        assert_eq!(channel.receive_timeout(Duration::from_millis(10)).await, None);
        assert!(Instant::now().as_ticks() >= 11_000);

        channel.try_send(Report::default());
        assert_eq!(
            channel.receive_timeout(Duration::from_millis(10)).await,
            Some(Report::default())
        );
    });
}
