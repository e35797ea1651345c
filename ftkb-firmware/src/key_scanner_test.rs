extern crate std;

use embassy_futures::block_on;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_time::{Duration, Instant};
use ftkb_common::keycodes::{key_code as kc, modifier};
use std::vec::Vec;

use super::*;

use crate::layout::Key;
use crate::switch_test_stub::{CountingDelay, KeyMatrix, Pin};
use crate::time_driver_test_stub::set_time;

const COLS: usize = 3;
const ROWS: usize = 2;

const fn small_layout() -> Layout<COLS, ROWS> {
    Layout::new(
        [
            [Key::code("A", kc::A), Key::modifier("LSHIFT", modifier::LEFT_SHIFT)],
            [Key::code("B", kc::B), Key::layer_shift("FN")],
            [Key::with_fn("C", kc::C, kc::HOME), Key::empty("")],
        ],
        1,
        1,
    )
}

macro_rules! setup {
    ($km:ident, $channel:ident, $scanner:ident, $delay:ident, $columns:ident: $qs:literal $b:block) => {
        block_on(async move {
            let rows = [Pin::new(1), Pin::new(2)];
            let $columns = [Pin::new(3), Pin::new(4), Pin::new(5)];
            let $km = KeyMatrix::new(Vec::from(&rows), Vec::from(&$columns));

            let $channel = ReportChannel::<NoopRawMutex, $qs>::default();
            let $delay = CountingDelay::default();
            #[allow(unused_mut)]
            let mut $scanner = KeyScanner::new(
                rows,
                $columns.clone(),
                $delay.clone(),
                small_layout(),
                &$channel,
            );
            set_time(1000);

            $b
        })
    };
}

#[test]
fn press_and_release_are_reported() {
    setup!(km, channel, scanner, _delay, _columns: 4 {
        assert!(scanner.init().await.is_ok());

        km.down(0, 0);
        let report = scanner.scan_and_report().await.unwrap();
        assert_eq!(report.keys(), &[kc::A]);
        assert_eq!(channel.try_receive().unwrap(), report);

        km.up(0, 0);
        let report = scanner.scan_and_report().await.unwrap();
        assert!(report.keys().is_empty());
        assert_eq!(channel.try_receive().unwrap(), Report::default());
    });
}

#[test]
fn unchanged_matrix_sends_nothing() {
    setup!(km, channel, scanner, _delay, _columns: 4 {
        assert_eq!(scanner.scan_and_report().await, None);

        km.down(1, 0);
        assert!(scanner.scan_and_report().await.is_some());
        assert!(channel.try_receive().is_some());

        assert!(!scanner.scan().await);
        assert_eq!(scanner.scan_and_report().await, None);
        assert!(channel.try_receive().is_none());
    });
}

#[test]
fn modifier_and_layer() {
    setup!(km, channel, scanner, _delay, _columns: 4 {
        km.down(0, 1);
        km.down(2, 0);
        let report = scanner.scan_and_report().await.unwrap();
        assert_eq!(report.modifiers(), modifier::LEFT_SHIFT);
        assert_eq!(report.keys(), &[kc::C]);

        km.down(1, 1);
        let report = scanner.scan_and_report().await.unwrap();
        assert!(scanner.layout().is_layer_active());
        assert_eq!(report.keys(), &[kc::HOME]);

        assert_eq!(channel.try_receive().unwrap().keys(), &[kc::C]);
        assert_eq!(channel.try_receive().unwrap().keys(), &[kc::HOME]);
    });
}

#[test]
fn full_queue_drops_report() {
    setup!(km, channel, scanner, _delay, _columns: 1 {
        km.down(0, 0);
        assert!(scanner.scan_and_report().await.is_some());

        km.down(1, 0);
        let dropped = scanner.scan_and_report().await.unwrap();
        assert_eq!(dropped.keys(), &[kc::A, kc::B]);

        assert_eq!(channel.try_receive().unwrap().keys(), &[kc::A]);
        assert!(channel.try_receive().is_none());

        km.up(0, 0);
        assert!(scanner.scan_and_report().await.is_some());
        assert_eq!(channel.try_receive().unwrap().keys(), &[kc::B]);
    });
}

#[test]
fn each_column_is_strobed_once_and_left_low() {
    setup!(_km, _channel, scanner, delay, columns: 4 {
        scanner.scan().await;
        assert_eq!(delay.count(), COLS as u32);
        for c in columns.iter() {
            assert_eq!(c.get_state(), Some(false));
            assert_eq!(c.writes(), 2);
        }

        scanner.scan().await;
        assert_eq!(delay.count(), 2 * COLS as u32);
        for c in columns.iter() {
            assert_eq!(c.writes(), 4);
        }
    });
}

#[test]
fn only_strobed_column_is_read() {
    setup!(km, _channel, scanner, _delay, _columns: 4 {
        km.down(2, 0);
        scanner.scan().await;
        assert!(scanner.layout().key(2, 0).unwrap().is_pressed());
        assert!(!scanner.layout().key(0, 0).unwrap().is_pressed());
        assert!(!scanner.layout().key(1, 0).unwrap().is_pressed());
    });
}

#[test]
fn init_releases_everything() {
    setup!(km, channel, scanner, _delay, columns: 4 {
        km.down(0, 0);
        scanner.scan_and_report().await;
        channel.try_receive();

        assert!(scanner.init().await.is_ok());
        assert!(!scanner.layout().key(0, 0).unwrap().is_pressed());
        for c in columns.iter() {
            assert_eq!(c.get_state(), Some(false));
        }

        // the switch is still held so the next sweep sees it as a fresh press
        let report = scanner.scan_and_report().await.unwrap();
        assert_eq!(report.keys(), &[kc::A]);
    });
}

#[test]
fn handle_waits_scan_period() {
    setup!(km, channel, scanner, _delay, _columns: 4 {
        km.down(0, 0);
        scanner.handle().await;
        assert_eq!(channel.try_receive().unwrap().keys(), &[kc::A]);
        assert!(
            Instant::now().as_ticks() >= 1000 + Duration::from_millis(SCAN_PERIOD_MS).as_ticks()
        );
    });
}
