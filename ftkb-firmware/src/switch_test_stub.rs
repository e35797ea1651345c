extern crate alloc;
extern crate std;

use alloc::vec;
use core::cell::Cell;
use embedded_hal::digital::{Error, ErrorType, InputPin, OutputPin};
use embedded_hal_async::delay::DelayNs;
use std::rc::Rc;
use std::sync::Mutex;
use std::vec::Vec;

pub trait Observer {
    fn update(&self, pin: Pin);
}

#[derive(Debug)]
struct KeyMatrixInner {
    switches: Vec<bool>,
    rows: Vec<Pin>,
    columns: Vec<Pin>,
}

impl KeyMatrixInner {
    /// A row reads high while any closed switch on it sits in a strobed column.
    fn refresh_row(&self, row: usize) {
        let cols = self.columns.len();
        let level = self.columns.iter().enumerate().any(|(col, c)| {
            self.switches[row * cols + col] && matches!(c.get_state(), Some(true))
        });
        let mut pin = self.rows[row].clone();
        if level {
            pin.set_high().unwrap();
        } else {
            pin.set_low().unwrap();
        }
    }
}

/// Switch matrix wired like the Keyboard-FT board: columns are strobed high and closed switches
/// pull their row high.
#[derive(Clone)]
pub struct KeyMatrix {
    inner: Rc<Mutex<KeyMatrixInner>>,
}
impl KeyMatrix {
    pub fn new(rows: Vec<Pin>, columns: Vec<Pin>) -> Self {
        let me = Self {
            inner: Rc::new(Mutex::new(KeyMatrixInner {
                switches: vec![false; rows.len() * columns.len()],
                rows,
                columns,
            })),
        };

        for c in me.inner.lock().unwrap().columns.iter() {
            c.add_observer(Rc::new(me.clone()))
        }

        me
    }

    pub fn down(&self, column: usize, row: usize) {
        self.set_switch(column, row, true);
    }

    pub fn up(&self, column: usize, row: usize) {
        self.set_switch(column, row, false);
    }

    pub fn set_switch(&self, column: usize, row: usize, is_down: bool) {
        let mut inner = self.inner();
        let idx = row * inner.columns.len() + column;
        inner.switches[idx] = is_down;
        inner.refresh_row(row);
    }

    fn inner(&self) -> std::sync::MutexGuard<'_, KeyMatrixInner> {
        self.inner.lock().unwrap()
    }
}
impl Observer for KeyMatrix {
    fn update(&self, _pin: Pin) {
        let inner = self.inner();
        for row in 0..inner.rows.len() {
            inner.refresh_row(row);
        }
    }
}

#[derive(Debug)]
pub struct TestError;

#[derive(Clone)]
pub struct Pin(Rc<PinShared>);
impl core::fmt::Debug for Pin {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.get_state();

        f.debug_struct("Pin")
            .field("n", &self.0.n)
            .field("state", &state)
            .finish()
    }
}
impl Pin {
    pub fn new(n: u8) -> Self {
        Self(Rc::new(PinShared {
            n,
            observer: Mutex::new(None),
            inner: Mutex::new(PinInner {
                is_high: None,
                writes: 0,
            }),
        }))
    }

    pub fn num(&self) -> u8 {
        self.0.n
    }

    pub fn get_state(&self) -> Option<bool> {
        self.0.lock().is_high
    }

    /// Number of level changes driven through [`OutputPin`].
    pub fn writes(&self) -> usize {
        self.0.lock().writes
    }

    fn add_observer(&self, observer: Rc<dyn Observer>) {
        *self.0.observer.lock().unwrap() = Some(observer);
    }

    fn set_state(&mut self, is_high: bool) {
        if self.0.get_state() != Some(is_high) {
            {
                let mut inner = self.0.lock();
                inner.is_high = Some(is_high);
                inner.writes += 1;
            }
            if let Some(o) = self.0.observer.lock().unwrap().clone() {
                o.update(self.clone());
            }
        }
    }
}

struct PinInner {
    is_high: Option<bool>,
    writes: usize,
}

struct PinShared {
    n: u8,
    observer: Mutex<Option<Rc<dyn Observer>>>,
    inner: Mutex<PinInner>,
}
impl PinShared {
    fn get_state(&self) -> Option<bool> {
        self.lock().is_high
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PinInner> {
        self.inner.lock().unwrap()
    }
}

impl Error for TestError {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

impl ErrorType for Pin {
    type Error = TestError;
}

impl InputPin for Pin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(matches!(self.0.get_state(), Some(true)))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(matches!(self.0.get_state(), Some(false)))
    }
}

impl OutputPin for Pin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set_state(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set_state(true);
        Ok(())
    }
}

/// Settle delay that only counts how often it was asked to wait.
#[derive(Clone, Default)]
pub struct CountingDelay(Rc<Cell<u32>>);
impl CountingDelay {
    pub fn count(&self) -> u32 {
        self.0.get()
    }
}

impl DelayNs for CountingDelay {
    async fn delay_ns(&mut self, _ns: u32) {
        self.0.set(self.0.get() + 1);
    }
}
