// SPDX-FileCopyrightText: 2025 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![allow(dead_code)]

use embedded_hal::digital::{ErrorType, OutputPin, PinState};
use gpioblink::{Config, Device};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// An OutputPin that records the levels written to it.
#[derive(Debug)]
pub struct MockPin {
    rec: Arc<Mutex<Record>>,
}

/// Inspects the levels written to a [`MockPin`].
#[derive(Clone, Debug)]
pub struct Probe {
    rec: Arc<Mutex<Record>>,
}

#[derive(Debug)]
struct Record {
    start: Instant,
    writes: Vec<(Duration, bool)>,
    failures: usize,
    fail: bool,
    released: bool,
}

#[derive(Debug)]
pub struct MockError;

impl embedded_hal::digital::Error for MockError {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

impl MockPin {
    pub fn new() -> (MockPin, Probe) {
        let rec = Arc::new(Mutex::new(Record {
            start: Instant::now(),
            writes: Vec::new(),
            failures: 0,
            fail: false,
            released: false,
        }));
        (MockPin { rec: rec.clone() }, Probe { rec })
    }
}

impl ErrorType for MockPin {
    type Error = MockError;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), MockError> {
        self.set_state(PinState::Low)
    }

    fn set_high(&mut self) -> Result<(), MockError> {
        self.set_state(PinState::High)
    }

    fn set_state(&mut self, state: PinState) -> Result<(), MockError> {
        let mut rec = self.rec.lock().unwrap();
        if rec.fail {
            rec.failures += 1;
            return Err(MockError);
        }
        let at = rec.start.elapsed();
        rec.writes.push((at, state == PinState::High));
        Ok(())
    }
}

impl Drop for MockPin {
    fn drop(&mut self) {
        self.rec.lock().unwrap().released = true;
    }
}

impl Probe {
    /// Restart the clock the write times are measured from.
    pub fn reset_clock(&self) {
        self.rec.lock().unwrap().start = Instant::now();
    }

    /// The levels written, oldest first.
    pub fn levels(&self) -> Vec<bool> {
        self.rec.lock().unwrap().writes.iter().map(|w| w.1).collect()
    }

    /// The times of the writes, relative to the clock start.
    pub fn times(&self) -> Vec<Duration> {
        self.rec.lock().unwrap().writes.iter().map(|w| w.0).collect()
    }

    pub fn count(&self) -> usize {
        self.rec.lock().unwrap().writes.len()
    }

    pub fn last(&self) -> Option<bool> {
        self.rec.lock().unwrap().writes.last().map(|w| w.1)
    }

    pub fn set_fail(&self, fail: bool) {
        self.rec.lock().unwrap().fail = fail;
    }

    pub fn failures(&self) -> usize {
        self.rec.lock().unwrap().failures
    }

    pub fn is_released(&self) -> bool {
        self.rec.lock().unwrap().released
    }
}

/// Assert a duration lies within `slop` after the expected time.
pub fn assert_near(actual: Duration, expected_ms: u64, slop_ms: u64) {
    let expected = Duration::from_millis(expected_ms);
    assert!(
        actual >= expected && actual <= expected + Duration::from_millis(slop_ms),
        "expected {:?} to be within {}ms after {:?}",
        actual,
        slop_ms,
        expected
    );
}

/// A config for a device with its socket in `dir`.
pub fn config(dir: &Path, period_ms: u32) -> Config {
    Config {
        path: dir.join("led.sock"),
        period_ms,
        ..Default::default()
    }
}

/// Open a device driving a MockPin.
pub fn mock_device(config: &Config) -> (Device<MockPin>, Probe) {
    let (pin, probe) = MockPin::new();
    let dev = Device::with_pin(config, |_| Ok(pin)).unwrap();
    (dev, probe)
}
