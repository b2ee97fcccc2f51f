// SPDX-FileCopyrightText: 2025 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::period::{delay_from_ms, Period};
use crate::timer::Timer;
use crate::{Error, Result};
use embedded_hal::digital::{OutputPin, PinState};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Toggles an output pin each time the period elapses.
///
/// The engine is either running, with a toggle pending, or stopped.
/// The output level is owned by the timer callback, which flips it, writes
/// it to the pin, and rearms the timer with the current period.
///
/// The period is shared with the callback via an atomic, so commands never
/// wait on the callback to change it.
///
/// Dropping the engine stops it and drives the pin low before releasing it,
/// unless it has already been shut down and not restarted since.
#[derive(Debug)]
pub struct ToggleEngine<P: OutputPin> {
    // dropped first so the callback is gone before the pin
    timer: Timer,
    pin: Arc<Mutex<P>>,
    period: Arc<Period>,
    // shutdown has run since the last start
    shut_down: AtomicBool,
}

impl<P> ToggleEngine<P>
where
    P: OutputPin + Send + 'static,
{
    /// Create a stopped engine that will toggle the `pin` every `period_ms`.
    ///
    /// The pin is assumed to be low, so the first toggle drives it high.
    pub fn new(pin: P, period_ms: u32) -> Result<ToggleEngine<P>> {
        let pin = Arc::new(Mutex::new(pin));
        let period = Arc::new(Period::new(period_ms));
        let timer = Timer::new("gpioblink-toggle", toggler(pin.clone(), period.clone()))?;
        Ok(ToggleEngine {
            timer,
            pin,
            period,
            shut_down: AtomicBool::new(false),
        })
    }
}

impl<P: OutputPin> ToggleEngine<P> {
    /// Start toggling at the current period.
    ///
    /// Starting a running engine restarts the period rather than adding
    /// a second toggle.
    pub fn start(&self) -> Result<()> {
        log::debug!("start with period {}ms", self.period.get());
        self.shut_down.store(false, Ordering::Release);
        self.timer.arm(self.period.delay())
    }

    /// Stop toggling.
    ///
    /// Waits for an in-flight toggle to complete, so the pin does not change
    /// after this returns, until the engine is started again.
    pub fn stop(&self) {
        log::debug!("stop");
        self.timer.cancel_and_wait();
    }

    /// Set the period and restart toggling with it.
    ///
    /// The next toggle is `period_ms` from now.
    pub fn set_period(&self, period_ms: u32) -> Result<()> {
        log::debug!("set period to {}ms", period_ms);
        self.period.set(period_ms);
        self.shut_down.store(false, Ordering::Release);
        self.timer.arm(delay_from_ms(period_ms))
    }

    /// The current period in milliseconds.
    pub fn period(&self) -> u32 {
        self.period.get()
    }

    /// Returns true if the engine is running.
    ///
    /// A toggle in flight counts as running unless the engine is being
    /// stopped, as the toggle will schedule the next.
    pub fn is_running(&self) -> bool {
        self.timer.is_active()
    }

    /// Stop toggling and drive the pin low.
    ///
    /// The pin is not driven again when the engine is dropped, unless the
    /// engine is restarted in the meantime.
    pub fn shutdown(&self) -> Result<()> {
        self.shut_down.store(true, Ordering::Release);
        self.stop();
        let mut pin = self.pin.lock().unwrap_or_else(PoisonError::into_inner);
        pin.set_low().map_err(|e| Error::Pin(format!("{:?}", e)))
    }
}

impl<P: OutputPin> Drop for ToggleEngine<P> {
    fn drop(&mut self) {
        if self.shut_down.load(Ordering::Acquire) {
            return;
        }
        if let Err(e) = self.shutdown() {
            log::error!("failed to turn off LED: {}", e);
        }
    }
}

fn toggler<P: OutputPin>(
    pin: Arc<Mutex<P>>,
    period: Arc<Period>,
) -> impl FnMut() -> Option<std::time::Duration> {
    let mut level = false;
    move || {
        level = !level;
        let res = pin
            .lock()
            .expect("failed to acquire lock on pin")
            .set_state(PinState::from(level));
        if let Err(e) = res {
            log::warn!("failed to set LED {}: {:?}", if level { "on" } else { "off" }, e);
        }
        Some(period.delay())
    }
}
