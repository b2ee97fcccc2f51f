// SPDX-FileCopyrightText: 2025 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// The toggle period, in milliseconds, shared by command handling and the
/// timer callback.
///
/// Reads and writes are single atomic operations, so neither side ever
/// waits on the other.  Only atomicity is required; the callback may
/// see either value for a write racing with its read, but will see the
/// write by its next read.
#[derive(Debug)]
pub struct Period(AtomicU32);

impl Period {
    /// The period used if none is configured.
    pub const DEFAULT_MS: u32 = 500;

    /// The shortest delay the timer is armed with.
    ///
    /// A zero period is stored as is, but is timed as one tick.
    pub const MIN_DELAY: Duration = Duration::from_millis(1);

    /// Create a period of the given number of milliseconds.
    pub const fn new(ms: u32) -> Period {
        Period(AtomicU32::new(ms))
    }

    /// The most recently stored period.
    #[inline]
    pub fn get(&self) -> u32 {
        self.0.load(Ordering::Relaxed)
    }

    /// Store a new period.
    #[inline]
    pub fn set(&self, ms: u32) {
        self.0.store(ms, Ordering::Relaxed)
    }

    /// The delay to arm the timer with for the current period.
    pub fn delay(&self) -> Duration {
        delay_from_ms(self.get())
    }
}

impl Default for Period {
    fn default() -> Self {
        Period::new(Period::DEFAULT_MS)
    }
}

/// The timer delay for a period of `ms` milliseconds.
pub(crate) fn delay_from_ms(ms: u32) -> Duration {
    Duration::from_millis(ms.into()).max(Period::MIN_DELAY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn default() {
        assert_eq!(Period::default().get(), 500);
    }

    #[test]
    fn set_get() {
        let p = Period::new(20);
        assert_eq!(p.get(), 20);
        p.set(1000);
        assert_eq!(p.get(), 1000);
        assert_eq!(p.delay(), Duration::from_millis(1000));
    }

    #[test]
    fn zero_is_one_tick() {
        let p = Period::new(0);
        assert_eq!(p.get(), 0);
        assert_eq!(p.delay(), Period::MIN_DELAY);
    }

    #[test]
    fn shared_writes() {
        let p = Arc::new(Period::default());
        let writers: Vec<_> = [100, 200, 300]
            .into_iter()
            .map(|ms| {
                let p = p.clone();
                thread::spawn(move || {
                    for _ in 0..1000 {
                        p.set(ms);
                    }
                })
            })
            .collect();
        for _ in 0..1000 {
            // only ever whole values written by someone
            assert!([500, 100, 200, 300].contains(&p.get()));
        }
        for w in writers {
            w.join().unwrap();
        }
        assert!([100, 200, 300].contains(&p.get()));
    }
}
