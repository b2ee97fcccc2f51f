// SPDX-FileCopyrightText: 2025 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{Error, Result};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// A one-shot timer that runs a callback on its own thread.
///
/// The timer holds at most one pending invocation.
/// Arming an armed timer replaces the pending invocation rather than adding
/// another.
///
/// The callback rearms the timer by returning the delay until its next
/// invocation, or leaves it disarmed by returning `None`.
/// The callback is run without any timer lock held, so [`arm`] and
/// [`cancel`] never wait on it.
///
/// Dropping the timer cancels any pending invocation and waits for an
/// in-flight callback to complete.
///
/// [`arm`]: #method.arm
/// [`cancel`]: #method.cancel
#[derive(Debug)]
pub struct Timer {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<State>,
    cond: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .expect("failed to acquire lock on timer state")
    }

    fn wait<'a>(&self, state: MutexGuard<'a, State>) -> MutexGuard<'a, State> {
        self.cond
            .wait(state)
            .expect("failed to acquire lock on timer state")
    }
}

#[derive(Debug, Default)]
struct State {
    // when the callback is next due, if armed
    deadline: Option<Instant>,

    // the callback is executing
    running: bool,

    // the number of cancel_and_wait calls waiting on the callback
    cancelling: usize,

    // the worker has been asked to exit
    shutdown: bool,

    // the worker has exited
    dead: bool,
}

impl Timer {
    /// Create a disarmed timer.
    ///
    /// The `name` is applied to the worker thread.
    pub fn new<F>(name: &str, callback: F) -> Result<Timer>
    where
        F: FnMut() -> Option<Duration> + Send + 'static,
    {
        let shared = Arc::new(Shared {
            state: Mutex::new(State::default()),
            cond: Condvar::new(),
        });
        let worker = {
            let shared = shared.clone();
            thread::Builder::new()
                .name(name.into())
                .spawn(move || run(&shared, callback))
                .map_err(Error::TimerSpawn)?
        };
        Ok(Timer {
            shared,
            worker: Some(worker),
        })
    }

    /// Arm the timer to invoke the callback after `delay`.
    ///
    /// Replaces any pending invocation.
    ///
    /// Fails only if the worker thread has exited, such as after the
    /// callback panicked.
    pub fn arm(&self, delay: Duration) -> Result<()> {
        let mut state = self.shared.lock();
        if state.dead || state.shutdown {
            return Err(Error::TimerUnavailable);
        }
        state.deadline = Some(Instant::now() + delay);
        self.shared.cond.notify_all();
        Ok(())
    }

    /// Cancel any pending invocation.
    ///
    /// Does not wait for an in-flight callback, which may rearm the timer.
    ///
    /// Returns true if an invocation was pending.
    pub fn cancel(&self) -> bool {
        let mut state = self.shared.lock();
        let pending = state.deadline.take().is_some();
        self.shared.cond.notify_all();
        pending
    }

    /// Cancel any pending invocation and wait for an in-flight callback to
    /// complete.
    ///
    /// Any rearm requested by the in-flight callback is discarded, so the
    /// timer is disarmed on return unless armed again by another thread in
    /// the meantime.
    ///
    /// Returns true if an invocation was pending.
    pub fn cancel_and_wait(&self) -> bool {
        let mut state = self.shared.lock();
        let pending = state.deadline.take().is_some();
        if self.is_worker() {
            // called from the callback, which cannot wait on itself
            return pending;
        }
        state.cancelling += 1;
        while state.running {
            state = self.shared.wait(state);
        }
        state.cancelling -= 1;
        pending
    }

    /// Returns true if an invocation is pending.
    ///
    /// An in-flight callback is not pending, so this is false while the
    /// callback runs, until it returns a rearm.
    pub fn is_armed(&self) -> bool {
        self.shared.lock().deadline.is_some()
    }

    /// Returns true if an invocation is pending, or the callback is in
    /// flight and a rearm it requests would be kept.
    pub fn is_active(&self) -> bool {
        let state = self.shared.lock();
        state.deadline.is_some() || (state.running && state.cancelling == 0 && !state.shutdown)
    }

    fn is_worker(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|w| w.thread().id() == thread::current().id())
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        {
            let mut state = self
                .shared
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            state.shutdown = true;
            state.deadline = None;
            self.shared.cond.notify_all();
        }
        if let Some(worker) = self.worker.take() {
            if worker.thread().id() != thread::current().id() {
                _ = worker.join();
            }
        }
    }
}

// marks the timer dead however the worker exits
struct Exit<'a>(&'a Shared);

impl Drop for Exit<'_> {
    fn drop(&mut self) {
        let mut state = self.0.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.dead = true;
        state.running = false;
        state.deadline = None;
        self.0.cond.notify_all();
    }
}

fn run<F>(shared: &Shared, mut callback: F)
where
    F: FnMut() -> Option<Duration>,
{
    let _exit = Exit(shared);
    let mut state = shared.lock();
    loop {
        if state.shutdown {
            return;
        }
        let Some(deadline) = state.deadline else {
            state = shared.wait(state);
            continue;
        };
        let now = Instant::now();
        if now < deadline {
            state = shared
                .cond
                .wait_timeout(state, deadline - now)
                .expect("failed to acquire lock on timer state")
                .0;
            continue;
        }
        state.deadline = None;
        state.running = true;
        drop(state);

        let rearm = callback();

        state = shared.lock();
        state.running = false;
        if let Some(delay) = rearm {
            if state.cancelling == 0 && !state.shutdown {
                state.deadline = Some(Instant::now() + delay);
            }
        }
        shared.cond.notify_all();
    }
}
