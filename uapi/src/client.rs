// SPDX-FileCopyrightText: 2025 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::common::{read_status, write_request, Command, Result};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::time::Duration;

/// A connection to a gpioblink device.
///
/// Requests are sent one at a time, and each waits for the device to reply.
///
/// # Examples
///
/// ```no_run
/// # fn example() -> Result<(), gpioblink_uapi::Error> {
/// let client = gpioblink_uapi::Client::connect("/run/gpioblink/led.sock")?;
/// client.set_period(250)?;
/// client.stop()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Client {
    s: UnixStream,
}

impl Client {
    /// Connect to the device socket at the given path.
    pub fn connect<P: AsRef<Path>>(path: P) -> Result<Client> {
        Ok(Client {
            s: UnixStream::connect(path)?,
        })
    }

    /// Limit the time to wait for the device to reply.
    ///
    /// By default the client waits indefinitely.
    pub fn with_timeout(self, timeout: Duration) -> Result<Client> {
        self.s.set_read_timeout(Some(timeout))?;
        self.s.set_write_timeout(Some(timeout))?;
        Ok(self)
    }

    /// Stop toggling.
    pub fn stop(&self) -> Result<()> {
        self.request(Command::Stop.code(), None)
    }

    /// Resume toggling at the current period.
    pub fn start(&self) -> Result<()> {
        self.request(Command::Start.code(), None)
    }

    /// Set the toggle period in milliseconds, and resume toggling.
    ///
    /// The period is passed to the device unchecked, so negative periods
    /// are rejected by the device rather than the client.
    pub fn set_period(&self, period_ms: i32) -> Result<()> {
        self.request(Command::SetPeriod.code(), Some(period_ms))
    }

    /// Send a raw request and wait for the reply.
    ///
    /// The `code` need not be a known command.
    pub fn request(&self, code: u32, arg: Option<i32>) -> Result<()> {
        let mut s = &self.s;
        write_request(&mut s, code, arg)?;
        read_status(&mut s)?.into_result()
    }
}

impl From<UnixStream> for Client {
    fn from(s: UnixStream) -> Self {
        Client { s }
    }
}
