// SPDX-FileCopyrightText: 2025 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::engine::ToggleEngine;
use crate::uapi::{self, Command, Status};
use crate::{Error, Result};
use embedded_hal::digital::OutputPin;
use std::io::Read;

/// Applies client commands to a [`ToggleEngine`].
///
/// The processor borrows the engine, so it cannot outlive the device that
/// owns it.
#[derive(Debug)]
pub struct CommandProcessor<'a, P: OutputPin> {
    engine: &'a ToggleEngine<P>,
}

impl<'a, P: OutputPin> CommandProcessor<'a, P> {
    pub fn new(engine: &'a ToggleEngine<P>) -> CommandProcessor<'a, P> {
        CommandProcessor { engine }
    }

    /// Decode and apply the command identified by `code`.
    ///
    /// Any argument is read from the `payload`.
    /// Unknown codes are ignored.
    pub fn process<R: Read>(&self, code: u32, payload: &mut R) -> Result<()> {
        let Some(cmd) = Command::from_code(code) else {
            log::debug!("ignoring unknown command {:#x}", code);
            return Ok(());
        };
        match cmd {
            Command::Stop => {
                self.engine.stop();
                Ok(())
            }
            Command::Start => self.engine.start(),
            Command::SetPeriod => {
                let arg = uapi::read_arg(payload).map_err(Error::Malformed)?;
                let period = u32::try_from(arg).map_err(|_| Error::InvalidPeriod(arg))?;
                self.engine.set_period(period)
            }
        }
    }

    /// Process the command and return the reply for the client.
    pub fn reply<R: Read>(&self, code: u32, payload: &mut R) -> Status {
        match self.process(code, payload) {
            Ok(()) => Status::OK,
            Err(e) => {
                log::info!("request {:#x} failed: {}", code, e);
                Status::from_errno(e.errno())
            }
        }
    }
}
