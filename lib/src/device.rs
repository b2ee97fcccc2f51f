// SPDX-FileCopyrightText: 2025 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::command::CommandProcessor;
use crate::engine::ToggleEngine;
use crate::period::Period;
use crate::pin::LedPin;
use crate::registration::Registration;
use crate::server::{Server, ShutdownHandle};
use crate::Result;
use embedded_hal::digital::OutputPin;
use std::path::{Path, PathBuf};

/// The configuration of a [`Device`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    /// The path of the socket clients connect to.
    pub path: PathBuf,

    /// The file mode of the socket.
    pub mode: u32,

    /// The chip containing the line.
    ///
    /// May be a path, a name, or a number.
    /// If not set then the line is found by name across all chips.
    pub chip: Option<String>,

    /// The line driving the LED.
    ///
    /// A name, or an offset if a chip is also set.
    pub line: String,

    /// The LED is lit when the line is low.
    pub active_low: bool,

    /// The consumer label applied to the requested line.
    pub consumer: String,

    /// The toggle period, in milliseconds, until a client sets another.
    pub period_ms: u32,
}

impl Config {
    pub const DEFAULT_PATH: &'static str = crate::uapi::DEFAULT_PATH;
    pub const DEFAULT_MODE: u32 = 0o660;
    pub const DEFAULT_LINE: &'static str = "LED0";
    pub const DEFAULT_CONSUMER: &'static str = "gpioblink";
}

impl Default for Config {
    fn default() -> Self {
        Config {
            path: Config::DEFAULT_PATH.into(),
            mode: Config::DEFAULT_MODE,
            chip: None,
            line: Config::DEFAULT_LINE.into(),
            active_low: false,
            consumer: Config::DEFAULT_CONSUMER.into(),
            period_ms: Period::DEFAULT_MS,
        }
    }
}

/// An LED blinking under the control of clients connected to its socket.
///
/// Opening the device registers the socket, requests the pin, and starts
/// toggling.  Closing or dropping the device stops toggling, turns off the
/// LED, releases the pin, and removes the socket, in that order.
#[derive(Debug)]
pub struct Device<P: OutputPin> {
    // field order is teardown order
    server: Server,
    engine: ToggleEngine<P>,
    registration: Registration,
}

impl Device<LedPin> {
    /// Open the device on the GPIO line identified by the config.
    pub fn open(config: &Config) -> Result<Device<LedPin>> {
        Device::with_pin(config, LedPin::from_config)
    }
}

impl<P> Device<P>
where
    P: OutputPin + Send + 'static,
{
    /// Open the device on the pin returned by `acquire`.
    ///
    /// The pin must be low when returned.
    /// Any steps completed before a failure are undone before returning the
    /// error.
    pub fn with_pin<F>(config: &Config, acquire: F) -> Result<Device<P>>
    where
        F: FnOnce(&Config) -> Result<P>,
    {
        let mut registration = Registration::new(&config.path, config.mode)?;
        let pin = acquire(config)?;
        let engine = ToggleEngine::new(pin, config.period_ms)?;
        let server = Server::new(registration.listener_mut())?;
        engine.start()?;
        log::info!(
            "toggling line {} every {}ms",
            config.line,
            config.period_ms
        );
        Ok(Device {
            server,
            engine,
            registration,
        })
    }
}

impl<P: OutputPin> Device<P> {
    pub fn engine(&self) -> &ToggleEngine<P> {
        &self.engine
    }

    /// The path of the socket clients connect to.
    pub fn path(&self) -> &Path {
        self.registration.path()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.server.shutdown_handle()
    }

    /// Serve client requests until shut down via a [`ShutdownHandle`].
    pub fn serve(&mut self) -> Result<()> {
        let processor = CommandProcessor::new(&self.engine);
        self.server.serve(self.registration.listener(), &processor)
    }

    /// Stop toggling, turn off the LED, and unregister the device.
    ///
    /// Teardown completes even if turning off the LED fails, which is
    /// then returned.
    pub fn close(self) -> Result<()> {
        let res = self.engine.shutdown();
        drop(self);
        log::info!("closed");
        res
    }
}
