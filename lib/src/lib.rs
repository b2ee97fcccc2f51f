// SPDX-FileCopyrightText: 2025 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A library for blinking an LED on a Linux GPIO line, under the control
//! of clients connected to a command socket.
//!
//! The LED is toggled by the [`ToggleEngine`], which rearms a [`Timer`]
//! with the current [`Period`] each time it toggles the line.
//!
//! Clients send commands to the socket registered by the [`Device`],
//! which decodes them with the [`CommandProcessor`] and applies them to
//! the engine.
//!
//! To register a device and serve clients until shutdown:
//! ```no_run
//! # fn example() -> gpioblink::Result<()> {
//! use gpioblink::{Config, Device};
//!
//! let config = Config {
//!     line: "LED0".into(),
//!     ..Default::default()
//! };
//! let mut dev = Device::open(&config)?;
//! dev.serve()?;
//! dev.close()
//! # }
//! ```

use std::io;
use std::path::PathBuf;

/// Decoding and dispatch of client commands.
pub mod command;
pub use command::CommandProcessor;

/// Device registration, lifecycle and configuration.
pub mod device;
pub use device::{Config, Device};

/// The engine toggling the LED.
pub mod engine;
pub use engine::ToggleEngine;

/// The toggle period shared by command handling and the toggle callback.
pub mod period;
pub use period::Period;

/// The GPIO line driving the LED.
pub mod pin;
pub use pin::LedPin;

/// The socket clients use to locate the device.
pub mod registration;
pub use registration::Registration;

/// Serving client requests.
pub mod server;
pub use server::{Server, ShutdownHandle};

/// A one-shot timer running a callback on its own thread.
pub mod timer;
pub use timer::Timer;

pub use gpioblink_uapi as uapi;

/// Errors returned by [`gpioblink`] functions.
///
/// [`gpioblink`]: crate
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No line with the configured name could be found.
    #[error("cannot find a line named '{0}'")]
    UnfoundLine(String),

    /// An error returned from an underlying gpiocdev call.
    #[error("gpiocdev returned: {0}")]
    Cdev(#[source] gpiocdev::Error),

    /// The pin could not be driven to the requested level.
    #[error("unable to set pin: {0}")]
    Pin(String),

    /// Another device is already registered at the path.
    #[error("\"{0}\" is already registered")]
    Busy(PathBuf),

    /// The path is occupied by something other than a socket.
    #[error("\"{0}\" exists and is not a socket")]
    NotSocket(PathBuf),

    /// The device socket could not be created.
    #[error("unable to register \"{0}\": {1}")]
    Registration(PathBuf, #[source] io::Error),

    /// The timer thread could not be created.
    #[error("unable to spawn timer thread: {0}")]
    TimerSpawn(#[source] io::Error),

    /// The timer thread has exited.
    #[error("timer is unavailable")]
    TimerUnavailable,

    /// A period was negative.
    #[error("invalid period: {0}ms")]
    InvalidPeriod(i32),

    /// A request could not be decoded.
    #[error("malformed request: {0}")]
    Malformed(#[source] uapi::Error),

    /// An error returned from an underlying system call.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// The errno reported to clients for the error.
    pub fn errno(&self) -> i32 {
        match self {
            Error::UnfoundLine(_) => libc::ENOENT,
            Error::Busy(_) => libc::EBUSY,
            Error::NotSocket(_) => libc::EEXIST,
            Error::TimerUnavailable => libc::ENODEV,
            Error::InvalidPeriod(_) => libc::EINVAL,
            Error::Registration(_, e) | Error::TimerSpawn(e) | Error::Io(e) => {
                e.raw_os_error().unwrap_or(libc::EIO)
            }
            Error::Cdev(_) | Error::Pin(_) | Error::Malformed(_) => libc::EIO,
        }
    }
}

impl From<gpiocdev::Error> for Error {
    fn from(err: gpiocdev::Error) -> Self {
        Self::Cdev(err)
    }
}

impl embedded_hal::digital::Error for Error {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

/// The result for [`gpioblink`] functions.
///
/// [`gpioblink`]: crate
pub type Result<T> = std::result::Result<T, Error>;
